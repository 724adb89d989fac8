//! Integration tests for SQL AST rendering.
//!
//! These tests exercise the SqlRenderer with hand-built query structures.

use olap::dialect::{Dialect, PostgresDialect};
use olap::sql_ast::{Join, SelectItem, SelectQuery, SqlBinaryOperator, SqlExpr, SqlRenderer};
use olap::{Calculation, FilterOp};

fn col(table: &str, name: &str) -> SqlExpr {
    SqlExpr::column(table, name)
}

fn eq(left: SqlExpr, right: SqlExpr) -> SqlExpr {
    SqlExpr::BinaryOp {
        op: SqlBinaryOperator::Eq,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[test]
fn renders_join_where_and_group_by() {
    let dialect = PostgresDialect;
    let query = SelectQuery {
        select: vec![
            SelectItem {
                expr: col("base_sales", "year"),
                alias: Some("year".to_string()),
            },
            SelectItem {
                expr: SqlExpr::Aggregate {
                    calculation: Calculation::Sum,
                    expr: Box::new(col("base_sales", "pcs")),
                },
                alias: Some("pcs__sum".to_string()),
            },
        ],
        from: "olap_test.games_olap.base_sales".to_string(),
        joins: vec![Join {
            table: "olap_test.games_olap.dim_game".to_string(),
            on: vec![eq(col("base_sales", "sk_id_game"), col("dim_game", "sk_id_game"))],
        }],
        filters: vec![
            eq(col("base_sales", "year"), SqlExpr::Raw("2020".to_string())),
            SqlExpr::BinaryOp {
                op: FilterOp::ILike.into(),
                left: Box::new(col("dim_game", "game_name")),
                right: Box::new(SqlExpr::Raw("'%zelda%'".to_string())),
            },
        ],
        group_by: vec![col("base_sales", "year")],
    };

    let sql = SqlRenderer::new(&dialect).render_select(&query);
    assert_eq!(
        sql,
        "SELECT\n\t base_sales.year AS \"year\"\n\t,SUM(base_sales.pcs) AS \"pcs__sum\"\n\
         FROM olap_test.games_olap.base_sales\n\
         INNER JOIN olap_test.games_olap.dim_game\n\tON base_sales.sk_id_game = dim_game.sk_id_game\n\
         WHERE base_sales.year = 2020 AND dim_game.game_name ILIKE '%zelda%'\n\
         GROUP BY\n\t base_sales.year"
    );
}

#[test]
fn omits_empty_clauses() {
    let dialect = PostgresDialect;
    let query = SelectQuery {
        select: vec![SelectItem {
            expr: col("g_by_y", "year"),
            alias: None,
        }],
        from: "olap_test.games_olap.g_by_y".to_string(),
        ..SelectQuery::default()
    };

    let sql = SqlRenderer::new(&dialect).render_select(&query);
    assert_eq!(sql, "SELECT\n\t g_by_y.year\nFROM olap_test.games_olap.g_by_y");
}

#[test]
fn renders_every_filter_operator() {
    let dialect = PostgresDialect;
    let cases = [
        (FilterOp::Eq, "="),
        (FilterOp::Neq, "!="),
        (FilterOp::Gt, ">"),
        (FilterOp::Gte, ">="),
        (FilterOp::Lt, "<"),
        (FilterOp::Lte, "<="),
        (FilterOp::Like, "LIKE"),
        (FilterOp::ILike, "ILIKE"),
        (FilterOp::In, "IN"),
        (FilterOp::NotIn, "NOT IN"),
    ];

    for (op, expected) in cases {
        let query = SelectQuery {
            select: vec![SelectItem {
                expr: col("t", "a"),
                alias: None,
            }],
            from: "db.s.t".to_string(),
            filters: vec![SqlExpr::BinaryOp {
                op: op.into(),
                left: Box::new(col("t", "a")),
                right: Box::new(SqlExpr::Raw("x".to_string())),
            }],
            ..SelectQuery::default()
        };
        let sql = SqlRenderer::new(&dialect).render_select(&query);
        assert!(sql.ends_with(&format!("WHERE t.a {expected} x")), "{sql}");
    }
}

#[test]
fn aliases_are_quoted_by_the_dialect() {
    let dialect = PostgresDialect;
    let query = SelectQuery {
        select: vec![SelectItem {
            expr: SqlExpr::Aggregate {
                calculation: Calculation::CountDistinct,
                expr: Box::new(col("dim_game", "bk_game_id")),
            },
            alias: Some("odd\"alias".to_string()),
        }],
        from: "db.s.t".to_string(),
        ..SelectQuery::default()
    };
    let sql = SqlRenderer::new(&dialect).render_select(&query);
    assert!(sql.contains("COUNT(DISTINCT dim_game.bk_game_id) AS \"odd\"\"alias\""));
    assert_eq!(dialect.quote_ident("year"), "\"year\"");
}

#[test]
fn request_operator_text_matches_rendered_operator() {
    let ops = [
        FilterOp::Eq,
        FilterOp::Neq,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::Like,
        FilterOp::ILike,
        FilterOp::In,
        FilterOp::NotIn,
    ];

    for op in ops {
        let rendered = SqlBinaryOperator::from(op).as_sql();
        assert_eq!(op.as_sql(), rendered);
        assert_eq!(op.to_string(), rendered);
        assert_eq!(rendered.parse::<FilterOp>().unwrap(), op);
    }
}
