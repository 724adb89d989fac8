use crate::dialect::Dialect;
use crate::types::{Calculation, FilterOp};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    Column {
        table: Option<String>,
        name: String,
    },
    /// Literal text from a request, emitted verbatim.
    Raw(String),
    Aggregate {
        calculation: Calculation,
        expr: Box<SqlExpr>,
    },
    BinaryOp {
        op: SqlBinaryOperator,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
}

impl SqlExpr {
    pub fn column(table: &str, name: &str) -> Self {
        SqlExpr::Column {
            table: Some(table.to_string()),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBinaryOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    In,
    NotIn,
}

impl SqlBinaryOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlBinaryOperator::Eq => "=",
            SqlBinaryOperator::Neq => "!=",
            SqlBinaryOperator::Gt => ">",
            SqlBinaryOperator::Gte => ">=",
            SqlBinaryOperator::Lt => "<",
            SqlBinaryOperator::Lte => "<=",
            SqlBinaryOperator::Like => "LIKE",
            SqlBinaryOperator::ILike => "ILIKE",
            SqlBinaryOperator::In => "IN",
            SqlBinaryOperator::NotIn => "NOT IN",
        }
    }
}

impl From<FilterOp> for SqlBinaryOperator {
    fn from(op: FilterOp) -> Self {
        match op {
            FilterOp::Eq => SqlBinaryOperator::Eq,
            FilterOp::Neq => SqlBinaryOperator::Neq,
            FilterOp::Gt => SqlBinaryOperator::Gt,
            FilterOp::Gte => SqlBinaryOperator::Gte,
            FilterOp::Lt => SqlBinaryOperator::Lt,
            FilterOp::Lte => SqlBinaryOperator::Lte,
            FilterOp::Like => SqlBinaryOperator::Like,
            FilterOp::ILike => SqlBinaryOperator::ILike,
            FilterOp::In => SqlBinaryOperator::In,
            FilterOp::NotIn => SqlBinaryOperator::NotIn,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SqlExpr,
    pub alias: Option<String>,
}

/// An INNER JOIN; outer joins are never planned.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub on: Vec<SqlExpr>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub select: Vec<SelectItem>,
    pub from: String,
    pub joins: Vec<Join>,
    pub filters: Vec<SqlExpr>,
    pub group_by: Vec<SqlExpr>,
}

/// Renders a [`SelectQuery`] with fixed keyword casing and layout:
///
/// ```text
/// SELECT
///     a.x AS "x"
///    ,SUM(a.y) AS "y__sum"
/// FROM db.schema.a
/// INNER JOIN db.schema.d
///     ON a.sk = d.sk
/// WHERE a.x = 1 AND d.z > 2
/// GROUP BY
///     a.x
/// ```
///
/// (indentation is a tab in the real output).
pub struct SqlRenderer<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> SqlRenderer<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn render_select(&self, query: &SelectQuery) -> String {
        let select_items: Vec<String> = query
            .select
            .iter()
            .map(|item| {
                let expr_sql = self.render_expr(&item.expr);
                match &item.alias {
                    Some(alias) => format!("{expr_sql} AS {}", self.dialect.quote_ident(alias)),
                    None => expr_sql,
                }
            })
            .collect();

        let mut sql = format!(
            "SELECT\n\t {}\nFROM {}",
            select_items.join("\n\t,"),
            self.dialect.qualify_table(&query.from)
        );

        for join in &query.joins {
            let on_clause: Vec<String> = join.on.iter().map(|e| self.render_expr(e)).collect();
            sql.push_str(&format!(
                "\nINNER JOIN {}\n\tON {}",
                self.dialect.qualify_table(&join.table),
                on_clause.join(" AND ")
            ));
        }

        if !query.filters.is_empty() {
            let filters: Vec<String> = query.filters.iter().map(|f| self.render_expr(f)).collect();
            sql.push_str(&format!("\nWHERE {}", filters.join(" AND ")));
        }

        if !query.group_by.is_empty() {
            let groups: Vec<String> = query.group_by.iter().map(|g| self.render_expr(g)).collect();
            sql.push_str(&format!("\nGROUP BY\n\t {}", groups.join("\n\t,")));
        }

        sql
    }

    fn render_expr(&self, expr: &SqlExpr) -> String {
        match expr {
            SqlExpr::Column { table, name } => match table {
                Some(t) => self.dialect.qualify_column(t, name),
                None => name.clone(),
            },
            SqlExpr::Raw(text) => text.clone(),
            SqlExpr::Aggregate { calculation, expr } => self
                .dialect
                .render_aggregation(*calculation, &self.render_expr(expr)),
            SqlExpr::BinaryOp { op, left, right } => {
                format!(
                    "{} {} {}",
                    self.render_expr(left),
                    op.as_sql(),
                    self.render_expr(right)
                )
            }
        }
    }
}
