use serde::Serialize;

use crate::dialect::Dialect;
use crate::sql_ast::{Join, SelectItem, SelectQuery, SqlBinaryOperator, SqlExpr, SqlRenderer};
use crate::types::TableName;

use super::plan::CandidatePlanEntry;

/// SQL for one candidate fact table plus how many of its plain columns the
/// request left unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedQuery {
    pub sql: String,
    pub unresolved_field_count: usize,
}

/// Lower a resolved plan entry into a [`SelectQuery`].
///
/// Select order is fixed: plain selects, in-place aggregations, joined
/// selects, joined aggregations. GROUP BY is only emitted when the entry
/// aggregates something.
pub fn build_select_query(entry: &CandidatePlanEntry, table_name: &TableName) -> SelectQuery {
    let fact = table_name.short_name();
    let has_aggregation = entry.has_aggregation();
    let mut query = SelectQuery {
        from: table_name.to_string(),
        ..SelectQuery::default()
    };

    for select in entry.selects() {
        let column = SqlExpr::column(fact, &select.backend_field);
        if has_aggregation {
            query.group_by.push(column.clone());
        }
        query.select.push(SelectItem {
            expr: column,
            alias: Some(select.output_alias()),
        });
    }

    for aggregation in entry.aggregations() {
        query.select.push(SelectItem {
            expr: SqlExpr::Aggregate {
                calculation: aggregation.calculation,
                expr: Box::new(SqlExpr::column(fact, &aggregation.backend_field)),
            },
            alias: Some(aggregation.output_alias()),
        });
    }

    for (join_table, group) in entry.join_selects() {
        let dim = join_table.short_name();
        for field in &group.items {
            let column = SqlExpr::column(dim, &field.backend_field);
            if has_aggregation {
                query.group_by.push(column.clone());
            }
            query.select.push(SelectItem {
                expr: column,
                alias: Some(field.frontend_field.to_string()),
            });
        }
    }

    for (join_table, group) in entry.join_aggregations() {
        let dim = join_table.short_name();
        for aggregation in &group.items {
            query.select.push(SelectItem {
                expr: SqlExpr::Aggregate {
                    calculation: aggregation.calculation,
                    expr: Box::new(SqlExpr::column(dim, &aggregation.backend_field)),
                },
                alias: Some(aggregation.output_alias()),
            });
        }
    }

    for (join_table, keys) in entry.join_tables() {
        query.joins.push(Join {
            table: join_table.to_string(),
            on: vec![SqlExpr::BinaryOp {
                op: SqlBinaryOperator::Eq,
                left: Box::new(SqlExpr::column(fact, &keys.fact_service_key)),
                right: Box::new(SqlExpr::column(
                    join_table.short_name(),
                    &keys.dimension_service_key,
                )),
            }],
        });
    }

    for (backend_field, conditions) in entry.self_where() {
        for condition in conditions {
            query.filters.push(SqlExpr::BinaryOp {
                op: condition.op.into(),
                left: Box::new(SqlExpr::column(fact, backend_field)),
                right: Box::new(SqlExpr::Raw(condition.condition.clone())),
            });
        }
    }

    for (join_table, group) in entry.join_where() {
        let dim = join_table.short_name();
        for condition in &group.items {
            query.filters.push(SqlExpr::BinaryOp {
                op: condition.op.into(),
                left: Box::new(SqlExpr::column(dim, &condition.backend_field)),
                right: Box::new(SqlExpr::Raw(condition.condition.clone())),
            });
        }
    }

    query
}

pub fn render_entry(
    entry: &CandidatePlanEntry,
    table_name: &TableName,
    dialect: &dyn Dialect,
) -> RenderedQuery {
    let query = build_select_query(entry, table_name);
    let sql = SqlRenderer::new(dialect).render_select(&query);
    tracing::trace!(table = %table_name, sql = %sql, "rendered candidate query");
    RenderedQuery {
        sql,
        unresolved_field_count: entry.unresolved_field_count(),
    }
}
