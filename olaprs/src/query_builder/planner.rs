//! Planner orchestration and the select / filter passes.
//!
//! A request is applied to every fact table in three passes: select fields,
//! then filter fields, then aggregate fields. Each pass tries one request
//! field against every surviving table before moving to the next field, and
//! evicts the tables that cannot satisfy it.

use crate::request::{FilterField, QueryRequest};
use crate::schema::{DataField, DataTable, DimensionLookup, SchemaCollection};
use crate::types::FieldAlias;

use super::aggregates::apply_aggregate;
use super::plan::{
    CandidatePlan, JoinKeys, JoinedCondition, JoinedField, PlainSelect, WhereCondition,
};
use super::PlannerOptions;

/// Run the select, filter and aggregate passes and return the surviving plan.
///
/// An empty plan is a valid outcome: no fact table can answer the request.
pub fn build_plan(
    schema: &SchemaCollection,
    request: &QueryRequest,
    options: &PlannerOptions,
) -> CandidatePlan {
    let mut plan = CandidatePlan::initialize(schema);
    tracing::debug!(
        tables = plan.len(),
        select = request.select.len(),
        filter = request.filter.len(),
        aggregate = request.aggregate.len(),
        "planning request"
    );

    for field in &request.select {
        apply_select(schema, &mut plan, &field.field_name);
    }
    tracing::debug!(surviving = plan.len(), "select pass done");

    for filter in &request.filter {
        apply_filter(schema, &mut plan, filter);
    }
    tracing::debug!(surviving = plan.len(), "filter pass done");

    for field in &request.aggregate {
        apply_aggregate(schema, &mut plan, field, options);
    }
    tracing::debug!(
        surviving = plan.len(),
        evicted = plan.evicted().len(),
        "aggregate pass done"
    );

    plan
}

/// How a fact table can provide a plain (non-aggregated) field.
pub(crate) enum FieldSource<'a> {
    Native(&'a DataField),
    Joined {
        dimension: DimensionLookup<'a>,
        keys: JoinKeys,
    },
    Unavailable,
}

/// Native columns win over joins; a join needs the dimension's service key
/// mirrored in the fact table.
pub(crate) fn resolve_plain_field<'a>(
    table: &'a DataTable,
    alias: &FieldAlias,
    dimension: Option<DimensionLookup<'a>>,
) -> FieldSource<'a> {
    if let Some(field) = table.field(alias.as_str()).filter(|f| f.is_plain()) {
        return FieldSource::Native(field);
    }
    match dimension.and_then(|d| join_keys(table, &d).map(|keys| (d, keys))) {
        Some((dimension, keys)) => FieldSource::Joined { dimension, keys },
        None => FieldSource::Unavailable,
    }
}

pub(crate) fn join_keys(table: &DataTable, dimension: &DimensionLookup<'_>) -> Option<JoinKeys> {
    table
        .field(dimension.service_key.alias.as_str())
        .filter(|f| f.is_plain())
        .map(|fact_key| JoinKeys::new(&fact_key.source_name, &dimension.service_key.source_name))
}

fn apply_select(schema: &SchemaCollection, plan: &mut CandidatePlan, alias: &FieldAlias) {
    let dimension = schema.lookup_dimension(alias.as_str());

    for table_name in plan.live_tables() {
        let Some(table) = schema.data_table(table_name.as_str()) else {
            continue;
        };
        let source = resolve_plain_field(table, alias, dimension);
        let Some(entry) = plan.entry_mut(&table_name) else {
            continue;
        };

        match source {
            FieldSource::Native(field) => {
                entry.add_select(PlainSelect {
                    backend_field: field.source_name.clone(),
                    frontend_field: alias.clone(),
                    frontend_calculation: None,
                });
                entry.consume(alias);
            }
            FieldSource::Joined { dimension, keys } => {
                entry.add_join_select(
                    dimension.table.name(),
                    keys,
                    JoinedField {
                        backend_field: dimension.field.source_name.clone(),
                        frontend_field: alias.clone(),
                    },
                );
                entry.consume(&dimension.service_key.alias);
            }
            FieldSource::Unavailable => {
                plan.evict(&table_name, alias, "select field is neither native nor joinable");
            }
        }
    }
}

fn apply_filter(schema: &SchemaCollection, plan: &mut CandidatePlan, filter: &FilterField) {
    let alias = &filter.field_name;
    let dimension = schema.lookup_dimension(alias.as_str());

    for table_name in plan.live_tables() {
        let Some(table) = schema.data_table(table_name.as_str()) else {
            continue;
        };
        let source = resolve_plain_field(table, alias, dimension);
        let Some(entry) = plan.entry_mut(&table_name) else {
            continue;
        };

        match source {
            FieldSource::Native(field) => entry.add_self_where(
                &field.source_name,
                WhereCondition {
                    op: filter.op,
                    condition: filter.condition.clone(),
                },
            ),
            FieldSource::Joined { dimension, keys } => entry.add_join_where(
                dimension.table.name(),
                keys,
                JoinedCondition {
                    backend_field: dimension.field.source_name.clone(),
                    op: filter.op,
                    condition: filter.condition.clone(),
                },
            ),
            FieldSource::Unavailable => {
                plan.evict(&table_name, alias, "filter field is neither native nor joinable");
            }
        }
    }
}
