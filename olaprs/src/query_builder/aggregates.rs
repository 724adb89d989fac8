//! Aggregate field resolution.
//!
//! Each requested `{field, calculation}` pair is tried against every surviving
//! fact table through an ordered list of strategies. The first strategy that
//! resolves wins; a table no strategy can serve is evicted.

use crate::request::AggregateField;
use crate::schema::{DataTable, DimensionLookup, SchemaCollection};
use crate::types::{Calculation, FieldAlias};

use super::plan::{
    CandidatePlan, CandidatePlanEntry, InPlaceAggregation, JoinedAggregation, PlainSelect,
};
use super::planner::join_keys;
use super::PlannerOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStrategy {
    /// Count the dimension's service key in the fact table instead of joining.
    ServiceKeySubstitution,
    /// Aggregate a fact column, or reuse / re-aggregate a precomputed one.
    DirectField,
    /// Join the owning dimension table and aggregate its column.
    JoinAggregation,
}

impl AggregateStrategy {
    pub const ORDER: [AggregateStrategy; 3] = [
        AggregateStrategy::ServiceKeySubstitution,
        AggregateStrategy::DirectField,
        AggregateStrategy::JoinAggregation,
    ];

    /// Mutates `entry` only when it returns [`Resolution::Resolved`].
    fn try_resolve(
        &self,
        ctx: &AggregateContext<'_>,
        table: &DataTable,
        entry: &mut CandidatePlanEntry,
    ) -> Resolution {
        match self {
            AggregateStrategy::ServiceKeySubstitution => match ctx.substitution {
                Some(dimension) => resolve_direct(
                    table,
                    entry,
                    &dimension.service_key.alias,
                    ctx.alias(),
                    ctx.calculation(),
                ),
                None => Resolution::NotApplicable,
            },
            AggregateStrategy::DirectField => {
                resolve_direct(table, entry, ctx.alias(), ctx.alias(), ctx.calculation())
            }
            AggregateStrategy::JoinAggregation => {
                let Some(dimension) = ctx.dimension else {
                    return Resolution::NotApplicable;
                };
                let Some(keys) = join_keys(table, &dimension) else {
                    return Resolution::NotApplicable;
                };
                entry.add_join_aggregation(
                    dimension.table.name(),
                    keys,
                    JoinedAggregation {
                        backend_field: dimension.field.source_name.clone(),
                        calculation: ctx.calculation(),
                        frontend_field: ctx.alias().clone(),
                    },
                );
                Resolution::Resolved
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Resolved,
    NotApplicable,
}

/// Table-independent facts about one aggregate field, computed once per field.
struct AggregateContext<'a> {
    field: &'a AggregateField,
    dimension: Option<DimensionLookup<'a>>,
    /// Set when the dimension allows counting its service key instead.
    substitution: Option<DimensionLookup<'a>>,
}

impl<'a> AggregateContext<'a> {
    fn new(
        schema: &'a SchemaCollection,
        field: &'a AggregateField,
        options: &PlannerOptions,
    ) -> Self {
        let dimension = schema.lookup_dimension(field.field_name.as_str());
        let substitution = dimension.filter(|d| {
            options.service_key_substitution
                && d.field.use_sk_for_count
                && field.calculation.is_count()
        });
        Self {
            field,
            dimension,
            substitution,
        }
    }

    fn alias(&self) -> &FieldAlias {
        &self.field.field_name
    }

    fn calculation(&self) -> Calculation {
        self.field.calculation
    }
}

/// Resolve `calculation` over the fact column `lookup_alias`, reported under `frontend`.
fn resolve_direct(
    table: &DataTable,
    entry: &mut CandidatePlanEntry,
    lookup_alias: &FieldAlias,
    frontend: &FieldAlias,
    calculation: Calculation,
) -> Resolution {
    let Some(field) = table.field(lookup_alias.as_str()) else {
        return Resolution::NotApplicable;
    };

    match field.calculation {
        None => {
            entry.add_aggregation(InPlaceAggregation {
                backend_field: field.source_name.clone(),
                calculation,
                frontend_field: frontend.clone(),
                frontend_calculation: calculation,
            });
            Resolution::Resolved
        }
        Some(baked) if baked == calculation && entry.is_at_requested_grain() => {
            entry.add_select(PlainSelect {
                backend_field: field.source_name.clone(),
                frontend_field: frontend.clone(),
                frontend_calculation: Some(calculation),
            });
            Resolution::Resolved
        }
        Some(_) if field.following_calculation == Some(calculation) => {
            entry.add_aggregation(InPlaceAggregation {
                backend_field: field.source_name.clone(),
                calculation,
                frontend_field: frontend.clone(),
                frontend_calculation: calculation,
            });
            Resolution::Resolved
        }
        Some(baked) => {
            tracing::trace!(
                table = %table.name(),
                field = %lookup_alias,
                baked = %baked,
                requested = %calculation,
                "precomputed field cannot be re-aggregated"
            );
            Resolution::NotApplicable
        }
    }
}

pub(crate) fn apply_aggregate(
    schema: &SchemaCollection,
    plan: &mut CandidatePlan,
    field: &AggregateField,
    options: &PlannerOptions,
) {
    let ctx = AggregateContext::new(schema, field, options);

    for table_name in plan.live_tables() {
        let Some(table) = schema.data_table(table_name.as_str()) else {
            continue;
        };
        let Some(entry) = plan.entry_mut(&table_name) else {
            continue;
        };

        let strategy = AggregateStrategy::ORDER
            .into_iter()
            .find(|s| s.try_resolve(&ctx, table, entry) == Resolution::Resolved);

        match strategy {
            Some(strategy) => tracing::trace!(
                table = %table_name,
                field = %field.field_name,
                ?strategy,
                "aggregate resolved"
            ),
            None => plan.evict(
                &table_name,
                &field.field_name,
                "no aggregation strategy applies",
            ),
        }
    }
}
