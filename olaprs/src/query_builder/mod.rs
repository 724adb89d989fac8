use std::collections::BTreeMap;

use crate::config::OlapConfig;
use crate::dialect::{Dialect, PostgresDialect};
use crate::error::Result;
use crate::request::QueryRequest;
use crate::schema::SchemaCollection;
use crate::types::TableName;

mod aggregates;
mod plan;
mod planner;
mod render;

pub use aggregates::AggregateStrategy;
pub use plan::{
    CandidatePlan, CandidatePlanEntry, InPlaceAggregation, JoinGroup, JoinKeys, JoinedAggregation,
    JoinedCondition, JoinedField, PlainSelect, WhereCondition,
};
pub use planner::build_plan;
pub use render::{build_select_query, render_entry, RenderedQuery};

/// Env var that turns off service key substitution regardless of configuration.
pub const DISABLE_SK_SUBSTITUTION_ENV: &str = "OLAP_DISABLE_SK_SUBSTITUTION";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerOptions {
    /// Count a dimension's service key in the fact table instead of joining,
    /// for dimension fields that opt in with `use_sk_for_count`.
    pub service_key_substitution: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            service_key_substitution: true,
        }
    }
}

impl PlannerOptions {
    pub fn from_config(config: &OlapConfig) -> Self {
        Self {
            service_key_substitution: config.planner.service_key_substitution,
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if std::env::var(DISABLE_SK_SUBSTITUTION_ENV).ok().as_deref() == Some("1") {
            self.service_key_substitution = false;
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
    options: PlannerOptions,
}

impl SqlBuilder {
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> PlannerOptions {
        self.options
    }

    /// Validate the request and compute the candidate plan.
    pub fn plan(&self, schema: &SchemaCollection, request: &QueryRequest) -> Result<CandidatePlan> {
        request.validate()?;
        let options = self.options.with_env_overrides();
        Ok(planner::build_plan(schema, request, &options))
    }

    pub fn render(&self, entry: &CandidatePlanEntry, table_name: &TableName) -> RenderedQuery {
        self.render_with_dialect(entry, table_name, &PostgresDialect)
    }

    /// Render using a provided dialect (useful for tests).
    pub fn render_with_dialect(
        &self,
        entry: &CandidatePlanEntry,
        table_name: &TableName,
        dialect: &dyn Dialect,
    ) -> RenderedQuery {
        render::render_entry(entry, table_name, dialect)
    }

    /// Plan the request and render every surviving table.
    pub fn build_all(
        &self,
        schema: &SchemaCollection,
        request: &QueryRequest,
    ) -> Result<BTreeMap<TableName, RenderedQuery>> {
        let plan = self.plan(schema, request)?;
        let rendered: BTreeMap<_, _> = plan
            .iter()
            .map(|(name, entry)| (name.clone(), self.render(entry, name)))
            .collect();
        tracing::info!(candidates = rendered.len(), "rendered candidate queries");
        Ok(rendered)
    }
}
