pub mod catalog;
pub mod config;
pub mod dialect;
pub mod error;
pub mod query_builder;
pub mod registry;
pub mod request;
pub mod schema;
pub mod sql_ast;
pub mod types;

use std::path::Path;

use crate::error::Result;
use crate::registry::SchemaRegistry;

/// Validate a request and plan it with default options.
pub fn plan(schema: &SchemaCollection, request: &QueryRequest) -> Result<CandidatePlan> {
    SqlBuilder::default().plan(schema, request)
}

/// Render one surviving plan entry as PostgreSQL, with its unresolved-field count.
pub fn render(entry: &CandidatePlanEntry, table_name: &TableName) -> RenderedQuery {
    SqlBuilder::default().render(entry, table_name)
}

/// Load table definitions from `<dir>/dimension` and `<dir>/data`.
pub fn load_schema<P: AsRef<Path>>(dir: P) -> Result<SchemaCollection> {
    Ok(SchemaRegistry::load_from_dir(dir)?.into_schema())
}

pub use catalog::FrontendField;
pub use config::OlapConfig;
pub use error::OlapError;
pub use query_builder::{
    AggregateStrategy, CandidatePlan, CandidatePlanEntry, PlannerOptions, RenderedQuery, SqlBuilder,
};
pub use request::{AggregateField, FilterField, QueryRequest, SelectField};
pub use schema::{DataField, DataTable, DimensionField, DimensionTable, SchemaCollection};
pub use types::{Calculation, FieldAlias, FieldKind, FilterOp, TableName};
