//! Identifier newtypes and the closed vocabularies shared by the schema model,
//! requests and the planner.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OlapError, Result};
use crate::sql_ast::SqlBinaryOperator;

/// Fully qualified table name in `database.schema.table` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last dotted segment, used to qualify columns in rendered SQL.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TableName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TableName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TableName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Internal field identifier shared by fact tables, dimension tables and requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldAlias(String);

impl FieldAlias {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Alias text shown for a field with a calculation applied, e.g. `pcs__sum`.
    pub fn with_calculation(&self, calculation: Calculation) -> String {
        format!("{}__{}", self.0, calculation.as_str())
    }
}

impl fmt::Display for FieldAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldAlias {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldAlias {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldAlias {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    ServiceKey,
    Dimension,
    Value,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::ServiceKey => "service_key",
            FieldKind::Dimension => "dimension",
            FieldKind::Value => "value",
        }
    }
}

impl FromStr for FieldKind {
    type Err = OlapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "service_key" => Ok(FieldKind::ServiceKey),
            "dimension" => Ok(FieldKind::Dimension),
            "value" => Ok(FieldKind::Value),
            other => Err(OlapError::Schema(format!(
                "field type '{other}' is not one of [service_key, dimension, value]"
            ))),
        }
    }
}

/// Aggregate functions a field can carry or a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Calculation {
    Sum,
    Count,
    CountDistinct,
    Min,
    Max,
    Avg,
}

impl Calculation {
    pub const ALL: [Calculation; 6] = [
        Calculation::Sum,
        Calculation::Count,
        Calculation::CountDistinct,
        Calculation::Min,
        Calculation::Max,
        Calculation::Avg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Calculation::Sum => "sum",
            Calculation::Count => "count",
            Calculation::CountDistinct => "count_distinct",
            Calculation::Min => "min",
            Calculation::Max => "max",
            Calculation::Avg => "avg",
        }
    }

    /// COUNT and COUNT DISTINCT may be answered from a dimension's service key.
    pub fn is_count(&self) -> bool {
        matches!(self, Calculation::Count | Calculation::CountDistinct)
    }

    /// Parse a schema-file calculation slot where `none` (or nothing) means no calculation.
    pub fn parse_optional(value: &str) -> Result<Option<Calculation>> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Calculation {
    type Err = OlapError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Calculation::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Calculation::ALL.iter().map(|c| c.as_str()).collect();
                OlapError::Schema(format!(
                    "calculation '{}' is not one of [{}]",
                    s.trim(),
                    known.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Calculation {
    type Error = OlapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Calculation> for String {
    fn from(value: Calculation) -> Self {
        value.as_str().to_string()
    }
}

/// Comparison operator of a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterOp {
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

impl FilterOp {
    /// Operator text as it appears in a rendered WHERE clause.
    pub fn as_sql(&self) -> &'static str {
        SqlBinaryOperator::from(*self).as_sql()
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for FilterOp {
    type Err = OlapError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(FilterOp::Eq),
            "!=" | "<>" => Ok(FilterOp::Neq),
            ">" => Ok(FilterOp::Gt),
            ">=" => Ok(FilterOp::Gte),
            "<" => Ok(FilterOp::Lt),
            "<=" => Ok(FilterOp::Lte),
            "like" => Ok(FilterOp::Like),
            "ilike" => Ok(FilterOp::ILike),
            "in" => Ok(FilterOp::In),
            "not in" => Ok(FilterOp::NotIn),
            _ => Err(OlapError::Request(format!("unknown filter operator '{s}'"))),
        }
    }
}

impl TryFrom<String> for FilterOp {
    type Error = OlapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FilterOp> for String {
    fn from(value: FilterOp) -> Self {
        value.as_sql().to_string()
    }
}
