//! Frontend-to-backend request: which fields to select, aggregate and filter.
//!
//! Field names are internal aliases; display-name resolution happens before a
//! request reaches this crate. Requests are validated before planning so the
//! planner can assume every entry is well formed.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{OlapError, Result};
use crate::types::{Calculation, FieldAlias, FilterOp};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    #[serde(default, rename = "SELECT", alias = "select")]
    pub select: Vec<SelectField>,
    #[serde(
        default,
        rename = "CALCULATION",
        alias = "calculation",
        alias = "aggregate"
    )]
    pub aggregate: Vec<AggregateField>,
    #[serde(default, rename = "WHERE", alias = "where", alias = "filter")]
    pub filter: Vec<FilterField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectField {
    #[serde(alias = "fieldName")]
    pub field_name: FieldAlias,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateField {
    #[serde(alias = "fieldName")]
    pub field_name: FieldAlias,
    pub calculation: Calculation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    #[serde(alias = "fieldName")]
    pub field_name: FieldAlias,
    #[serde(rename = "where", alias = "op")]
    pub op: FilterOp,
    /// Literal right-hand side, rendered verbatim.
    #[serde(
        rename = "condition",
        alias = "value",
        deserialize_with = "literal_text"
    )]
    pub condition: String,
}

fn literal_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "filter condition must be a string, number or bool, got {other}"
        ))),
    }
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, field: impl Into<FieldAlias>) -> Self {
        self.select.push(SelectField {
            field_name: field.into(),
        });
        self
    }

    pub fn aggregate(mut self, field: impl Into<FieldAlias>, calculation: Calculation) -> Self {
        self.aggregate.push(AggregateField {
            field_name: field.into(),
            calculation,
        });
        self
    }

    pub fn filter(
        mut self,
        field: impl Into<FieldAlias>,
        op: FilterOp,
        condition: impl Into<String>,
    ) -> Self {
        self.filter.push(FilterField {
            field_name: field.into(),
            op,
            condition: condition.into(),
        });
        self
    }

    /// Parse and validate a request in the frontend JSON shape.
    pub fn from_json(json: &str) -> Result<Self> {
        let request: QueryRequest = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    pub fn is_empty(&self) -> bool {
        self.select.is_empty() && self.aggregate.is_empty() && self.filter.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let names = self
            .select
            .iter()
            .map(|s| &s.field_name)
            .chain(self.aggregate.iter().map(|a| &a.field_name))
            .chain(self.filter.iter().map(|f| &f.field_name));
        for name in names {
            if name.as_str().trim().is_empty() {
                return Err(OlapError::Request("field name must not be empty".to_string()));
            }
        }

        for f in &self.filter {
            if f.condition.trim().is_empty() {
                return Err(OlapError::Request(format!(
                    "filter on {} has an empty condition",
                    f.field_name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frontend_shape() {
        let json = r#"{
            "SELECT": [{"field_name": "year"}, {"field_name": "pcs"}],
            "CALCULATION": [{"field_name": "achievements", "calculation": "SUM"}],
            "WHERE": [{"field_name": "year", "where": "=", "condition": 2024}]
        }"#;
        let request = QueryRequest::from_json(json).unwrap();
        assert_eq!(request.select.len(), 2);
        assert_eq!(request.aggregate[0].calculation, Calculation::Sum);
        assert_eq!(request.filter[0].op, FilterOp::Eq);
        assert_eq!(request.filter[0].condition, "2024");
    }

    #[test]
    fn sections_are_optional_and_lowercase_accepted() {
        let request =
            QueryRequest::from_json(r#"{"select": [{"fieldName": "year"}]}"#).unwrap();
        assert_eq!(request.select[0].field_name.as_str(), "year");
        assert!(request.aggregate.is_empty());
        assert!(request.filter.is_empty());
    }

    #[test]
    fn rejects_malformed_filters() {
        let missing_op = r#"{"WHERE": [{"field_name": "year", "condition": "2024"}]}"#;
        assert!(QueryRequest::from_json(missing_op).is_err());

        let unknown_op =
            r#"{"WHERE": [{"field_name": "year", "where": "~~", "condition": "2024"}]}"#;
        assert!(QueryRequest::from_json(unknown_op).is_err());

        let empty = QueryRequest::new().filter("year", FilterOp::Eq, "  ");
        assert!(matches!(empty.validate(), Err(OlapError::Request(_))));
    }

    #[test]
    fn rejects_unknown_calculation() {
        let json = r#"{"CALCULATION": [{"field_name": "pcs", "calculation": "median"}]}"#;
        assert!(QueryRequest::from_json(json).is_err());
    }
}
