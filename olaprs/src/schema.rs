//! In-memory schema model: fact ("data") tables, dimension tables and the
//! collection that owns both.
//!
//! All validation happens while tables are built. Once a [`SchemaCollection`]
//! exists it is immutable and can be shared read-only across planning requests.

use std::collections::BTreeMap;

use crate::error::{OlapError, Result};
use crate::types::{Calculation, FieldAlias, FieldKind, TableName};

/// A field of a dimension table.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionField {
    /// Column name in the database.
    pub source_name: String,
    pub alias: FieldAlias,
    pub kind: FieldKind,
    pub front_name: Option<String>,
    pub data_type: Option<String>,
    /// COUNT / COUNT DISTINCT of this field may be answered by counting the service key.
    pub use_sk_for_count: bool,
}

impl DimensionField {
    pub fn service_key(source_name: impl Into<String>, alias: impl Into<FieldAlias>) -> Self {
        Self {
            source_name: source_name.into(),
            alias: alias.into(),
            kind: FieldKind::ServiceKey,
            front_name: None,
            data_type: None,
            use_sk_for_count: false,
        }
    }

    pub fn dimension(
        source_name: impl Into<String>,
        alias: impl Into<FieldAlias>,
        front_name: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            alias: alias.into(),
            kind: FieldKind::Dimension,
            front_name: Some(front_name.into()),
            data_type: None,
            use_sk_for_count: false,
        }
    }

    pub fn with_sk_for_count(mut self, use_sk_for_count: bool) -> Self {
        self.use_sk_for_count = use_sk_for_count;
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// Lookup table joined to fact tables through its service key.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionTable {
    name: TableName,
    fields: Vec<DimensionField>,
}

impl DimensionTable {
    pub fn new(name: impl Into<TableName>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn fields(&self) -> &[DimensionField] {
        &self.fields
    }

    pub fn field(&self, alias: &str) -> Option<&DimensionField> {
        self.fields.iter().find(|f| f.alias.as_str() == alias)
    }

    pub fn service_key(&self) -> Option<&DimensionField> {
        self.fields.iter().find(|f| f.kind == FieldKind::ServiceKey)
    }

    pub fn add_field(&mut self, field: DimensionField) -> Result<()> {
        match field.kind {
            FieldKind::ServiceKey | FieldKind::Dimension => {}
            FieldKind::Value => {
                return Err(OlapError::Schema(format!(
                    "field type '{}' of '{}' in dimension table {} should be one of [service_key, dimension]",
                    field.kind.as_str(),
                    field.alias,
                    self.name
                )))
            }
        }

        if self.field(field.alias.as_str()).is_some() {
            return Err(OlapError::Schema(format!(
                "alias '{}' already exists in dimension table {}",
                field.alias, self.name
            )));
        }

        match (field.kind, &field.front_name) {
            (FieldKind::ServiceKey, Some(_)) => {
                return Err(OlapError::Schema(format!(
                    "front_name is set on service_key field '{}' in dimension table {}",
                    field.alias, self.name
                )))
            }
            (FieldKind::Dimension, None) => {
                return Err(OlapError::Schema(format!(
                    "front_name should be specified on dimension field '{}' in dimension table {}",
                    field.alias, self.name
                )))
            }
            _ => {}
        }

        if field.kind == FieldKind::ServiceKey && field.use_sk_for_count {
            return Err(OlapError::Schema(format!(
                "use_sk_for_count is set on service_key field '{}' in dimension table {}",
                field.alias, self.name
            )));
        }

        if field.kind == FieldKind::ServiceKey && self.service_key().is_some() {
            return Err(OlapError::Schema(format!(
                "service_key already exists in dimension table {}",
                self.name
            )));
        }

        self.fields.push(field);
        Ok(())
    }
}

/// A field of a fact table, possibly carrying a precomputed calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    /// Column name in the database.
    pub source_name: String,
    pub alias: FieldAlias,
    pub kind: FieldKind,
    /// Calculation already baked into this column (e.g. the column *is* a SUM).
    pub calculation: Option<Calculation>,
    /// The only further aggregation that may be layered on top of `calculation`.
    pub following_calculation: Option<Calculation>,
    pub front_name: Option<String>,
    pub data_type: Option<String>,
}

impl DataField {
    pub fn service_key(source_name: impl Into<String>, alias: impl Into<FieldAlias>) -> Self {
        Self {
            source_name: source_name.into(),
            alias: alias.into(),
            kind: FieldKind::ServiceKey,
            calculation: None,
            following_calculation: None,
            front_name: None,
            data_type: None,
        }
    }

    pub fn dimension(
        source_name: impl Into<String>,
        alias: impl Into<FieldAlias>,
        front_name: impl Into<String>,
    ) -> Self {
        Self::plain(source_name, alias, FieldKind::Dimension, front_name)
    }

    pub fn value(
        source_name: impl Into<String>,
        alias: impl Into<FieldAlias>,
        front_name: impl Into<String>,
    ) -> Self {
        Self::plain(source_name, alias, FieldKind::Value, front_name)
    }

    /// A value column holding a precomputed aggregate.
    pub fn calculated(
        source_name: impl Into<String>,
        alias: impl Into<FieldAlias>,
        calculation: Calculation,
        following_calculation: Option<Calculation>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            alias: alias.into(),
            kind: FieldKind::Value,
            calculation: Some(calculation),
            following_calculation,
            front_name: None,
            data_type: None,
        }
    }

    fn plain(
        source_name: impl Into<String>,
        alias: impl Into<FieldAlias>,
        kind: FieldKind,
        front_name: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            alias: alias.into(),
            kind,
            calculation: None,
            following_calculation: None,
            front_name: Some(front_name.into()),
            data_type: None,
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Whether the column can be selected or grouped as-is.
    pub fn is_plain(&self) -> bool {
        self.calculation.is_none()
    }
}

/// Fact table, either raw rows or a pre-aggregated rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    name: TableName,
    base_table: bool,
    fields: Vec<DataField>,
}

impl DataTable {
    pub fn new(name: impl Into<TableName>) -> Self {
        Self {
            name: name.into(),
            base_table: false,
            fields: Vec::new(),
        }
    }

    /// Mark this table as the raw, finest-grained fact table.
    pub fn as_base_table(mut self) -> Self {
        self.base_table = true;
        self
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn is_base_table(&self) -> bool {
        self.base_table
    }

    pub fn fields(&self) -> &[DataField] {
        &self.fields
    }

    pub fn field(&self, alias: &str) -> Option<&DataField> {
        self.fields.iter().find(|f| f.alias.as_str() == alias)
    }

    /// True if the table exposes `alias` with exactly `calculation` baked in
    /// (`None` asks for the plain column).
    pub fn has_field(&self, alias: &str, calculation: Option<Calculation>) -> bool {
        self.field(alias)
            .is_some_and(|f| f.calculation == calculation)
    }

    /// Aliases of every column that can be selected or grouped without aggregation.
    pub fn plain_aliases(&self) -> impl Iterator<Item = &FieldAlias> {
        self.fields.iter().filter(|f| f.is_plain()).map(|f| &f.alias)
    }

    pub fn add_field(&mut self, field: DataField) -> Result<()> {
        if self.field(field.alias.as_str()).is_some() {
            return Err(OlapError::Schema(format!(
                "repeated alias '{}' inside data table {}",
                field.alias, self.name
            )));
        }

        if field.kind == FieldKind::ServiceKey {
            if field.front_name.is_some() {
                return Err(OlapError::Schema(format!(
                    "front_name is set on service_key field '{}' in data table {}",
                    field.alias, self.name
                )));
            }
            if field.calculation.is_some() {
                return Err(OlapError::Schema(format!(
                    "service_key field '{}' in data table {} cannot carry a calculation",
                    field.alias, self.name
                )));
            }
        } else if field.front_name.is_none() && field.calculation.is_none() {
            return Err(OlapError::Schema(format!(
                "front_name should be specified on {} field '{}' in data table {}",
                field.kind.as_str(),
                field.alias,
                self.name
            )));
        }

        if field.following_calculation.is_some() && field.calculation.is_none() {
            return Err(OlapError::Schema(format!(
                "following_calculation on field '{}' in data table {} requires a calculation",
                field.alias, self.name
            )));
        }

        self.fields.push(field);
        Ok(())
    }
}

/// Result of resolving an alias against the dimension tables.
#[derive(Debug, Clone, Copy)]
pub struct DimensionLookup<'a> {
    pub table: &'a DimensionTable,
    pub field: &'a DimensionField,
    pub service_key: &'a DimensionField,
}

/// Every fact and dimension table known to the planner.
#[derive(Debug, Clone, Default)]
pub struct SchemaCollection {
    data_tables: BTreeMap<TableName, DataTable>,
    dimension_tables: BTreeMap<TableName, DimensionTable>,
}

impl SchemaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_data_table(&mut self, table: DataTable) -> Result<()> {
        self.check_unique_name(table.name())?;
        if table.is_base_table() {
            if let Some(existing) = self.base_table() {
                return Err(OlapError::Schema(format!(
                    "base table already set to {}, cannot also use {}",
                    existing.name(),
                    table.name()
                )));
            }
        }
        self.data_tables.insert(table.name().clone(), table);
        Ok(())
    }

    pub fn add_dimension_table(&mut self, table: DimensionTable) -> Result<()> {
        self.check_unique_name(table.name())?;
        if table.service_key().is_none() {
            return Err(OlapError::Schema(format!(
                "dimension table {} has no service_key field",
                table.name()
            )));
        }
        // Dimension lookups by alias must never be ambiguous.
        for field in table.fields() {
            if let Some(owner) = self.lookup_dimension(field.alias.as_str()) {
                return Err(OlapError::Schema(format!(
                    "alias '{}' of dimension table {} is already exposed by dimension table {}",
                    field.alias,
                    table.name(),
                    owner.table.name()
                )));
            }
        }
        self.dimension_tables.insert(table.name().clone(), table);
        Ok(())
    }

    fn check_unique_name(&self, name: &TableName) -> Result<()> {
        if self.data_tables.contains_key(name) || self.dimension_tables.contains_key(name) {
            return Err(OlapError::Schema(format!("duplicate table name {name}")));
        }
        Ok(())
    }

    pub fn data_tables(&self) -> impl Iterator<Item = &DataTable> {
        self.data_tables.values()
    }

    pub fn dimension_tables(&self) -> impl Iterator<Item = &DimensionTable> {
        self.dimension_tables.values()
    }

    pub fn data_table(&self, name: &str) -> Option<&DataTable> {
        self.data_tables.get(name)
    }

    pub fn dimension_table(&self, name: &str) -> Option<&DimensionTable> {
        self.dimension_tables.get(name)
    }

    pub fn base_table(&self) -> Option<&DataTable> {
        self.data_tables.values().find(|t| t.is_base_table())
    }

    /// Find the dimension table exposing `alias`, together with its service key.
    pub fn lookup_dimension(&self, alias: &str) -> Option<DimensionLookup<'_>> {
        self.dimension_tables.values().find_map(|table| {
            let field = table.field(alias)?;
            let service_key = table.service_key()?;
            Some(DimensionLookup {
                table,
                field,
                service_key,
            })
        })
    }

    pub fn field_present(
        &self,
        alias: &str,
        table_name: &str,
        calculation: Option<Calculation>,
    ) -> bool {
        self.data_table(table_name)
            .is_some_and(|t| t.has_field(alias, calculation))
    }
}
