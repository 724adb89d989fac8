//! Candidate plan: the per-fact-table working state of a planning request.
//!
//! Every fact table starts with an empty [`CandidatePlanEntry`]. The planner
//! only ever adds to an entry or evicts the whole table; nothing is rolled
//! back. Once planning finishes the entries are read-only input for rendering.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{DataTable, SchemaCollection};
use crate::types::{Calculation, FieldAlias, FilterOp, TableName};

/// A column selected as-is from the fact table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainSelect {
    pub backend_field: String,
    pub frontend_field: FieldAlias,
    /// Set when the column already holds the requested aggregate.
    pub frontend_calculation: Option<Calculation>,
}

impl PlainSelect {
    pub fn output_alias(&self) -> String {
        match self.frontend_calculation {
            Some(calculation) => self.frontend_field.with_calculation(calculation),
            None => self.frontend_field.to_string(),
        }
    }
}

/// An aggregation computed over a fact table column without any join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InPlaceAggregation {
    pub backend_field: String,
    pub calculation: Calculation,
    pub frontend_field: FieldAlias,
    pub frontend_calculation: Calculation,
}

impl InPlaceAggregation {
    pub fn output_alias(&self) -> String {
        self.frontend_field.with_calculation(self.frontend_calculation)
    }
}

/// Service key column names on both sides of a fact-to-dimension join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKeys {
    pub fact_service_key: String,
    pub dimension_service_key: String,
}

impl JoinKeys {
    pub fn new(fact_service_key: impl Into<String>, dimension_service_key: impl Into<String>) -> Self {
        Self {
            fact_service_key: fact_service_key.into(),
            dimension_service_key: dimension_service_key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedField {
    pub backend_field: String,
    pub frontend_field: FieldAlias,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedAggregation {
    pub backend_field: String,
    pub calculation: Calculation,
    pub frontend_field: FieldAlias,
}

impl JoinedAggregation {
    pub fn output_alias(&self) -> String {
        self.frontend_field.with_calculation(self.calculation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedCondition {
    pub backend_field: String,
    pub op: FilterOp,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereCondition {
    pub op: FilterOp,
    pub condition: String,
}

/// Everything one category of the plan needs from a single dimension table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGroup<T> {
    pub keys: JoinKeys,
    pub items: Vec<T>,
}

impl<T> JoinGroup<T> {
    fn new(keys: JoinKeys) -> Self {
        Self {
            keys,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePlanEntry {
    selects: Vec<PlainSelect>,
    aggregations: Vec<InPlaceAggregation>,
    join_selects: BTreeMap<TableName, JoinGroup<JoinedField>>,
    join_aggregations: BTreeMap<TableName, JoinGroup<JoinedAggregation>>,
    join_where: BTreeMap<TableName, JoinGroup<JoinedCondition>>,
    self_where: BTreeMap<String, Vec<WhereCondition>>,
    remaining_fields: BTreeSet<FieldAlias>,
}

impl CandidatePlanEntry {
    /// Fresh entry whose remaining fields are all plain columns of `table`.
    pub fn for_table(table: &DataTable) -> Self {
        Self {
            remaining_fields: table.plain_aliases().cloned().collect(),
            ..Self::default()
        }
    }

    pub fn selects(&self) -> &[PlainSelect] {
        &self.selects
    }

    pub fn aggregations(&self) -> &[InPlaceAggregation] {
        &self.aggregations
    }

    pub fn join_selects(&self) -> &BTreeMap<TableName, JoinGroup<JoinedField>> {
        &self.join_selects
    }

    pub fn join_aggregations(&self) -> &BTreeMap<TableName, JoinGroup<JoinedAggregation>> {
        &self.join_aggregations
    }

    pub fn join_where(&self) -> &BTreeMap<TableName, JoinGroup<JoinedCondition>> {
        &self.join_where
    }

    pub fn self_where(&self) -> &BTreeMap<String, Vec<WhereCondition>> {
        &self.self_where
    }

    pub fn remaining_fields(&self) -> &BTreeSet<FieldAlias> {
        &self.remaining_fields
    }

    /// Number of plain columns no request field consumed.
    pub fn unresolved_field_count(&self) -> usize {
        self.remaining_fields.len()
    }

    /// True once native selects consumed every plain column, i.e. the table
    /// already sits at the requested grain.
    ///
    /// A joined select consumes the service key it joins through, but the
    /// joined attribute may be coarser than the key, so any joined select
    /// means the rows still need grouping.
    pub fn is_at_requested_grain(&self) -> bool {
        self.remaining_fields.is_empty() && self.join_selects.is_empty()
    }

    pub fn has_aggregation(&self) -> bool {
        !self.aggregations.is_empty()
            || self.join_aggregations.values().any(|g| !g.items.is_empty())
    }

    /// Join tables referenced by any category, each exactly once, in name order.
    pub fn join_tables(&self) -> BTreeMap<&TableName, &JoinKeys> {
        let mut tables = BTreeMap::new();
        for (name, group) in &self.join_selects {
            tables.entry(name).or_insert(&group.keys);
        }
        for (name, group) in &self.join_aggregations {
            tables.entry(name).or_insert(&group.keys);
        }
        for (name, group) in &self.join_where {
            tables.entry(name).or_insert(&group.keys);
        }
        tables
    }

    pub(crate) fn consume(&mut self, alias: &FieldAlias) {
        self.remaining_fields.remove(alias);
    }

    pub(crate) fn add_select(&mut self, select: PlainSelect) {
        self.selects.push(select);
    }

    pub(crate) fn add_aggregation(&mut self, aggregation: InPlaceAggregation) {
        self.aggregations.push(aggregation);
    }

    pub(crate) fn add_self_where(&mut self, backend_field: &str, condition: WhereCondition) {
        self.self_where
            .entry(backend_field.to_string())
            .or_default()
            .push(condition);
    }

    pub(crate) fn add_join_select(&mut self, table: &TableName, keys: JoinKeys, field: JoinedField) {
        self.join_selects
            .entry(table.clone())
            .or_insert_with(|| JoinGroup::new(keys))
            .items
            .push(field);
    }

    pub(crate) fn add_join_aggregation(
        &mut self,
        table: &TableName,
        keys: JoinKeys,
        aggregation: JoinedAggregation,
    ) {
        self.join_aggregations
            .entry(table.clone())
            .or_insert_with(|| JoinGroup::new(keys))
            .items
            .push(aggregation);
    }

    pub(crate) fn add_join_where(
        &mut self,
        table: &TableName,
        keys: JoinKeys,
        condition: JoinedCondition,
    ) {
        self.join_where
            .entry(table.clone())
            .or_insert_with(|| JoinGroup::new(keys))
            .items
            .push(condition);
    }
}

/// Surviving candidate tables of one request, keyed by fact table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePlan {
    entries: BTreeMap<TableName, CandidatePlanEntry>,
    evicted: BTreeSet<TableName>,
}

impl CandidatePlan {
    /// One empty entry per fact table of the schema.
    pub fn initialize(schema: &SchemaCollection) -> Self {
        Self {
            entries: schema
                .data_tables()
                .map(|t| (t.name().clone(), CandidatePlanEntry::for_table(t)))
                .collect(),
            evicted: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.entries.contains_key(table)
    }

    pub fn get(&self, table: &str) -> Option<&CandidatePlanEntry> {
        self.entries.get(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableName, &CandidatePlanEntry)> {
        self.entries.iter()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &TableName> {
        self.entries.keys()
    }

    /// Tables removed during planning; never re-admitted.
    pub fn evicted(&self) -> &BTreeSet<TableName> {
        &self.evicted
    }

    pub fn into_entries(self) -> BTreeMap<TableName, CandidatePlanEntry> {
        self.entries
    }

    pub(crate) fn live_tables(&self) -> Vec<TableName> {
        self.entries.keys().cloned().collect()
    }

    pub(crate) fn entry_mut(&mut self, table: &TableName) -> Option<&mut CandidatePlanEntry> {
        self.entries.get_mut(table)
    }

    pub(crate) fn evict(&mut self, table: &TableName, field: &FieldAlias, reason: &str) {
        if self.entries.remove(table).is_some() {
            tracing::debug!(table = %table, field = %field, reason, "evicting candidate table");
            self.evicted.insert(table.clone());
        }
    }
}
