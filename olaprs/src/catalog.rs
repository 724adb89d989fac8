use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::SchemaCollection;
use crate::types::{FieldAlias, FieldKind};

/// Field metadata offered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontendField {
    pub front_name: String,
    pub field_kind: FieldKind,
    pub data_type: Option<String>,
}

impl SchemaCollection {
    /// Fields a frontend may offer: the base table's plain non-key columns plus
    /// every dimension attribute.
    pub fn frontend_fields(&self) -> BTreeMap<FieldAlias, FrontendField> {
        let mut fields = BTreeMap::new();

        if let Some(base) = self.base_table() {
            for field in base.fields() {
                if field.kind == FieldKind::ServiceKey || !field.is_plain() {
                    continue;
                }
                if let Some(front_name) = &field.front_name {
                    fields.insert(
                        field.alias.clone(),
                        FrontendField {
                            front_name: front_name.clone(),
                            field_kind: field.kind,
                            data_type: field.data_type.clone(),
                        },
                    );
                }
            }
        }

        for table in self.dimension_tables() {
            for field in table.fields() {
                if field.kind != FieldKind::Dimension {
                    continue;
                }
                if let Some(front_name) = &field.front_name {
                    fields.insert(
                        field.alias.clone(),
                        FrontendField {
                            front_name: front_name.clone(),
                            field_kind: field.kind,
                            data_type: field.data_type.clone(),
                        },
                    );
                }
            }
        }

        fields
    }
}
