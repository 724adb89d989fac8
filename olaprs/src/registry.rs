//! Schema ingestion from a directory of table files.
//!
//! Layout: `<root>/dimension/*` holds dimension tables, `<root>/data/*` holds
//! fact tables. Files may be TOML (`.toml`) or YAML (`.yml` / `.yaml`).

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glob::glob;
use serde::de::{MapAccess, Visitor};
use serde::{de, Deserialize, Deserializer};

use crate::error::{OlapError, Result};
use crate::schema::{DataField, DataTable, DimensionField, DimensionTable, SchemaCollection};
use crate::types::{Calculation, FieldAlias, FieldKind};

const EXTENSIONS: [&str; 3] = ["toml", "yml", "yaml"];

#[derive(Debug, Deserialize)]
struct TableFile {
    database: String,
    schema: String,
    table: String,
    #[serde(default, deserialize_with = "flag")]
    base_table: bool,
    #[serde(default, deserialize_with = "ordered_fields")]
    fields: Vec<(String, FieldEntry)>,
}

impl TableFile {
    fn table_name(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.table)
    }
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    field_type: String,
    alias: String,
    #[serde(default)]
    front_name: Option<String>,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    calculation_type: Option<String>,
    #[serde(default)]
    following_calculation: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    use_sk_for_count: bool,
}

/// Booleans may be written as `true` or as the string `"true"`.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        Flag::Text(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        Flag::Text(text) => Err(de::Error::custom(format!(
            "expected true or false, got '{text}'"
        ))),
    }
}

/// Field entries keyed by source column, in the order the file lists them.
fn ordered_fields<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, FieldEntry)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FieldsVisitor;

    impl<'de> Visitor<'de> for FieldsVisitor {
        type Value = Vec<(String, FieldEntry)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of source column to field definition")
        }

        fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut seen = BTreeSet::new();
            let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((source_name, entry)) = map.next_entry::<String, FieldEntry>()? {
                if !seen.insert(source_name.clone()) {
                    return Err(de::Error::custom(format!(
                        "source column '{source_name}' is listed twice"
                    )));
                }
                fields.push((source_name, entry));
            }
            Ok(fields)
        }
    }

    deserializer.deserialize_map(FieldsVisitor)
}

/// `"none"` and empty strings mean "not set".
fn optional_text(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
        .map(str::to_string)
}

fn optional_calculation(value: Option<&String>) -> Result<Option<Calculation>> {
    match value {
        Some(text) => Calculation::parse_optional(text),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schema: SchemaCollection,
    files: Vec<PathBuf>,
}

impl SchemaRegistry {
    pub fn load_from_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut registry = SchemaRegistry::default();
        registry.load_dimension_tables(root.join("dimension"))?;
        registry.load_data_tables(root.join("data"))?;
        tracing::info!(
            root = %root.display(),
            data_tables = registry.schema.data_tables().count(),
            dimension_tables = registry.schema.dimension_tables().count(),
            "loaded schema"
        );
        Ok(registry)
    }

    pub fn schema(&self) -> &SchemaCollection {
        &self.schema
    }

    pub fn into_schema(self) -> SchemaCollection {
        self.schema
    }

    /// Files read, in load order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn load_dimension_tables(&mut self, dir: PathBuf) -> Result<()> {
        for path in table_files(&dir, "dimension")? {
            let file = read_table_file(&path)?;
            let table = dimension_table(file)
                .map_err(|e| with_path(&path, e))?;
            self.schema.add_dimension_table(table)?;
            self.files.push(path);
        }
        Ok(())
    }

    fn load_data_tables(&mut self, dir: PathBuf) -> Result<()> {
        for path in table_files(&dir, "data")? {
            let file = read_table_file(&path)?;
            let table = data_table(file)
                .map_err(|e| with_path(&path, e))?;
            self.schema.add_data_table(table)?;
            self.files.push(path);
        }
        Ok(())
    }
}

fn with_path(path: &Path, err: OlapError) -> OlapError {
    match err {
        OlapError::Schema(msg) => OlapError::Schema(format!("{}: {msg}", path.display())),
        other => other,
    }
}

fn table_files(dir: &Path, kind: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(OlapError::Schema(format!(
            "{kind} directory not found: {}",
            dir.display()
        )));
    }
    let mut paths = Vec::new();
    for ext in EXTENSIONS {
        let pattern = format!("{}/*.{ext}", dir.display());
        paths.extend(
            glob(&pattern)
                .map_err(|e| OlapError::Other(e.into()))?
                .flatten(),
        );
    }
    paths.sort();
    Ok(paths)
}

fn read_table_file(path: &Path) -> Result<TableFile> {
    let contents = fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "reading table file");
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(toml::from_str(&contents)?),
        _ => Ok(serde_yaml::from_str(&contents)?),
    }
}

fn dimension_table(file: TableFile) -> Result<DimensionTable> {
    let mut table = DimensionTable::new(file.table_name());
    for (source_name, entry) in &file.fields {
        table.add_field(DimensionField {
            source_name: source_name.clone(),
            alias: FieldAlias::new(entry.alias.trim()),
            kind: FieldKind::from_str(&entry.field_type)?,
            front_name: optional_text(entry.front_name.as_ref()),
            data_type: optional_text(entry.data_type.as_ref()),
            use_sk_for_count: entry.use_sk_for_count,
        })?;
    }
    Ok(table)
}

fn data_table(file: TableFile) -> Result<DataTable> {
    let mut table = DataTable::new(file.table_name());
    if file.base_table {
        table = table.as_base_table();
    }
    for (source_name, entry) in &file.fields {
        table.add_field(DataField {
            source_name: source_name.clone(),
            alias: FieldAlias::new(entry.alias.trim()),
            kind: FieldKind::from_str(&entry.field_type)?,
            calculation: optional_calculation(entry.calculation_type.as_ref())?,
            following_calculation: optional_calculation(entry.following_calculation.as_ref())?,
            front_name: optional_text(entry.front_name.as_ref()),
            data_type: optional_text(entry.data_type.as_ref()),
        })?;
    }
    Ok(table)
}
