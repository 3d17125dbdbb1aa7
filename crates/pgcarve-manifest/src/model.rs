use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::errors::{ManifestError, Result};
use crate::mask::TableMask;

/// A manually declared foreign key, supplementing catalog introspection.
///
/// `references` names the parent table; the referenced column defaults to
/// the conventional `id` primary key downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct ForeignKeyHint {
    pub table: String,
    pub column: String,
    pub references: String,
}

/// One exportable table, fully resolved at load time.
#[derive(Debug, Clone)]
pub struct TableEntry {
    table: String,
    query: Option<String>,
    has_many: Vec<String>,
    mask: Option<TableMask>,
}

impl TableEntry {
    pub fn name(&self) -> &str {
        &self.table
    }

    /// Interpolated row-filter query, present only for partial entries.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// True when the entry selects a subset of rows rather than the whole
    /// table.
    pub fn is_partial(&self) -> bool {
        self.query.is_some()
    }

    /// Dependent child tables, in declaration order.
    pub fn has_many(&self) -> &[String] {
        &self.has_many
    }

    /// Compiled mask rules for this table, if any were declared.
    pub fn mask(&self) -> Option<&TableMask> {
        self.mask.as_ref()
    }
}

/// Root manifest: variables plus an ordered list of table entries.
#[derive(Debug, Clone)]
pub struct Manifest {
    variables: BTreeMap<String, String>,
    tables: Vec<TableEntry>,
    foreign_keys: Vec<ForeignKeyHint>,
}

impl Manifest {
    /// Load a manifest from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ManifestError::MissingFile(path.to_path_buf()));
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Parse a manifest from YAML text.
    pub fn parse(input: &str) -> Result<Self> {
        let raw: RawManifest = serde_yaml::from_str(input)?;
        Self::resolve(raw)
    }

    fn resolve(raw: RawManifest) -> Result<Self> {
        if raw.tables.is_empty() {
            return Err(ManifestError::MissingTables);
        }

        let mut variables = BTreeMap::new();
        for (name, value) in raw.variables {
            let rendered = render_scalar(&value)
                .ok_or_else(|| ManifestError::InvalidVariable(name.clone()))?;
            variables.insert(name, rendered);
        }

        let mut tables: Vec<TableEntry> = Vec::with_capacity(raw.tables.len());
        for entry in raw.tables {
            if tables.iter().any(|existing| existing.table == entry.table) {
                return Err(ManifestError::DuplicateTable(entry.table));
            }

            let query = entry
                .query
                .map(|template| interpolate(&template, &variables))
                .transpose()?;

            let mut has_many = entry.has_many;
            if let Some(extra) = raw.has_many.get(&entry.table) {
                for child in extra {
                    if !has_many.contains(child) {
                        has_many.push(child.clone());
                    }
                }
            }

            let mask = entry
                .mask_columns
                .map(|columns| {
                    let raw_rules = columns
                        .into_iter()
                        .map(|(column, pairs)| (column, pairs.0))
                        .collect();
                    TableMask::compile(&entry.table, raw_rules)
                })
                .transpose()?
                .filter(|mask| !mask.is_empty());

            tables.push(TableEntry {
                table: entry.table,
                query,
                has_many,
                mask,
            });
        }

        Ok(Self {
            variables,
            tables,
            foreign_keys: raw.foreign_keys,
        })
    }

    /// Table entries in document order.
    pub fn tables(&self) -> &[TableEntry] {
        &self.tables
    }

    /// Look up an entry by table name.
    pub fn table(&self, name: &str) -> Option<&TableEntry> {
        self.tables.iter().find(|entry| entry.table == name)
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyHint] {
        &self.foreign_keys
    }
}

/// Substitute `%{name}` placeholders in a query template.
pub fn interpolate(template: &str, variables: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ManifestError::UnterminatedPlaceholder(template.to_string()))?;
        let name = &after[..end];
        let value = variables
            .get(name)
            .ok_or_else(|| ManifestError::UnknownVariable(name.to_string()))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn render_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    variables: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    tables: Vec<RawTableEntry>,
    #[serde(default)]
    has_many: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKeyHint>,
}

#[derive(Debug, Deserialize)]
struct RawTableEntry {
    table: String,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    has_many: Vec<String>,
    #[serde(default)]
    mask_columns: Option<BTreeMap<String, RulePairs>>,
}

/// `{pattern: replacement}` mapping preserving document order.
#[derive(Debug)]
struct RulePairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RulePairs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping of pattern to replacement")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((pattern, replacement)) = map.next_entry::<String, String>()? {
                    pairs.push((pattern, replacement));
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor).map(RulePairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
variables:
  user_id: 42
tables:
  - table: users
    query: "select * from users where id = %{user_id}"
    has_many:
      - orders
    mask_columns:
      email:
        "@example\\.com$": "@masked.test"
        "^alice": "somebody"
  - table: products
has_many:
  users:
    - audit_events
foreign_keys:
  - table: orders
    column: user_id
    references: users
"#;

    #[test]
    fn parses_a_full_manifest() {
        let manifest = Manifest::parse(MANIFEST).expect("parse manifest");

        let users = manifest.table("users").expect("users entry");
        assert!(users.is_partial());
        assert_eq!(users.query(), Some("select * from users where id = 42"));
        assert_eq!(users.has_many(), ["orders", "audit_events"]);

        let mask = users.mask().expect("mask");
        let rules = mask.rules_for("email").expect("email rules");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].replacement(), "@masked.test");
        assert_eq!(rules[1].replacement(), "somebody");

        let products = manifest.table("products").expect("products entry");
        assert!(!products.is_partial());
        assert!(products.mask().is_none());

        assert_eq!(manifest.foreign_keys().len(), 1);
        assert_eq!(manifest.foreign_keys()[0].references, "users");
    }

    #[test]
    fn preserves_table_order() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let names: Vec<&str> = manifest.tables().iter().map(TableEntry::name).collect();
        assert_eq!(names, ["users", "products"]);
    }

    #[test]
    fn rejects_missing_tables() {
        let err = Manifest::parse("variables: {}\n").unwrap_err();
        assert!(matches!(err, ManifestError::MissingTables));
    }

    #[test]
    fn rejects_duplicate_tables() {
        let err = Manifest::parse("tables:\n  - table: users\n  - table: users\n").unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateTable(name) if name == "users"));
    }

    #[test]
    fn rejects_unknown_variables() {
        let input = "tables:\n  - table: users\n    query: \"select * from users where id = %{missing}\"\n";
        let err = Manifest::parse(input).unwrap_err();
        assert!(matches!(err, ManifestError::UnknownVariable(name) if name == "missing"));
    }

    #[test]
    fn rejects_non_scalar_variables() {
        let input = "variables:\n  ids: [1, 2]\ntables:\n  - table: users\n";
        let err = Manifest::parse(input).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidVariable(name) if name == "ids"));
    }

    #[test]
    fn interpolates_multiple_placeholders() {
        let mut variables = BTreeMap::new();
        variables.insert("a".to_string(), "1".to_string());
        variables.insert("b".to_string(), "two".to_string());
        let rendered = interpolate("x = %{a} and y = '%{b}'", &variables).unwrap();
        assert_eq!(rendered, "x = 1 and y = 'two'");
    }

    #[test]
    fn rejects_unterminated_placeholder() {
        let err = interpolate("id = %{oops", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ManifestError::UnterminatedPlaceholder(_)));
    }

    #[test]
    fn mask_of_only_noop_rules_is_absent() {
        let input = "tables:\n  - table: users\n    mask_columns:\n      email:\n        \"\": \"x\"\n";
        let manifest = Manifest::parse(input).unwrap();
        assert!(manifest.table("users").unwrap().mask().is_none());
    }
}
