//! Solr schema management.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use super::{Body, Result, SolrClient, SolrError, SolrMode};

/// System fields never reported as user fields
const SYSTEM_FIELDS: &[&str] = &["_root_", "_version_", "_text_", "_nest_path_"];

/// A field definition as reported by `schema/fields`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A `copyField` rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyField {
    pub source: String,
    pub dest: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct FullSchema {
    pub fields: Vec<SchemaField>,
    pub copy_fields: Vec<CopyField>,
}

/// A field definition to add or replace
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolrField {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub field_type: String,
    #[serde(rename = "multiValued", default)]
    pub multi_valued: bool,
    #[serde(default = "default_true")]
    pub stored: bool,
    #[serde(rename = "docValues", default)]
    pub doc_values: bool,
}

fn default_type() -> String {
    "string".to_string()
}

fn default_true() -> bool {
    true
}

impl SolrField {
    pub fn new(name: &str, field_type: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(SolrError::MissingFieldName);
        }
        Ok(Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            multi_valued: false,
            stored: true,
            doc_values: false,
        })
    }

    /// Schema API form. Solr takes the flags as `"true"`/`"false"` strings.
    pub fn to_command(&self) -> Result<Value> {
        if self.name.is_empty() {
            return Err(SolrError::MissingFieldName);
        }
        Ok(json!({
            "name": self.name,
            "type": self.field_type,
            "multiValued": self.multi_valued.to_string(),
            "stored": self.stored.to_string(),
            "docValues": self.doc_values.to_string(),
        }))
    }
}

pub fn is_user_field(name: &str) -> bool {
    !SYSTEM_FIELDS.contains(&name)
}

/// Split `fields` into `add-field` and `replace-field` by whether the name
/// is already in `existing`
pub fn schema_command(existing: &HashSet<String>, fields: &[SolrField]) -> Result<Value> {
    let mut add = Vec::new();
    let mut replace = Vec::new();
    for field in fields {
        if existing.contains(&field.name) {
            replace.push(field.to_command()?);
        } else {
            add.push(field.to_command()?);
        }
    }
    Ok(json!({ "add-field": add, "replace-field": replace }))
}

impl SolrClient {
    async fn schema_part(&self, name: &str, mode: SolrMode, part: &str) -> Result<Value> {
        self.get_api(mode.api_type(), name, part)
            .await
            .map_err(|e| {
                if e.is_status() {
                    SolrError::UnknownName(name.to_string())
                } else {
                    e
                }
            })
    }

    /// Schema fields. Unless `all_fields` is set, system and required fields
    /// are left out.
    pub async fn get_schema(
        &self,
        name: &str,
        mode: SolrMode,
        all_fields: bool,
    ) -> Result<Vec<SchemaField>> {
        let mut data = self.schema_part(name, mode, "schema/fields").await?;
        let fields: Vec<SchemaField> = match data.get_mut("fields") {
            Some(fields) => serde_json::from_value(fields.take())?,
            None => return Err(SolrError::Unexpected(format!("no fields for {}", name))),
        };
        if all_fields {
            return Ok(fields);
        }
        Ok(fields
            .into_iter()
            .filter(|f| is_user_field(&f.name) && !f.required)
            .collect())
    }

    /// Schema fields together with the `copyField` rules
    pub async fn get_full_schema(
        &self,
        name: &str,
        mode: SolrMode,
        all_fields: bool,
    ) -> Result<FullSchema> {
        let fields = self.get_schema(name, mode, all_fields).await?;
        let mut data = self.schema_part(name, mode, "schema/copyfields").await?;
        let copy_fields = match data.get_mut("copyFields") {
            Some(rules) => serde_json::from_value(rules.take())?,
            None => Vec::new(),
        };
        Ok(FullSchema {
            fields,
            copy_fields,
        })
    }

    /// Add new fields and replace existing ones
    pub async fn set_schema(&self, name: &str, mode: SolrMode, fields: &[SolrField]) -> Result<Value> {
        let existing: HashSet<String> = match self.get_schema(name, mode, false).await {
            Ok(schema) => schema.into_iter().map(|f| f.name).collect(),
            Err(SolrError::UnknownName(_)) => HashSet::new(),
            Err(e) => return Err(e),
        };
        let command = schema_command(&existing, fields)?;
        self.post_solr(name, "schema", Body::json(&command), false)
            .await
    }

    /// Remove every copy-field rule and user field from the schema
    pub async fn delete_schema(&self, name: &str) -> Result<Value> {
        let schema = self
            .get_full_schema(name, SolrMode::Collections, false)
            .await?;

        for rule in &schema.copy_fields {
            let command = json!({
                "delete-copy-field": { "source": rule.source, "dest": rule.dest }
            });
            self.post_solr(name, "schema", Body::json(&command), false)
                .await?;
        }

        let fields: Vec<Value> = schema
            .fields
            .iter()
            .map(|f| json!({ "name": f.name }))
            .collect();
        info!("Deleting {} fields from {}", fields.len(), name);
        let command = json!({ "delete-field": fields });
        self.post_solr(name, "schema", Body::json(&command), false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_command_uses_string_flags() {
        let mut field = SolrField::new("TIPLOC", "string").unwrap();
        field.doc_values = true;
        assert_eq!(
            field.to_command().unwrap(),
            json!({
                "name": "TIPLOC",
                "type": "string",
                "multiValued": "false",
                "stored": "true",
                "docValues": "true"
            })
        );
    }

    #[test]
    fn test_field_requires_name() {
        assert!(matches!(
            SolrField::new("", "string"),
            Err(SolrError::MissingFieldName)
        ));
    }

    #[test]
    fn test_field_defaults_from_json() {
        let field: SolrField = serde_json::from_value(json!({"name": "Headcode"})).unwrap();
        assert_eq!(field.field_type, "string");
        assert!(field.stored);
        assert!(!field.multi_valued);
        assert!(!field.doc_values);
    }

    #[test]
    fn test_system_fields() {
        assert!(!is_user_field("_version_"));
        assert!(!is_user_field("_nest_path_"));
        assert!(is_user_field("TIPLOC"));
    }

    #[test]
    fn test_schema_command_splits_add_and_replace() {
        let existing: HashSet<String> = ["TIPLOC".to_string()].into_iter().collect();
        let fields = vec![
            SolrField::new("TIPLOC", "string").unwrap(),
            SolrField::new("count", "pint").unwrap(),
        ];
        let command = schema_command(&existing, &fields).unwrap();
        assert_eq!(command["replace-field"][0]["name"], "TIPLOC");
        assert_eq!(command["add-field"][0]["name"], "count");
        assert_eq!(command["add-field"].as_array().unwrap().len(), 1);
    }
}
