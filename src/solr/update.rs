//! Document posting and atomic updates.

use serde_json::{json, Map, Value};
use tracing::warn;

use super::{Body, Result, SchemaField, SolrClient, SolrError, SolrMode};

impl SolrClient {
    /// Post whole documents and commit
    pub async fn post_data(&self, docs: &[Map<String, Value>], name: &str) -> Result<Value> {
        let body = Body::Json(serde_json::to_string(docs)?);
        let response = self
            .post_solr(name, "update/json/docs?commit=true", body, true)
            .await?;
        self.checked_update(response, name).await
    }

    /// Set the given fields on existing documents (matched by `id`) and commit
    pub async fn update_data(&self, docs: &[Map<String, Value>], name: &str) -> Result<Value> {
        let body = Body::Json(serde_json::to_string(&atomic_update_docs(docs))?);
        let response = self
            .post_solr(name, "update/json?commit=true", body, true)
            .await?;
        self.checked_update(response, name).await
    }

    async fn checked_update(&self, response: Value, name: &str) -> Result<Value> {
        if response.get("error").is_none() {
            return Ok(response);
        }
        let mode = self.detect_mode().await.unwrap_or(SolrMode::Collections);
        let schema = match self.get_schema(name, mode, true).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Could not read schema for {}: {}", name, e);
                Vec::new()
            }
        };
        check_update(response, &schema)
    }
}

/// Rewrite documents as atomic `set` updates, leaving `id` untouched
pub fn atomic_update_docs(docs: &[Map<String, Value>]) -> Vec<Map<String, Value>> {
    docs.iter()
        .map(|doc| {
            doc.iter()
                .map(|(k, v)| {
                    let v = if k == "id" {
                        v.clone()
                    } else {
                        json!({ "set": v })
                    };
                    (k.clone(), v)
                })
                .collect()
        })
        .collect()
}

/// Turn an update error into a descriptive error.
///
/// Solr reports a type mismatch as
/// `Error adding field 'Field'='value' msg=...`; the field type is looked up
/// in `schema`.
pub fn check_update(response: Value, schema: &[SchemaField]) -> Result<Value> {
    let Some(msg) = response
        .get("error")
        .and_then(|e| e.get("msg"))
        .and_then(Value::as_str)
    else {
        return Ok(response);
    };

    if msg.contains("Error adding field") {
        let parts: Vec<&str> = msg.split('\'').collect();
        if parts.len() >= 4 {
            let field = parts[1].to_string();
            let field_type = schema
                .iter()
                .find(|f| f.name == field)
                .map(|f| f.field_type.clone())
                .unwrap_or_else(|| "None".to_string());
            return Err(SolrError::FieldType {
                data: parts[3].to_string(),
                field,
                field_type,
            });
        }
    }
    Err(SolrError::Rejected(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_atomic_update_wraps_all_but_id() {
        let docs = vec![doc(json!({"id": "a1", "TIPLOC": "EUSTON", "count": 3}))];
        let updated = atomic_update_docs(&docs);
        assert_eq!(
            Value::Object(updated[0].clone()),
            json!({"id": "a1", "TIPLOC": {"set": "EUSTON"}, "count": {"set": 3}})
        );
    }

    #[test]
    fn test_check_update_passes_success() {
        let ok = json!({"responseHeader": {"status": 0, "QTime": 4}});
        assert_eq!(check_update(ok.clone(), &[]).unwrap(), ok);
    }

    #[test]
    fn test_check_update_field_type() {
        let schema: Vec<SchemaField> = serde_json::from_value(json!([
            {"name": "count", "type": "pint"},
            {"name": "TIPLOC", "type": "string"}
        ]))
        .unwrap();
        let response = json!({
            "responseHeader": {"status": 400},
            "error": {"msg": "ERROR: [doc=1] Error adding field 'count'='many' msg=For input string: \"many\"", "code": 400}
        });
        match check_update(response, &schema) {
            Err(SolrError::FieldType {
                data,
                field,
                field_type,
            }) => {
                assert_eq!(data, "many");
                assert_eq!(field, "count");
                assert_eq!(field_type, "pint");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_check_update_other_error() {
        let response = json!({"error": {"msg": "missing required field: id"}});
        assert!(matches!(
            check_update(response, &[]),
            Err(SolrError::Rejected(_))
        ));
    }
}
