//! Search, count, facet and group queries against the `select` handler.

use serde_json::{Map, Value};
use tracing::debug;

use super::{Body, Result, SolrClient, SolrError, SolrMode};
use crate::models::display_value;

/// Parameters for a `select` request
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub q: String,
    pub sort: String,
    pub rows: usize,
    pub group_field: Option<String>,
    pub facet_field: Option<String>,
    /// `group.limit` / `facet.limit`
    pub ngroup: usize,
    /// Extra parameters, applied last so they override the ones above
    pub extra: Vec<(String, String)>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            q: "*:*".to_string(),
            sort: "id asc".to_string(),
            rows: 10,
            group_field: None,
            facet_field: None,
            ngroup: 1024,
            extra: Vec::new(),
        }
    }
}

impl QueryParams {
    pub fn new(q: &str) -> Self {
        Self {
            q: q.to_string(),
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = sort.to_string();
        self
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Restrict the returned fields
    pub fn fl(self, fields: &str) -> Self {
        self.param("fl", fields)
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.extra.push((key.to_string(), value.to_string()));
        self
    }

    pub fn group(mut self, field: &str, ngroup: usize) -> Self {
        self.group_field = Some(field.to_string());
        self.ngroup = ngroup;
        self
    }

    pub fn facet(mut self, field: &str, ngroup: usize) -> Self {
        self.facet_field = Some(field.to_string());
        self.ngroup = ngroup;
        self
    }

    /// Form parameters in request order
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = vec![
            ("q".into(), self.q.clone()),
            ("sort".into(), self.sort.clone()),
            ("rows".into(), self.rows.to_string()),
            ("indent".into(), "off".into()),
        ];
        if let Some(field) = &self.group_field {
            form.push(("group".into(), "true".into()));
            form.push(("group.field".into(), field.clone()));
            form.push(("group.limit".into(), self.ngroup.to_string()));
        }
        if let Some(field) = &self.facet_field {
            form.push(("facet".into(), "true".into()));
            form.push(("facet.field".into(), field.clone()));
            form.push(("facet.limit".into(), self.ngroup.to_string()));
        }
        for (key, value) in &self.extra {
            match form.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.clone(),
                None => form.push((key.clone(), value.clone())),
            }
        }
        form
    }
}

/// One bucket of a grouped query
#[derive(Debug, Clone)]
pub struct Group {
    pub value: Value,
    pub docs: Vec<Map<String, Value>>,
}

impl SolrClient {
    /// Send a `select` request and return the body without its header
    pub async fn raw_query(&self, name: &str, params: &QueryParams) -> Result<Map<String, Value>> {
        debug!("select on {}: {:?}", name, params.q);
        match self
            .post_solr(name, "select", Body::Form(params.to_form()), false)
            .await?
        {
            Value::Object(map) => Ok(map),
            other => Err(SolrError::Unexpected(format!(
                "select on {} returned {}",
                name, other
            ))),
        }
    }

    /// Fail with `UnknownName` unless `name` answers a ping
    pub async fn ensure_exists(&self, name: &str) -> Result<()> {
        if !self.ping(name, SolrMode::Cores).await? {
            return Err(SolrError::UnknownName(name.to_string()));
        }
        Ok(())
    }

    /// Number of documents matching `q`
    pub async fn get_count(&self, name: &str, q: &str) -> Result<u64> {
        self.ensure_exists(name).await?;
        let params = QueryParams::new(q).rows(0).param("start", "0");
        let mut body = self.raw_query(name, &params).await?;
        let response = take_member(&mut body, "response")?;
        response
            .get("numFound")
            .and_then(Value::as_u64)
            .ok_or_else(|| SolrError::Unexpected("response without numFound".into()))
    }

    /// Matching documents. Without a row limit every document in the
    /// collection is requested.
    pub async fn get_query(
        &self,
        name: &str,
        params: QueryParams,
        limit: Option<usize>,
    ) -> Result<Vec<Map<String, Value>>> {
        self.ensure_exists(name).await?;
        let rows = match limit {
            Some(rows) => rows,
            None => self.get_count(name, "*:*").await? as usize,
        };
        let params = params.rows(rows);
        let mut body = self.raw_query(name, &params).await?;
        let response = take_member(&mut body, "response")?;
        docs_of(response)
    }

    /// Documents grouped by `group_field`, with that field removed from each doc
    pub async fn get_group(
        &self,
        name: &str,
        group_field: &str,
        params: QueryParams,
    ) -> Result<Vec<Group>> {
        self.ensure_exists(name).await?;
        let rows = self.get_count(name, "*:*").await? as usize;
        let ngroup = params.ngroup;
        let params = params.rows(rows).group(group_field, ngroup);
        let mut body = self.raw_query(name, &params).await?;
        let mut grouped = take_member(&mut body, "grouped")?;
        let groups = grouped
            .get_mut(group_field)
            .and_then(|g| g.get_mut("groups"))
            .map(Value::take)
            .ok_or_else(|| SolrError::Unexpected(format!("no groups for {}", group_field)))?;

        let Value::Array(groups) = groups else {
            return Err(SolrError::Unexpected("groups is not a list".into()));
        };

        groups
            .into_iter()
            .map(|mut group| {
                let value = group.get_mut("groupValue").map(Value::take).unwrap_or(Value::Null);
                let doclist = group
                    .get_mut("doclist")
                    .map(Value::take)
                    .unwrap_or(Value::Null);
                let docs = docs_of(doclist)?
                    .into_iter()
                    .map(|mut doc| {
                        doc.remove(group_field);
                        doc
                    })
                    .collect();
                Ok(Group { value, docs })
            })
            .collect()
    }

    /// Flat facet list `[value, count, value, count, ...]` for `facet_field`
    pub async fn get_facet(
        &self,
        name: &str,
        facet_field: &str,
        params: QueryParams,
    ) -> Result<Vec<Value>> {
        self.ensure_exists(name).await?;
        let ngroup = self.get_count(name, "*:*").await? as usize;
        let params = params.rows(0).facet(facet_field, ngroup);
        let mut body = self.raw_query(name, &params).await?;
        let mut counts = take_member(&mut body, "facet_counts")?;
        let values = counts
            .get_mut("facet_fields")
            .and_then(|f| f.get_mut(facet_field))
            .map(Value::take)
            .ok_or_else(|| SolrError::Unexpected(format!("no facet for {}", facet_field)))?;
        match values {
            Value::Array(values) => Ok(values),
            other => Err(SolrError::Unexpected(format!(
                "facet for {} is not a list: {}",
                facet_field, other
            ))),
        }
    }

    /// Facet as ordered `(value, count)` pairs
    pub async fn facet_counts(&self, name: &str, field: &str) -> Result<Vec<(String, u64)>> {
        let flat = self.get_facet(name, field, QueryParams::default()).await?;
        Ok(pair_facets(&flat))
    }

    /// Facet values only, in facet order
    pub async fn facet_keys(&self, name: &str, field: &str) -> Result<Vec<String>> {
        Ok(self
            .facet_counts(name, field)
            .await?
            .into_iter()
            .map(|(k, _)| k)
            .collect())
    }
}

/// Zip a flat facet list into `(value, count)` pairs. A trailing value
/// without a count is dropped.
pub fn pair_facets(flat: &[Value]) -> Vec<(String, u64)> {
    flat.chunks_exact(2)
        .map(|pair| (display_value(&pair[0]), pair[1].as_u64().unwrap_or(0)))
        .collect()
}

/// Remove `_version_` from a document
pub fn clean_doc(mut doc: Map<String, Value>) -> Map<String, Value> {
    doc.remove("_version_");
    doc
}

fn take_member(body: &mut Map<String, Value>, key: &str) -> Result<Value> {
    if let Some(value) = body.remove(key) {
        return Ok(value);
    }
    let msg = body
        .get("error")
        .and_then(|e| e.get("msg"))
        .and_then(Value::as_str)
        .unwrap_or("no error message");
    Err(SolrError::Unexpected(format!("missing `{}`: {}", key, msg)))
}

fn docs_of(mut response: Value) -> Result<Vec<Map<String, Value>>> {
    let docs = response
        .get_mut("docs")
        .map(Value::take)
        .ok_or_else(|| SolrError::Unexpected("response without docs".into()))?;
    Ok(serde_json::from_value(docs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_form() {
        let form = QueryParams::default().to_form();
        assert_eq!(
            form,
            vec![
                ("q".to_string(), "*:*".to_string()),
                ("sort".to_string(), "id asc".to_string()),
                ("rows".to_string(), "10".to_string()),
                ("indent".to_string(), "off".to_string()),
            ]
        );
    }

    #[test]
    fn test_facet_form_and_override() {
        let form = QueryParams::new("AtcoCode:9*")
            .rows(0)
            .facet("TIPLOC", 42)
            .fl("TIPLOC")
            .param("rows", "5")
            .to_form();
        let get = |k: &str| {
            form.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("q"), Some("AtcoCode:9*"));
        assert_eq!(get("facet"), Some("true"));
        assert_eq!(get("facet.field"), Some("TIPLOC"));
        assert_eq!(get("facet.limit"), Some("42"));
        assert_eq!(get("fl"), Some("TIPLOC"));
        // extra params replace in place instead of duplicating
        assert_eq!(get("rows"), Some("5"));
        assert_eq!(form.iter().filter(|(k, _)| k == "rows").count(), 1);
    }

    #[test]
    fn test_group_form() {
        let form = QueryParams::default().group("UUID", 7).to_form();
        assert!(form.contains(&("group".to_string(), "true".to_string())));
        assert!(form.contains(&("group.field".to_string(), "UUID".to_string())));
        assert!(form.contains(&("group.limit".to_string(), "7".to_string())));
    }

    #[test]
    fn test_pair_facets() {
        let flat = vec![json!("EUSTON"), json!(12), json!("CREWE"), json!(3), json!("X")];
        assert_eq!(
            pair_facets(&flat),
            vec![("EUSTON".to_string(), 12), ("CREWE".to_string(), 3)]
        );
    }

    #[test]
    fn test_take_member_reports_solr_error() {
        let mut body = json!({"error": {"msg": "undefined field TIPLOX"}})
            .as_object()
            .cloned()
            .unwrap();
        let err = take_member(&mut body, "response").unwrap_err();
        assert!(err.to_string().contains("undefined field TIPLOX"));
    }

    #[test]
    fn test_clean_doc() {
        let doc = json!({"id": "1", "_version_": 99}).as_object().cloned().unwrap();
        let doc = clean_doc(doc);
        assert!(!doc.contains_key("_version_"));
        assert!(doc.contains_key("id"));
    }
}
