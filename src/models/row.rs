//! Line-delimited JSON rows written by the extraction binaries.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A flat JSON object row
pub type Row = Map<String, Value>;

/// Drop empty-string and null values. Lists are always kept.
pub fn clean_row(row: Row) -> Row {
    row.into_iter()
        .filter(|(_, v)| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .collect()
}

/// Render a JSON value as plain text (strings unquoted, null empty)
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// A NaPTAN rail ATCO code is `9100` followed by the TIPLOC
pub fn tiploc_from_atco(atco: &str) -> String {
    atco.chars().skip(4).collect()
}

/// Accept a string, number or list (first item) and treat empty as missing
fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => items.first().map(display_value),
        Some(other) => Some(display_value(&other)),
    };
    Ok(text.filter(|t| !t.is_empty()))
}

/// One row of `NaPTAN-All.jsonl`
#[derive(Debug, Clone, Deserialize)]
pub struct NaptanRecord {
    #[serde(rename = "TIPLOC", default, deserialize_with = "opt_text")]
    pub tiploc: Option<String>,
    #[serde(rename = "AtcoCode", default, deserialize_with = "opt_text")]
    pub atco_code: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(rename = "_location_", default, deserialize_with = "opt_text")]
    pub location: Option<String>,
    /// `Point` or `Area`
    #[serde(rename = "type", default, deserialize_with = "opt_text")]
    pub record_type: Option<String>,
    #[serde(flatten)]
    pub extra: Row,
}

/// One row of `OSM-All.jsonl`
#[derive(Debug, Clone, Deserialize)]
pub struct OsmRecord {
    #[serde(rename = "TIPLOC", default, deserialize_with = "opt_text")]
    pub tiploc: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(rename = "_location_", default, deserialize_with = "opt_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub layer: Option<String>,
    #[serde(flatten)]
    pub extra: Row,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_row_keeps_lists() {
        let row = json!({"a": "", "b": "x", "c": [], "d": null, "e": 0})
            .as_object()
            .cloned()
            .unwrap();
        let cleaned = clean_row(row);
        let keys: Vec<&str> = cleaned.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c", "e"]);
    }

    #[test]
    fn test_tiploc_from_atco() {
        assert_eq!(tiploc_from_atco("9100EUSTON"), "EUSTON");
        assert_eq!(tiploc_from_atco("910"), "");
    }

    #[test]
    fn test_naptan_record_tolerates_shapes() {
        let record: NaptanRecord = serde_json::from_value(json!({
            "TIPLOC": "CREWE",
            "AtcoCode": "9100CREWE",
            "Name": ["Crewe Rail Station", "Crewe"],
            "_location_": "53.08961,-2.43318",
            "type": "Point",
            "Street": "Nantwich Road"
        }))
        .unwrap();
        assert_eq!(record.tiploc.as_deref(), Some("CREWE"));
        assert_eq!(record.name.as_deref(), Some("Crewe Rail Station"));
        assert_eq!(record.extra.get("Street"), Some(&json!("Nantwich Road")));
    }

    #[test]
    fn test_osm_record_missing_tiploc() {
        let record: OsmRecord = serde_json::from_value(json!({
            "name": "Signal box",
            "TIPLOC": "",
            "_location_": "52.1,-1.2"
        }))
        .unwrap();
        assert_eq!(record.tiploc, None);
        assert_eq!(record.layer, None);
    }
}
