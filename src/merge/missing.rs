//! Solr lookups behind the missing-TIPLOC report.

use crate::models::{display_value, Row};
use crate::solr::{clean_doc, QueryParams, Result, SolrClient};

/// Placeholder headcode for TIPLOCs with no scheduled service found
pub const NO_TRANSPORT: &str = "____";

/// Paths consulted per TIPLOC when looking for a headcode
const PATH_SAMPLE: usize = 4;

/// Codes per `OR` query, kept well below Solr's boolean clause limit
const CODES_PER_QUERY: usize = 256;

fn field_text(doc: &Row, field: &str) -> Option<String> {
    doc.get(field)
        .map(display_value)
        .filter(|text| !text.is_empty())
}

fn any_of(field: &str, values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("{}:{}", field, v))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Headcode of a service calling at `tiploc`, or [`NO_TRANSPORT`].
///
/// The first few path UUIDs for the TIPLOC are looked up in the schedule
/// collection and the first headcode found wins.
pub async fn transport_for(
    client: &SolrClient,
    path: &str,
    schedule: &str,
    tiploc: &str,
) -> Result<String> {
    let params = QueryParams::new(&format!("TIPLOC:{}", tiploc)).fl("UUID");
    let uuids: Vec<String> = client
        .get_query(path, params, None)
        .await?
        .iter()
        .filter_map(|doc| field_text(doc, "UUID"))
        .take(PATH_SAMPLE)
        .collect();
    if uuids.is_empty() {
        return Ok(NO_TRANSPORT.to_string());
    }

    let params = QueryParams::new(&any_of("UUID", &uuids)).fl("Headcode");
    let headcode = client
        .get_query(schedule, params, Some(PATH_SAMPLE))
        .await?
        .iter()
        .find_map(|doc| field_text(doc, "Headcode"));
    Ok(headcode.unwrap_or_else(|| NO_TRANSPORT.to_string()))
}

/// Reference documents for `tiploc_codes`, without `_version_`
pub async fn fetch_reference_docs(
    client: &SolrClient,
    reference: &str,
    tiploc_codes: &[String],
) -> Result<Vec<Row>> {
    let mut docs = Vec::new();
    for chunk in tiploc_codes.chunks(CODES_PER_QUERY) {
        let params = QueryParams::new(&any_of("TIPLOC", chunk));
        docs.extend(
            client
                .get_query(reference, params, None)
                .await?
                .into_iter()
                .map(clean_doc),
        );
    }
    Ok(docs)
}

/// Name field of reference documents as `(TIPLOC, name)` pairs
pub fn reference_names(docs: &[Row], field: &str) -> Vec<(String, String)> {
    docs.iter()
        .filter_map(|doc| Some((field_text(doc, "TIPLOC")?, field_text(doc, field)?)))
        .collect()
}
