//! Solr field names of the NaPTAN collections and their short output names.

use serde_json::Value;

use tiploc_mapper::models::{clean_row, display_value, tiploc_from_atco, Row};

pub const STOP_POINT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("_location_", "_location_"),
    ("Status", "Status"),
    ("AtcoCode", "AtcoCode"),
    ("AdministrativeAreaRef", "AdministrativeAreaRef"),
    ("Place.NptgLocalityRef", "node"),
    ("StopAreas.StopAreaRef.Status", "StopAreaStatus"),
    ("StopAreas.StopAreaRef.value", "StopAreaRef"),
    ("Descriptor.CommonName", "Name"),
    ("Descriptor.Street", "Street"),
    ("StopClassification.StopType", "StopType"),
    ("StopClassification.OffStreet.Rail.AnnotatedRailRef.TiplocRef", "TIPLOC"),
    ("StopClassification.OffStreet.Rail.AnnotatedRailRef.CrsRef", "CRS"),
    ("StopClassification.OffStreet.Rail.AnnotatedRailRef.StationName", "StationName"),
    ("PlusbusZones.PlusbusZoneRef.Status", "PlusBusZoneStatus"),
    ("PlusbusZones.PlusbusZoneRef.value", "PlusBusZoneName"),
    ("Place.MainNptgLocalities.NptgLocalityRef.value", "PlaceLocatityRefs"),
    ("Place.Suburb", "Suburb"),
    ("Place.Town", "Town"),
    ("AlternativeDescriptors.Descriptor.Status", "AlternativeStatus"),
    ("AlternativeDescriptors.Descriptor.CommonName", "AlternativeName"),
    ("AlternativeDescriptors.Descriptor.Street", "AlternativeStreet"),
    ("StopClassification.OffStreet.Rail.AnnotatedRailRef.StationName.value", "StationStopName"),
    ("Descriptor.Indicator", "Platform"),
    ("StopClassification.OffStreet.Air.AnnotatedAirRef.IataRef", "IataRef"),
    ("StopClassification.OffStreet.Air.AnnotatedAirRef.Name", "AirportName"),
    ("StopClassification.OffStreet.Ferry.AnnotatedFerryRef.FerryRef", "FerryRef"),
    ("StopClassification.OffStreet.Ferry.AnnotatedFerryRef.Name", "FerryName"),
    ("NaptanCode", "NaptanCode"),
    ("Descriptor.Landmark", "Landmark"),
    ("Descriptor.ShortCommonName", "CommonName"),
];

pub const STOP_AREA_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("_location_", "_location_"),
    ("AdministrativeAreaRef", "AdministrativeAreaRef"),
    ("Name", "Name"),
    ("ParentStopAreaRef.Status", "StopAreaStatus"),
    ("ParentStopAreaRef.value", "ParentAtcoCode"),
    ("Status", "Status"),
    ("StopAreaCode", "AtcoCode"),
    ("StopAreaType", "StopAreaType"),
];

/// Comma-separated `fl` parameter for a field map
pub fn field_list(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(solr, _)| *solr)
        .collect::<Vec<_>>()
        .join(",")
}

/// Rename mapped fields in place order; unmapped fields keep their name
pub fn rename(doc: Row, fields: &[(&str, &str)]) -> Row {
    doc.into_iter()
        .map(|(k, v)| {
            let name = fields
                .iter()
                .find(|(solr, _)| *solr == k)
                .map(|(_, short)| short.to_string())
                .unwrap_or(k);
            (name, v)
        })
        .collect()
}

fn code_tiploc(row: &Row, field: &str) -> String {
    row.get(field)
        .map(|v| tiploc_from_atco(&display_value(v)))
        .unwrap_or_default()
}

/// A renamed StopPoint. The TIPLOC always comes from the ATCO code.
pub fn stop_point_row(doc: Row) -> Row {
    let mut row = rename(doc, STOP_POINT_FIELDS);
    let tiploc = code_tiploc(&row, "AtcoCode");
    row.insert("TIPLOC".into(), Value::String(tiploc));
    row.insert("type".into(), "Point".into());
    clean_row(row)
}

/// A renamed StopArea, keyed by its parent area's TIPLOC where it has one
pub fn stop_area_row(doc: Row) -> Row {
    let mut row = rename(doc, STOP_AREA_FIELDS);
    let mut tiploc = code_tiploc(&row, "ParentAtcoCode");
    if tiploc.is_empty() {
        tiploc = code_tiploc(&row, "AtcoCode");
    }
    row.insert("TIPLOC".into(), Value::String(tiploc));
    row.insert("type".into(), "Area".into());
    clean_row(row)
}
