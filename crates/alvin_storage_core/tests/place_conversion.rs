use alvin_storage_core::convert::{
    PlaceFromFedoraConverter, PlaceToFedoraConverter, PLACE_STYLESHEET,
};
use alvin_storage_core::http::HttpResult;
use alvin_storage_core::xml::ParseError;
use alvin_storage_core::{
    ConvertError, DataGroup, FedoraToRecordConverter, HttpClient, HttpRequest, HttpResponse,
    RecordToFedoraConverter, XPathDocument,
};

const LUBECK: &str = include_str!("fixtures/place_lubeck.xml");
const WITH_DOCTYPE: &str = include_str!("fixtures/place_with_doctype.xml");
const BASE_URL: &str = "http://alvin-cora-fedora:8088/fedora";

/// Serves one canned document for every request.
struct CurrentDocument(&'static str);

impl HttpClient for CurrentDocument {
    fn send(&self, _request: &HttpRequest) -> HttpResult<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: self.0.to_string(),
        })
    }
}

fn place_record(id: &str, name: &str) -> DataGroup {
    DataGroup::new("authority")
        .with_attribute("type", "place")
        .with_child(
            DataGroup::new("recordInfo")
                .with_atomic("id", id)
                .with_child(DataGroup::link("createdBy", "user", "12345"))
                .with_atomic("tsCreated", "2017-10-01T12:30:00.123000Z"),
        )
        .with_child(
            DataGroup::new("name")
                .with_attribute("type", "authorized")
                .with_child(
                    DataGroup::new("namePart")
                        .with_attribute("type", "defaultName")
                        .with_atomic("value", name),
                ),
        )
}

fn default_name(record: &DataGroup) -> Option<&str> {
    record
        .groups_with_name_and_attribute("name", "type", "authorized")
        .next()
        .and_then(|name| name.first_group("namePart"))
        .and_then(|part| part.first_atomic_value("value"))
}

#[test]
fn new_place_document_reads_back_as_the_same_place() {
    let http = CurrentDocument("");
    let converter = PlaceToFedoraConverter::new(&http, BASE_URL);
    let record = place_record("alvin-place:1", "Västerås");

    let xml = converter.to_new_xml(&record).unwrap();
    let read_back = PLACE_STYLESHEET.transform(&xml).unwrap();

    let info = read_back.first_group("recordInfo").unwrap();
    assert_eq!(info.first_atomic_value("id"), Some("alvin-place:1"));
    assert_eq!(
        info.first_group("createdBy")
            .and_then(|by| by.first_atomic_value("linkedRecordId")),
        Some("12345")
    );
    assert_eq!(
        info.first_atomic_value("tsCreated"),
        Some("2017-10-01T12:30:00.123000Z")
    );
    let updated: Vec<_> = info.groups_with_name("updated").collect();
    assert_eq!(updated.len(), 1);
    assert_eq!(
        updated[0].first_atomic_value("tsUpdated"),
        Some("2017-10-01T12:30:00.123000Z")
    );
    assert_eq!(default_name(&read_back), Some("Västerås"));
    assert!(!read_back.contains_child_with_name("coordinates"));
    assert!(!read_back.contains_child_with_name("identifier"));
}

#[test]
fn update_document_keeps_everything_but_the_default_name() {
    let http = CurrentDocument(LUBECK);
    let converter = PlaceToFedoraConverter::new(&http, BASE_URL);

    let xml = converter
        .to_xml(&place_record("alvin-place:22", "Lübeck an der Trave"))
        .unwrap();

    let document = XPathDocument::parse(&xml).unwrap();
    assert_eq!(
        document.string_at("/place/defaultPlaceName/name").unwrap(),
        "Lübeck an der Trave"
    );
    assert_eq!(document.string_at("/place/latitude").unwrap(), "53.866667");
    assert_eq!(
        document
            .string_at("/place/recordInfo/created/user/userId")
            .unwrap(),
        "12345"
    );

    let read_back = PlaceFromFedoraConverter.from_xml(&xml).unwrap();
    assert_eq!(default_name(&read_back), Some("Lübeck an der Trave"));
    assert_eq!(read_back.first_atomic_value("country"), Some("de"));
}

#[test]
fn fixture_place_converts_with_indented_source() {
    let record = PlaceFromFedoraConverter.from_xml(LUBECK).unwrap();

    assert_eq!(default_name(&record), Some("Lübeck"));
    assert_eq!(
        record.first_atomic_value("historicCountry"),
        Some("holy_roman_empire")
    );
    let alternative = record
        .groups_with_name_and_attribute("name", "type", "alternative")
        .next()
        .unwrap();
    assert_eq!(alternative.first_atomic_value("language"), Some("la"));
    let identifier = record.first_group("identifier").unwrap();
    assert_eq!(identifier.first_atomic_value("identifierValue"), Some("Lübeck 1"));
}

#[test]
fn documents_with_external_dtd_are_refused() {
    let err = PlaceFromFedoraConverter.from_xml(WITH_DOCTYPE).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Parse(ParseError::ExternalReference("DTD"))
    ));

    let http = CurrentDocument(WITH_DOCTYPE);
    let converter = PlaceToFedoraConverter::new(&http, BASE_URL);
    let err = converter
        .to_xml(&place_record("alvin-place:66", "Upsala"))
        .unwrap_err();
    assert!(err.to_string().contains("external DTD resolution is disabled"));
}
