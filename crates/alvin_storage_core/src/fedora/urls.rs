//! Fedora REST URL and label encoding.
//!
//! All functions are pure: they take the configured base URL and plain
//! strings and return the request URL. Query values are encoded as
//! `application/x-www-form-urlencoded`.

use url::form_urlencoded;

/// Namespace of place pids.
pub const PLACE_NAMESPACE: &str = "alvin-place";
/// Datastream holding the record payload.
pub const METADATA_DATASTREAM: &str = "METADATA";
const LOG_MESSAGE: &str = "coraWritten";
const PLACE_MODEL: &str = "info:fedora/alvin-model:place";
const HAS_MODEL_PREDICATE: &str = "info:fedora/fedora-system:def/model#hasModel";
const MAX_SEARCH_RESULTS: u32 = 10000;

/// Encodes one query value.
pub fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Encodes a record label for use as `label`/`dsLabel`.
pub fn encode_label(label: &str) -> String {
    encode_query_value(label)
}

/// Search query matching one active object.
pub fn active_pid_query(id: &str) -> String {
    format!("state=A pid={id}")
}

/// Search query matching every active object in `namespace`.
pub fn active_namespace_query(namespace: &str) -> String {
    format!("state=A pid~{namespace}:*")
}

pub fn search_url(base_url: &str, query: &str) -> String {
    format!(
        "{}/objects?pid=true&maxResults={MAX_SEARCH_RESULTS}&resultFormat=xml&query={}",
        objects_root(base_url),
        encode_query_value(query)
    )
}

pub fn metadata_content_url(base_url: &str, id: &str) -> String {
    format!(
        "{}/objects/{id}/datastreams/{METADATA_DATASTREAM}/content",
        objects_root(base_url)
    )
}

pub fn create_object_url(base_url: &str, id: &str, label: &str) -> String {
    format!(
        "{}/objects/{id}?namespace={PLACE_NAMESPACE}&logMessage={LOG_MESSAGE}&label={}",
        objects_root(base_url),
        encode_label(label)
    )
}

pub fn create_relation_url(base_url: &str, id: &str) -> String {
    format!(
        "{}/objects/{id}/relationships/new?object={}&predicate={}",
        objects_root(base_url),
        encode_query_value(PLACE_MODEL),
        encode_query_value(HAS_MODEL_PREDICATE)
    )
}

pub fn create_datastream_url(base_url: &str, id: &str, label: &str) -> String {
    format!(
        "{}/objects/{id}/datastreams/{METADATA_DATASTREAM}?controlGroup=M\
         &logMessage={LOG_MESSAGE}&dsLabel={}&checksumType=SHA-512&mimeType=text/xml",
        objects_root(base_url),
        encode_label(label)
    )
}

pub fn update_datastream_url(base_url: &str, id: &str, label: &str) -> String {
    format!(
        "{}/objects/{id}/datastreams/{METADATA_DATASTREAM}?format=?xml&controlGroup=M\
         &logMessage={LOG_MESSAGE}&checksumType=SHA-512&dsLabel={}",
        objects_root(base_url),
        encode_label(label)
    )
}

pub fn soft_delete_url(base_url: &str, id: &str) -> String {
    format!("{}/objects/{id}?state=D", objects_root(base_url))
}

fn objects_root(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
