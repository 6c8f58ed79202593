//! Place records in the Fedora `METADATA` datastream.
//!
//! Forward conversion is the [`PLACE_STYLESHEET`] rule table. Reverse
//! conversion edits either the current repository document (update) or the
//! bundled blank template (create).

use super::{ConvertError, ConvertResult, FedoraToRecordConverter, RecordToFedoraConverter};
use crate::fedora::urls;
use crate::http::{HttpClient, HttpRequest};
use crate::model::record::DataGroup;
use crate::xml::{Presence, Rule, Stylesheet, ValueTransform, XPathDocument};
use log::debug;

const NEW_PLACE_TEMPLATE: &str = include_str!("../../resources/place/template_place.xml");

const PID_PATH: &str = "/place/pid";
const DEFAULT_NAME_PATH: &str = "/place/defaultPlaceName/name";
const CREATED_BY_PATH: &str = "/place/recordInfo/created/user/userId";
const CREATED_DATE_PATH: &str = "/place/recordInfo/created/date";
const REPOSITORY_TIMEZONE_SUFFIX: &str = " UTC";

const USER_LINK_TYPE: Rule = Rule::Constant {
    name: "linkedRecordType",
    value: "user",
};

const RECORD_INFO_RULES: &[Rule] = &[
    Rule::Group {
        name: "type",
        attributes: &[],
        presence: Presence::AllChildren,
        children: &[
            Rule::Constant {
                name: "linkedRecordType",
                value: "recordType",
            },
            Rule::Constant {
                name: "linkedRecordId",
                value: "place",
            },
        ],
    },
    Rule::Group {
        name: "dataDivider",
        attributes: &[],
        presence: Presence::AllChildren,
        children: &[
            Rule::Constant {
                name: "linkedRecordType",
                value: "system",
            },
            Rule::Constant {
                name: "linkedRecordId",
                value: "alvin",
            },
        ],
    },
    Rule::Atomic {
        name: "id",
        select: "/place/pid",
        transform: ValueTransform::Text,
    },
    Rule::Group {
        name: "createdBy",
        attributes: &[],
        presence: Presence::AllChildren,
        children: &[
            USER_LINK_TYPE,
            Rule::Atomic {
                name: "linkedRecordId",
                select: "/place/recordInfo/created/user/userId",
                transform: ValueTransform::Text,
            },
        ],
    },
    Rule::Atomic {
        name: "tsCreated",
        select: "/place/recordInfo/created/date",
        transform: ValueTransform::Timestamp,
    },
    Rule::Repeat {
        name: "updated",
        attributes: &[],
        for_each: "/place/recordInfo/updated/userAction",
        fallback: Some("/place/recordInfo/created"),
        children: &[
            Rule::Group {
                name: "updatedBy",
                attributes: &[],
                presence: Presence::AllChildren,
                children: &[
                    USER_LINK_TYPE,
                    Rule::Atomic {
                        name: "linkedRecordId",
                        select: "user/userId",
                        transform: ValueTransform::Text,
                    },
                ],
            },
            Rule::Atomic {
                name: "tsUpdated",
                select: "date",
                transform: ValueTransform::Timestamp,
            },
        ],
    },
];

const DEFAULT_NAME_PART: Rule = Rule::Group {
    name: "namePart",
    attributes: &[("type", "defaultName")],
    presence: Presence::AnyChild,
    children: &[Rule::Atomic {
        name: "value",
        select: "name",
        transform: ValueTransform::Text,
    }],
};

const PLACE_RULES: &[Rule] = &[
    Rule::Group {
        name: "recordInfo",
        attributes: &[],
        presence: Presence::AnyChild,
        children: RECORD_INFO_RULES,
    },
    Rule::Group {
        name: "name",
        attributes: &[("type", "authorized")],
        presence: Presence::AnyChild,
        children: &[Rule::Within {
            select: "/place/defaultPlaceName",
            rules: &[DEFAULT_NAME_PART],
        }],
    },
    Rule::Repeat {
        name: "name",
        attributes: &[("type", "alternative")],
        for_each: "/place/placeNameForms/entry/placeName",
        fallback: None,
        children: &[
            Rule::Atomic {
                name: "language",
                select: "languageCode",
                transform: ValueTransform::Text,
            },
            DEFAULT_NAME_PART,
        ],
    },
    Rule::Group {
        name: "coordinates",
        attributes: &[],
        presence: Presence::AllChildren,
        children: &[
            Rule::Atomic {
                name: "latitude",
                select: "/place/latitude",
                transform: ValueTransform::Text,
            },
            Rule::Atomic {
                name: "longitude",
                select: "/place/longitude",
                transform: ValueTransform::Text,
            },
        ],
    },
    Rule::Atomic {
        name: "country",
        select: "/place/country/alpha2Code",
        transform: ValueTransform::Token,
    },
    Rule::Atomic {
        name: "historicCountry",
        select: "/place/historicCountry/code",
        transform: ValueTransform::Token,
    },
    Rule::Repeat {
        name: "identifier",
        attributes: &[],
        for_each: "/place/localIdentifiers/localIdentifier",
        fallback: None,
        children: &[
            Rule::Atomic {
                name: "identifierType",
                select: "type/code",
                transform: ValueTransform::Text,
            },
            Rule::Atomic {
                name: "identifierValue",
                select: "text",
                transform: ValueTransform::Text,
            },
        ],
    },
];

/// Repository place XML to `authority` record.
pub const PLACE_STYLESHEET: Stylesheet = Stylesheet {
    root_name: "authority",
    root_attributes: &[("type", "place")],
    source_root: "/place",
    rules: PLACE_RULES,
};

/// Forward conversion through [`PLACE_STYLESHEET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceFromFedoraConverter;

impl FedoraToRecordConverter for PlaceFromFedoraConverter {
    fn from_xml(&self, xml: &str) -> ConvertResult<DataGroup> {
        Ok(PLACE_STYLESHEET.transform(xml)?)
    }
}

/// Reverse conversion for place records.
///
/// [`RecordToFedoraConverter::to_xml`] fetches the current `METADATA`
/// document and only replaces the default name in it.
pub struct PlaceToFedoraConverter<'a> {
    http: &'a dyn HttpClient,
    base_url: &'a str,
}

impl<'a> PlaceToFedoraConverter<'a> {
    pub fn new(http: &'a dyn HttpClient, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    fn fetch_current(&self, id: &str) -> ConvertResult<String> {
        let url = urls::metadata_content_url(self.base_url, id);
        let response = self.http.send(&HttpRequest::get(url.as_str()))?;
        if response.status != 200 {
            return Err(ConvertError::UnexpectedStatus {
                url,
                status: response.status,
            });
        }
        Ok(response.body)
    }
}

impl RecordToFedoraConverter for PlaceToFedoraConverter<'_> {
    fn to_xml(&self, record: &DataGroup) -> ConvertResult<String> {
        let id = record_id(record)?;
        let current = self.fetch_current(id)?;
        let mut document = XPathDocument::parse(&current)?;
        document.set_text_at(DEFAULT_NAME_PATH, default_name(record)?)?;
        debug!("event=place_to_xml module=convert status=ok mode=existing");
        Ok(document.to_xml_string()?)
    }

    fn to_new_xml(&self, record: &DataGroup) -> ConvertResult<String> {
        let mut document = XPathDocument::parse(NEW_PLACE_TEMPLATE)?;
        document.set_text_at(PID_PATH, record_id(record)?)?;
        document.set_text_at(DEFAULT_NAME_PATH, default_name(record)?)?;
        document.set_text_at(CREATED_BY_PATH, created_by(record)?)?;
        let created = format!("{}{REPOSITORY_TIMEZONE_SUFFIX}", ts_created(record)?);
        document.set_text_at(CREATED_DATE_PATH, &created)?;
        debug!("event=place_to_xml module=convert status=ok mode=new");
        Ok(document.to_xml_string()?)
    }
}

fn record_info(record: &DataGroup) -> ConvertResult<&DataGroup> {
    record
        .first_group("recordInfo")
        .ok_or(ConvertError::MissingElement("recordInfo"))
}

fn record_id(record: &DataGroup) -> ConvertResult<&str> {
    record_info(record)?
        .first_atomic_value("id")
        .ok_or(ConvertError::MissingElement("recordInfo/id"))
}

fn created_by(record: &DataGroup) -> ConvertResult<&str> {
    record_info(record)?
        .first_group("createdBy")
        .and_then(|link| link.first_atomic_value("linkedRecordId"))
        .ok_or(ConvertError::MissingElement("recordInfo/createdBy/linkedRecordId"))
}

fn ts_created(record: &DataGroup) -> ConvertResult<&str> {
    record_info(record)?
        .first_atomic_value("tsCreated")
        .ok_or(ConvertError::MissingElement("recordInfo/tsCreated"))
}

fn default_name(record: &DataGroup) -> ConvertResult<&str> {
    record
        .groups_with_name_and_attribute("name", "type", "authorized")
        .flat_map(|name| name.groups_with_name_and_attribute("namePart", "type", "defaultName"))
        .find_map(|part| part.first_atomic_value("value"))
        .ok_or(ConvertError::MissingElement("name[authorized]/namePart[defaultName]/value"))
}
