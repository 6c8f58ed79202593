//! Record label lookup in collected storage terms.

use crate::model::record::DataGroup;

/// Collect term id carrying the human readable record label.
pub const RECORD_LABEL_STORAGE_TERM: &str = "recordLabelStorageTerm";

/// Label used when collected terms carry no record label.
pub const DEFAULT_RECORD_LABEL: &str = "LabelNotPresentInStorageTerms";

/// Returns the record label from `storage/collectedDataTerm` entries.
///
/// Falls back to [`DEFAULT_RECORD_LABEL`] when the `storage` group, the
/// label term, or its value is missing.
pub fn record_label(collected_terms: &DataGroup) -> String {
    collected_terms
        .first_group("storage")
        .and_then(|storage| {
            storage.groups_with_name("collectedDataTerm").find(|term| {
                term.first_atomic_value("collectTermId") == Some(RECORD_LABEL_STORAGE_TERM)
            })
        })
        .and_then(|term| term.first_atomic_value("collectTermValue"))
        .unwrap_or(DEFAULT_RECORD_LABEL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{record_label, DEFAULT_RECORD_LABEL, RECORD_LABEL_STORAGE_TERM};
    use crate::model::record::DataGroup;

    fn term(id: &str, value: &str) -> DataGroup {
        DataGroup::new("collectedDataTerm")
            .with_atomic("collectTermId", id)
            .with_atomic("collectTermValue", value)
    }

    #[test]
    fn picks_record_label_term_among_other_terms() {
        let terms = DataGroup::new("collectedData").with_child(
            DataGroup::new("storage")
                .with_child(term("placeNameStorageTerm", "not this"))
                .with_child(term(RECORD_LABEL_STORAGE_TERM, "Uppsala åäö")),
        );
        assert_eq!(record_label(&terms), "Uppsala åäö");
    }

    #[test]
    fn falls_back_to_default_label() {
        let no_storage = DataGroup::new("collectedData");
        assert_eq!(record_label(&no_storage), DEFAULT_RECORD_LABEL);

        let no_label = DataGroup::new("collectedData")
            .with_child(DataGroup::new("storage").with_child(term("other", "x")));
        assert_eq!(record_label(&no_label), DEFAULT_RECORD_LABEL);
    }
}
