//! `alvin_seam_user` rows to `user` records.

use super::{ConvertError, ConvertResult, RowToRecordConverter};
use crate::db::SqlRow;
use crate::model::record::{DataAtomic, DataGroup};
use rusqlite::types::Value;

const USER_RECORD_TYPE: &str = "coraUser";
const DATA_DIVIDER: &str = "alvin";
const ACTIVE_STATUS: &str = "active";

#[derive(Debug, Clone, Copy, Default)]
pub struct UserFromRowConverter;

impl RowToRecordConverter for UserFromRowConverter {
    fn from_row(&self, row: &SqlRow) -> ConvertResult<DataGroup> {
        let id = required_column(row, "id")?;
        let username = required_column(row, "username")?;
        let user_id = match optional_column(row, "domain") {
            Some(domain) => format!("{username}@{domain}"),
            None => username,
        };

        let record_info = DataGroup::new("recordInfo")
            .with_atomic("id", id)
            .with_child(DataGroup::link("type", "recordType", USER_RECORD_TYPE))
            .with_child(DataGroup::link("dataDivider", "system", DATA_DIVIDER));

        let mut user = DataGroup::new("user")
            .with_attribute("type", USER_RECORD_TYPE)
            .with_child(record_info)
            .with_atomic("userId", user_id);
        if let Some(first_name) = optional_column(row, "firstname") {
            user.add_child(DataAtomic::new("userFirstname", first_name));
        }
        if let Some(last_name) = optional_column(row, "lastname") {
            user.add_child(DataAtomic::new("userLastname", last_name));
        }
        Ok(user.with_atomic("activeStatus", ACTIVE_STATUS))
    }
}

fn required_column(row: &SqlRow, column: &str) -> ConvertResult<String> {
    optional_column(row, column)
        .ok_or_else(|| ConvertError::InvalidRow(format!("missing value for column `{column}`")))
}

/// Column value as text; `NULL`, blank and binary values count as absent.
fn optional_column(row: &SqlRow, column: &str) -> Option<String> {
    let text = match row.get(column)? {
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(value) => value.trim().to_string(),
        Value::Null | Value::Blob(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::UserFromRowConverter;
    use crate::convert::{ConvertError, RowToRecordConverter};
    use crate::db::SqlRow;
    use rusqlite::types::Value;

    fn row(entries: &[(&str, Value)]) -> SqlRow {
        entries
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn converts_a_complete_row() {
        let user = UserFromRowConverter
            .from_row(&row(&[
                ("id", Value::Integer(52)),
                ("username", Value::Text("johnd".to_string())),
                ("firstname", Value::Text("John".to_string())),
                ("lastname", Value::Text("Doe".to_string())),
                ("domain", Value::Text("uu".to_string())),
            ]))
            .unwrap();

        assert_eq!(user.name_in_data, "user");
        assert_eq!(user.attribute("type"), Some("coraUser"));
        let info = user.first_group("recordInfo").unwrap();
        assert_eq!(info.first_atomic_value("id"), Some("52"));
        assert_eq!(
            info.first_group("type")
                .and_then(|link| link.first_atomic_value("linkedRecordId")),
            Some("coraUser")
        );
        assert_eq!(
            info.first_group("dataDivider")
                .and_then(|link| link.first_atomic_value("linkedRecordId")),
            Some("alvin")
        );
        assert_eq!(user.first_atomic_value("userId"), Some("johnd@uu"));
        assert_eq!(user.first_atomic_value("userFirstname"), Some("John"));
        assert_eq!(user.first_atomic_value("userLastname"), Some("Doe"));
        assert_eq!(user.first_atomic_value("activeStatus"), Some("active"));
    }

    #[test]
    fn missing_optional_columns_are_omitted() {
        let user = UserFromRowConverter
            .from_row(&row(&[
                ("id", Value::Integer(7)),
                ("username", Value::Text("guest".to_string())),
                ("firstname", Value::Null),
                ("domain", Value::Text(String::new())),
            ]))
            .unwrap();
        assert_eq!(user.first_atomic_value("userId"), Some("guest"));
        assert!(!user.contains_child_with_name("userFirstname"));
        assert!(!user.contains_child_with_name("userLastname"));
    }

    #[test]
    fn row_without_username_is_invalid() {
        let err = UserFromRowConverter
            .from_row(&row(&[("id", Value::Integer(7))]))
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRow(_)));
        assert!(err.to_string().contains("username"));
    }
}
