//! Key/value settings and their upsert gateway operation
//!
//! Settings are a generic key/value store where exactly one of the value
//! columns is meaningful per key. Row uniqueness per key is maintained by
//! the query-then-upsert sequence, not by a database constraint.

use super::Store;
use crate::error::{ChargelogError, Result};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingKey {
    /// Default cost of one kWh in pence (integer value)
    DefaultPencePerKwh,

    /// Default charger output in kilowatts (string value)
    DefaultKilowattRate,

    /// Vehicle preselected for new sessions (long value)
    ActiveVehicle,
}

impl SettingKey {
    /// Stable string form stored in the database
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::DefaultPencePerKwh => "default_pence_per_kwh",
            SettingKey::DefaultKilowattRate => "default_kilowatt_rate",
            SettingKey::ActiveVehicle => "active_vehicle",
        }
    }
}

impl FromStr for SettingKey {
    type Err = ChargelogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default_pence_per_kwh" => Ok(SettingKey::DefaultPencePerKwh),
            "default_kilowatt_rate" => Ok(SettingKey::DefaultKilowattRate),
            "active_vehicle" => Ok(SettingKey::ActiveVehicle),
            other => Err(ChargelogError::validation(
                "setting.key",
                &format!("Unknown setting key: {}", other),
            )),
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value written by an upsert; the variant selects the column
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Str(String),
    Int(i64),
    Long(i64),
}

/// One stored setting row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    pub key: SettingKey,
    pub str_value: Option<String>,
    pub int_value: Option<i64>,
    pub long_value: Option<i64>,
}

fn row_to_setting(row: &rusqlite::Row<'_>) -> rusqlite::Result<Setting> {
    let key_raw: String = row.get("key")?;
    let key = SettingKey::from_str(&key_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(Setting {
        id: row.get("id")?,
        key,
        str_value: row.get("str_value")?,
        int_value: row.get("int_value")?,
        long_value: row.get("long_value")?,
    })
}

impl Store {
    /// Fetch a setting row by key
    pub async fn setting(&self, key: SettingKey) -> Result<Option<Setting>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached("SELECT * FROM settings WHERE key = ?1")?;
            Ok(stmt.query_row([key.as_str()], row_to_setting).optional()?)
        })
        .await
    }

    /// Upsert a setting: insert when the key is absent, otherwise clear all
    /// value columns and write back only the relevant one
    ///
    /// Read-then-write with no enclosing transaction; concurrent updates to
    /// the same key can race.
    pub async fn update_setting(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        self.call(move |conn| {
            let existing: Option<i64> = conn
                .prepare_cached("SELECT id FROM settings WHERE key = ?1")?
                .query_row([key.as_str()], |row| row.get(0))
                .optional()?;

            match existing {
                None => {
                    let (str_value, int_value, long_value) = columns_for(&value);
                    conn.execute(
                        "INSERT INTO settings (key, str_value, int_value, long_value)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![key.as_str(), str_value, int_value, long_value],
                    )?;
                }
                Some(id) => {
                    conn.execute(
                        "UPDATE settings
                         SET str_value = NULL, int_value = NULL, long_value = NULL
                         WHERE id = ?1",
                        [id],
                    )?;
                    match &value {
                        SettingValue::Str(s) => conn.execute(
                            "UPDATE settings SET str_value = ?1 WHERE id = ?2",
                            params![s, id],
                        )?,
                        SettingValue::Int(i) => conn.execute(
                            "UPDATE settings SET int_value = ?1 WHERE id = ?2",
                            params![i, id],
                        )?,
                        SettingValue::Long(l) => conn.execute(
                            "UPDATE settings SET long_value = ?1 WHERE id = ?2",
                            params![l, id],
                        )?,
                    };
                }
            }
            Ok(())
        })
        .await?;
        self.logger().debug(&format!("Updated setting {}", key));
        Ok(())
    }

    /// Delete a setting row, returning the number of rows removed
    pub async fn delete_setting(&self, key: SettingKey) -> Result<usize> {
        self.call(move |conn| {
            Ok(conn.execute("DELETE FROM settings WHERE key = ?1", [key.as_str()])?)
        })
        .await
    }
}

fn columns_for(value: &SettingValue) -> (Option<String>, Option<i64>, Option<i64>) {
    match value {
        SettingValue::Str(s) => (Some(s.clone()), None, None),
        SettingValue::Int(i) => (None, Some(*i), None),
        SettingValue::Long(l) => (None, None, Some(*l)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip() {
        for key in [
            SettingKey::DefaultPencePerKwh,
            SettingKey::DefaultKilowattRate,
            SettingKey::ActiveVehicle,
        ] {
            assert_eq!(SettingKey::from_str(key.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = SettingKey::from_str("theme_color").unwrap_err();
        assert!(matches!(err, ChargelogError::Validation { .. }));
    }
}
