// src/infrastructure/backup/json_format.rs
//
// Proprietary JSON backup: `{version, exportedAt, animes: [...]}`.
// Bare arrays of records are accepted on import.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ImportRecord, LibraryEntry};
use crate::error::{AppError, AppResult};

/// Envelope version written by this crate
pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupEnvelope {
    version: u32,
    exported_at: DateTime<Utc>,
    animes: Vec<ImportRecord>,
}

/// Serialize entries into the versioned envelope.
/// `lastUpdated` and `synopsis` are left out; both are regenerated.
pub fn serialize_json(entries: &[LibraryEntry], exported_at: DateTime<Utc>) -> AppResult<String> {
    let envelope = BackupEnvelope {
        version: BACKUP_VERSION,
        exported_at,
        animes: entries.iter().map(ImportRecord::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse a backup document into candidate records.
///
/// Records without id, title or status are dropped. Optional fields of the
/// wrong type read as absent and the record is kept. Only a document that
/// is not JSON at all, or JSON of the wrong shape, is an error.
pub fn parse_json(document: &str) -> AppResult<Vec<ImportRecord>> {
    let value: Value = serde_json::from_str(document)
        .map_err(|e| AppError::InvalidBackupFormat(format!("not valid JSON: {}", e)))?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut envelope) => {
            if let Some(version) = envelope.get("version").and_then(Value::as_u64) {
                if version > u64::from(BACKUP_VERSION) {
                    warn!("Backup version {} is newer than {}, reading anyway", version, BACKUP_VERSION);
                }
            }
            match envelope.remove("animes") {
                Some(Value::Array(records)) => records,
                _ => {
                    return Err(AppError::InvalidBackupFormat(
                        "missing \"animes\" array".to_string(),
                    ))
                }
            }
        }
        _ => {
            return Err(AppError::InvalidBackupFormat(
                "expected an array or a backup envelope".to_string(),
            ))
        }
    };

    let total = records.len();
    let valid: Vec<ImportRecord> = records
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<ImportRecord>(raw).ok())
        .filter(ImportRecord::is_importable)
        .collect();

    if valid.len() < total {
        debug!("Dropped {} invalid backup records", total - valid.len());
    }
    Ok(valid)
}
