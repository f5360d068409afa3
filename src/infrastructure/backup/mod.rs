// src/infrastructure/backup/mod.rs
//
// Backup Codec
//
// RULES:
// - Parsing produces candidate records only, never LibraryEntry values
// - File-level problems fail before anything is written
// - Export and import formats are chosen by file extension

pub mod csv_format;
pub mod foreign_xml;
pub mod json_format;

use std::path::Path;

use chrono::Utc;
use log::info;

use crate::domain::{ImportRecord, LibraryEntry};
use crate::error::{AppError, AppResult};

pub use csv_format::serialize_csv;
pub use foreign_xml::parse_foreign_xml;
pub use json_format::{parse_json, serialize_json, BACKUP_VERSION};

/// Supported backup file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupFormat {
    /// Proprietary envelope, import and export
    Json,
    /// Export only
    Csv,
    /// Foreign list export, import only
    ForeignXml,
}

impl BackupFormat {
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(BackupFormat::Json),
            Some("csv") => Ok(BackupFormat::Csv),
            Some("xml") => Ok(BackupFormat::ForeignXml),
            _ => Err(AppError::InvalidBackupFormat(format!(
                "unsupported file type: {}",
                path.display()
            ))),
        }
    }

    pub fn can_import(&self) -> bool {
        matches!(self, BackupFormat::Json | BackupFormat::ForeignXml)
    }
}

/// Parse an in-memory document of the given format
pub fn parse_document(format: BackupFormat, document: &str) -> AppResult<Vec<ImportRecord>> {
    match format {
        BackupFormat::Json => parse_json(document),
        BackupFormat::ForeignXml => parse_foreign_xml(document),
        BackupFormat::Csv => Err(AppError::InvalidBackupFormat(
            "CSV files can only be exported".to_string(),
        )),
    }
}

/// Render entries in the given format
pub fn render_document(format: BackupFormat, entries: &[LibraryEntry]) -> AppResult<String> {
    match format {
        BackupFormat::Json => serialize_json(entries, Utc::now()),
        BackupFormat::Csv => Ok(serialize_csv(entries)),
        BackupFormat::ForeignXml => Err(AppError::InvalidBackupFormat(
            "XML files can only be imported".to_string(),
        )),
    }
}

/// Read and parse an import file.
/// A file that yields no importable record fails with `EmptyImportFile`.
pub async fn read_import_file(path: &Path) -> AppResult<Vec<ImportRecord>> {
    let format = BackupFormat::from_path(path)?;
    if !format.can_import() {
        return parse_document(format, "");
    }

    let document = tokio::fs::read_to_string(path).await?;
    let records = parse_document(format, &document)?;
    if records.is_empty() {
        return Err(AppError::EmptyImportFile);
    }

    info!("Read {} candidate records from {}", records.len(), path.display());
    Ok(records)
}

/// Serialize entries and write them to `path`. Returns the format used.
pub async fn write_export_file(path: &Path, entries: &[LibraryEntry]) -> AppResult<BackupFormat> {
    let format = BackupFormat::from_path(path)?;
    let document = render_document(format, entries)?;
    tokio::fs::write(path, document).await?;

    info!("Exported {} entries to {}", entries.len(), path.display());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WatchStatus;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(BackupFormat::from_path(Path::new("a/lib.JSON")).unwrap(), BackupFormat::Json);
        assert_eq!(BackupFormat::from_path(Path::new("lib.csv")).unwrap(), BackupFormat::Csv);
        assert_eq!(
            BackupFormat::from_path(Path::new("animelist.xml")).unwrap(),
            BackupFormat::ForeignXml
        );
        assert!(matches!(
            BackupFormat::from_path(Path::new("lib.txt")),
            Err(AppError::InvalidBackupFormat(_))
        ));
        assert!(BackupFormat::from_path(Path::new("noextension")).is_err());
    }

    #[tokio::test]
    async fn test_export_then_import_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");

        let mut entry = LibraryEntry::new("20", "Naruto");
        entry.status = WatchStatus::Dropped;
        entry.current_ep = 40;
        entry.total_ep = 220;
        entry.score = 6;

        let format = write_export_file(&path, &[entry]).await.unwrap();
        assert_eq!(format, BackupFormat::Json);

        let records = read_import_file(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "20");
        assert_eq!(records[0].status, "dropped");
        assert_eq!(records[0].current_ep, Some(40));
    }

    #[tokio::test]
    async fn test_csv_is_export_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.csv");

        write_export_file(&path, &[LibraryEntry::new("1", "A")]).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("ID,Título"));

        assert!(matches!(
            read_import_file(&path).await,
            Err(AppError::InvalidBackupFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_xml_is_import_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xml");
        assert!(matches!(
            write_export_file(&path, &[]).await,
            Err(AppError::InvalidBackupFormat(_))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_json_without_valid_records_is_empty_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, r#"{"version":1,"exportedAt":"2024-01-01T00:00:00Z","animes":[]}"#)
            .unwrap();
        assert!(matches!(
            read_import_file(&path).await,
            Err(AppError::EmptyImportFile)
        ));
    }
}
