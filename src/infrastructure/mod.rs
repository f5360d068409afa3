// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod backup;

pub use backup::{
    parse_foreign_xml, parse_json, read_import_file, serialize_csv, serialize_json,
    write_export_file, BackupFormat,
};
