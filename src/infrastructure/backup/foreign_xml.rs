// src/infrastructure/backup/foreign_xml.rs
//
// MyAnimeList-style XML export import.
//
// Only the flat children of each <anime> node are read. Images never appear
// in this format and are backfilled by enrichment after parsing.

use log::debug;
use regex::{Captures, Regex};

use crate::domain::ImportRecord;
use crate::error::{AppError, AppResult};

/// Foreign status vocabulary mapped to import tokens.
/// `on_hold` is resolved to `paused` by the normalizer.
const STATUS_TABLE: [(&str, &str); 5] = [
    ("watching", "watching"),
    ("completed", "completed"),
    ("on-hold", "on_hold"),
    ("dropped", "dropped"),
    ("plan to watch", "plan_to_watch"),
];

/// Numeric status codes used by older exports
const STATUS_CODES: [(&str, &str); 5] = [
    ("1", "watching"),
    ("2", "completed"),
    ("3", "on_hold"),
    ("4", "dropped"),
    ("6", "plan_to_watch"),
];

pub struct ForeignXmlParser {
    anime_node: Regex,
    field: Regex,
    entity: Regex,
}

impl ForeignXmlParser {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            anime_node: compile(r"(?s)<anime>(.*?)</anime>")?,
            field: compile(r"(?s)<([A-Za-z_]+)>(.*?)</([A-Za-z_]+)>")?,
            entity: compile(r"&(#x[0-9A-Fa-f]+|#[0-9]+|amp|lt|gt|quot|apos);")?,
        })
    }

    pub fn parse(&self, document: &str) -> AppResult<Vec<ImportRecord>> {
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for node in self.anime_node.captures_iter(document) {
            match self.parse_node(&node[1]) {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!("Dropped {} <anime> nodes without id or title", dropped);
        }
        if records.is_empty() {
            return Err(AppError::EmptyImportFile);
        }
        Ok(records)
    }

    fn parse_node(&self, body: &str) -> Option<ImportRecord> {
        let mut record = ImportRecord::default();
        let mut status_raw = None;

        for field in self.field.captures_iter(body) {
            if field[1] != field[3] {
                continue;
            }
            let value = self.text_value(&field[2]);
            match &field[1] {
                "series_animedb_id" => record.id = value,
                "series_title" => record.title = value,
                "my_status" => status_raw = Some(value),
                "my_score" => record.score = parse_count(&value),
                "my_watched_episodes" => record.current_ep = parse_count(&value),
                "series_episodes" => record.total_ep = parse_count(&value),
                "series_type" if !value.is_empty() => record.media_type = Some(value),
                _ => {}
            }
        }

        if record.id.is_empty() || record.title.is_empty() {
            return None;
        }
        record.status = translate_status(status_raw.as_deref().unwrap_or_default()).to_string();
        Some(record)
    }

    /// Strip CDATA, unescape entities and trim
    fn text_value(&self, raw: &str) -> String {
        let raw = raw.trim();
        if let Some(inner) = raw
            .strip_prefix("<![CDATA[")
            .and_then(|rest| rest.strip_suffix("]]>"))
        {
            return inner.trim().to_string();
        }
        self.entity
            .replace_all(raw, |caps: &Captures| unescape_entity(&caps[1]))
            .trim()
            .to_string()
    }
}

/// Parse a foreign export document.
/// Fails with `EmptyImportFile` when no node yields an id and a title.
pub fn parse_foreign_xml(document: &str) -> AppResult<Vec<ImportRecord>> {
    ForeignXmlParser::new()?.parse(document)
}

fn compile(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern).map_err(|e| AppError::Other(format!("Invalid pattern {}: {}", pattern, e)))
}

/// Unknown statuses land in the plan-to-watch list
fn translate_status(raw: &str) -> &'static str {
    let key = raw.trim().to_ascii_lowercase();
    STATUS_TABLE
        .iter()
        .chain(STATUS_CODES.iter())
        .find(|(foreign, _)| *foreign == key)
        .map(|(_, token)| *token)
        .unwrap_or("plan_to_watch")
}

fn parse_count(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().map(|n| n.max(0))
}

fn unescape_entity(name: &str) -> String {
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name
            .strip_prefix("#x")
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    decoded
        .map(String::from)
        .unwrap_or_else(|| format!("&{};", name))
}
