// Input shapes accepted by the normalizer.
//
// Each shape is mapped to a LibraryEntry by its own function in
// normalizer.rs. Nothing here carries business rules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::library_entry::LibraryEntry;

/// Everything the normalizer knows how to turn into a LibraryEntry
#[derive(Debug, Clone)]
pub enum EntryInput {
    /// Fresh payload from the external catalog API
    Catalog(CatalogPayload),
    /// A flat entry, already in canonical shape
    Stored(LibraryEntry),
    /// A parsed backup or foreign-export record
    Import(ImportRecord),
}

impl EntryInput {
    /// Store key the input will be written under, when it carries one
    pub fn key(&self) -> Option<String> {
        match self {
            EntryInput::Catalog(payload) => payload
                .mal_id
                .clone()
                .and_then(RawId::into_key)
                .or_else(|| payload.id.clone().and_then(RawId::into_key)),
            EntryInput::Stored(entry) => non_empty(&entry.id),
            EntryInput::Import(record) => non_empty(&record.id),
        }
    }
}

fn non_empty(id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Identifier as it may arrive over the wire: number or string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    /// Canonical string key, `None` when nothing usable is left
    pub fn into_key(self) -> Option<String> {
        let key = match self {
            RawId::Integer(n) => n.to_string(),
            RawId::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", f as i64),
            RawId::Float(f) => f.to_string(),
            RawId::Text(s) => s.trim().to_string(),
        };
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

/// Genre, theme, demographic or studio reference.
/// Already-normalized data carries plain strings; the catalog sends objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagRef {
    Name(String),
    Object { name: String },
}

impl TagRef {
    pub fn into_name(self) -> String {
        match self {
            TagRef::Name(name) | TagRef::Object { name } => name,
        }
    }
}

/// Size variants for one image format (`jpg`, `webp`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageVariants {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
    #[serde(default)]
    pub maximum_image_url: Option<String>,
}

impl ImageVariants {
    /// Largest available size first
    pub fn largest(&self) -> Option<&str> {
        [
            &self.maximum_image_url,
            &self.large_image_url,
            &self.image_url,
            &self.small_image_url,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|url| !url.trim().is_empty())
    }
}

/// Anime payload as returned by the catalog API.
/// Every field is optional; the normalizer decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPayload {
    #[serde(default)]
    pub mal_id: Option<RawId>,
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<HashMap<String, ImageVariants>>,
    #[serde(default)]
    pub genres: Option<Vec<TagRef>>,
    #[serde(default)]
    pub themes: Option<Vec<TagRef>>,
    #[serde(default)]
    pub demographics: Option<Vec<TagRef>>,
    #[serde(default)]
    pub studios: Option<Vec<TagRef>>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
}

/// Candidate record produced by the backup codec, before normalization.
///
/// Only `id`, `title` and `status` are required for a record to be
/// importable; the rest stays `None` when the source did not carry it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    /// Status token in whatever vocabulary the source used
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub current_ep: Option<i64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_ep: Option<i64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_favorite: Option<bool>,
    #[serde(default, deserialize_with = "lenient::tags")]
    pub genres: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::tags")]
    pub studios: Option<Vec<String>>,
    #[serde(default, rename = "type", deserialize_with = "lenient::opt_text")]
    pub media_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::year")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub season: Option<String>,
}

impl ImportRecord {
    /// A record is importable when id, title and status are all present
    pub fn is_importable(&self) -> bool {
        !self.id.trim().is_empty() && !self.title.trim().is_empty() && !self.status.trim().is_empty()
    }
}

impl From<&LibraryEntry> for ImportRecord {
    fn from(entry: &LibraryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            status: entry.status.as_str().to_string(),
            image: entry.image.clone(),
            score: Some(i64::from(entry.score)),
            current_ep: Some(i64::from(entry.current_ep)),
            total_ep: Some(i64::from(entry.total_ep)),
            is_favorite: Some(entry.is_favorite),
            genres: Some(entry.genres.clone()),
            studios: Some(entry.studios.clone()),
            media_type: entry.media_type.clone(),
            year: entry.year,
            season: entry.season.clone(),
        }
    }
}

/// Field readers for hand-edited backups.
///
/// A field of the wrong type reads as absent instead of rejecting the
/// whole record; only id, title and status decide whether it is kept.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::RawId;

    fn value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn as_integer(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let raw = serde_json::from_value::<RawId>(value(deserializer)?).ok();
        Ok(raw.and_then(RawId::into_key).unwrap_or_default())
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(as_text(&value(deserializer)?).unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match value(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Ok(as_integer(&value(deserializer)?))
    }

    pub fn year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        Ok(as_integer(&value(deserializer)?).and_then(|y| i32::try_from(y).ok()))
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(match value(deserializer)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    /// Keeps the string members of an array and skips the rest
    pub fn tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match value(deserializer)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        Value::Object(mut obj) => match obj.remove("name") {
                            Some(Value::String(s)) => Some(s),
                            _ => None,
                        },
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }
}
