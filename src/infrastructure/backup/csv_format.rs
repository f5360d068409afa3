// src/infrastructure/backup/csv_format.rs
//
// Spreadsheet export. There is no CSV importer.

use crate::domain::LibraryEntry;

pub const CSV_HEADER: [&str; 11] = [
    "ID",
    "Título",
    "Status",
    "Nota",
    "Eps Vistos",
    "Eps Totais",
    "Gêneros",
    "Estúdios",
    "Tipo",
    "Ano",
    "Favorito",
];

/// One row per entry, fixed column order, `\n` line endings
pub fn serialize_csv(entries: &[LibraryEntry]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));

    for entry in entries {
        push_row(
            &mut out,
            [
                entry.id.clone(),
                entry.title.clone(),
                entry.status.as_str().to_string(),
                entry.score.to_string(),
                entry.current_ep.to_string(),
                entry.total_ep.to_string(),
                entry.genres.join(", "),
                entry.studios.join(", "),
                entry.media_type.clone().unwrap_or_default(),
                entry.year.map(|y| y.to_string()).unwrap_or_default(),
                if entry.is_favorite { "Sim" } else { "Não" }.to_string(),
            ],
        );
    }
    out
}

fn push_row<I>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = String>,
{
    let row: Vec<String> = fields.into_iter().map(|f| escape_field(&f)).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

/// Quote fields holding separators, quotes or line breaks; embedded quotes are doubled
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
