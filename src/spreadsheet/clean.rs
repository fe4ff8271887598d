//! Metadata export cleanup
//!
//! Renames the coded export columns, keeps the first line of the
//! manufacturer, and pulls year, mass and dimensions out of free text.

use super::Sheet;
use regex::Regex;

/// Coded export column -> readable column
pub const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("t1", "ID"),
    ("T2", "Manufacturer"),
    ("T3", "Material"),
    ("T5", "Dimensions"),
    ("T8", "Location"),
    ("T9", "Department"),
    ("t12", "URL"),
    ("T13", "Image_Path"),
    ("T14", "Year"),
];

/// Columns of the cleaned file, in output order
pub const CLEAN_COLUMNS: &[&str] = &[
    "ID",
    "Manufacturer_Cleaned",
    "Year_Cleaned",
    "Mass_kg",
    "Height_mm",
    "Width_mm",
    "Depth_mm",
    "Material",
    "Location",
    "URL",
    "Image_Path",
];

lazy_static::lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
    static ref MASS_RE: Regex = Regex::new(r"(?i)Masse:\s*([\d,\.]+)\s*kg").unwrap();
    // Höhe x Breite x Tiefe
    static ref HBT_RE: Regex =
        Regex::new(r"(?i)HxBxT:\s*([\d,\.]+)\s*x\s*([\d,\.]+)\s*x\s*([\d,\.]+)\s*mm").unwrap();
    // Länge x Breite x Höhe
    static ref LBH_RE: Regex =
        Regex::new(r"(?i)LxBxH:\s*([\d,\.]+)\s*x\s*([\d,\.]+)\s*x\s*([\d,\.]+)\s*mm").unwrap();
}

/// Physical measurements found in a dimensions cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurements {
    pub mass_kg: Option<f64>,
    pub height_mm: Option<f64>,
    pub width_mm: Option<f64>,
    pub depth_mm: Option<f64>,
}

/// German decimal comma -> f64
fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").trim_end_matches('.').parse().ok()
}

/// First four-digit number in the cell
pub fn extract_year(text: &str) -> Option<String> {
    YEAR_RE.captures(text).map(|cap| cap[1].to_string())
}

/// First line of a multi-line manufacturer cell
pub fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

/// Parse `Masse: 1,5 kg` and `HxBxT:` / `LxBxH:` triples.
pub fn extract_measurements(text: &str) -> Measurements {
    let mut m = Measurements {
        mass_kg: MASS_RE.captures(text).and_then(|cap| parse_number(&cap[1])),
        ..Default::default()
    };

    if let Some(cap) = HBT_RE.captures(text) {
        m.height_mm = parse_number(&cap[1]);
        m.width_mm = parse_number(&cap[2]);
        m.depth_mm = parse_number(&cap[3]);
    } else if let Some(cap) = LBH_RE.captures(text) {
        m.depth_mm = parse_number(&cap[1]);
        m.width_mm = parse_number(&cap[2]);
        m.height_mm = parse_number(&cap[3]);
    }
    m
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Build the cleaned sheet from a raw metadata export.
pub fn clean_sheet(raw: &Sheet) -> Sheet {
    let column = |readable: &str| {
        COLUMN_RENAMES
            .iter()
            .find(|(_, name)| *name == readable)
            .and_then(|(code, name)| raw.column(&[*code, *name]))
    };

    let id = column("ID");
    let manufacturer = column("Manufacturer");
    let year = column("Year");
    let dimensions = column("Dimensions");
    let material = column("Material");
    let location = column("Location");
    let url = column("URL");
    let image_path = column("Image_Path");

    let value = |row: &[String], col: Option<usize>| -> String {
        col.map(|c| raw.cell(row, c).trim().to_string()).unwrap_or_default()
    };

    let mut cleaned = Sheet::new(CLEAN_COLUMNS.iter().map(|s| s.to_string()).collect());
    for row in &raw.rows {
        let measurements = extract_measurements(&value(row, dimensions));
        cleaned.rows.push(vec![
            value(row, id),
            first_line(&value(row, manufacturer)),
            extract_year(&value(row, year)).unwrap_or_default(),
            format_number(measurements.mass_kg),
            format_number(measurements.height_mm),
            format_number(measurements.width_mm),
            format_number(measurements.depth_mm),
            value(row, material),
            value(row, location),
            value(row, url),
            value(row, image_path),
        ]);
    }

    tracing::info!("cleaned {} rows", cleaned.rows.len());
    cleaned
}
