//! Parsing of uploaded site lists (`.xlsx` or `.csv`).
//!
//! Required columns are `Cod Site`, `Latitudine` and `Longitudine`. Rows with
//! any of them empty or unparsable are dropped without being reported; site
//! codes are trimmed and upper-cased.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use csv::ReaderBuilder;

use crate::error::{Error, Result};
use crate::types::Site;

pub const CODE_COLUMN: &str = "Cod Site";
pub const LATITUDE_COLUMN: &str = "Latitudine";
pub const LONGITUDE_COLUMN: &str = "Longitudine";

static EMPTY_CELL: Data = Data::Empty;

/// Upload formats accepted for site lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFormat {
    Xlsx,
    Csv,
}

impl SiteFormat {
    /// Picks the format from a file name; anything that is not `.csv` is read as a workbook.
    pub fn from_file_name(name: &str) -> Self {
        let is_csv = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::Csv
        } else {
            Self::Xlsx
        }
    }
}

pub fn parse_sites(bytes: &[u8], format: SiteFormat) -> Result<Vec<Site>> {
    let sites = match format {
        SiteFormat::Xlsx => parse_xlsx(bytes)?,
        SiteFormat::Csv => parse_csv(bytes)?,
    };
    tracing::info!(sites = sites.len(), ?format, "parsed site upload");
    Ok(sites)
}

pub fn load_sites(path: &Path) -> Result<Vec<Site>> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Upload(format!("cannot read {}: {e}", path.display())))?;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    parse_sites(&bytes, SiteFormat::from_file_name(name))
}

/// Column positions of the three required fields.
struct Columns {
    code: usize,
    latitude: usize,
    longitude: usize,
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim() == wanted)
                .ok_or_else(|| Error::Upload(format!("missing required column '{wanted}'")))
        };
        Ok(Self {
            code: find(CODE_COLUMN)?,
            latitude: find(LATITUDE_COLUMN)?,
            longitude: find(LONGITUDE_COLUMN)?,
        })
    }
}

fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    (!code.is_empty()).then(|| code.to_uppercase())
}

fn build_site(code: Option<String>, latitude: Option<f64>, longitude: Option<f64>) -> Option<Site> {
    Some(Site::new(code?, latitude?, longitude?))
}

fn parse_xlsx(bytes: &[u8]) -> Result<Vec<Site>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::Upload(format!("not a readable xlsx workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Upload("workbook has no sheets".to_string()))?
        .map_err(|e| Error::Upload(format!("cannot read first sheet: {e}")))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| Error::Upload("sheet is empty".to_string()))?;
    let headers: Vec<String> = header.iter().map(cell_text).collect();
    let columns = Columns::locate(&headers)?;

    let mut sites = Vec::new();
    let mut dropped = 0usize;
    for (line, row) in rows.enumerate() {
        let cell = |i: usize| row.get(i).unwrap_or(&EMPTY_CELL);
        let site = build_site(
            cell_code(cell(columns.code)),
            cell_number(cell(columns.latitude)),
            cell_number(cell(columns.longitude)),
        );
        match site {
            Some(site) => sites.push(site),
            None => {
                dropped += 1;
                tracing::debug!(row = line + 2, "dropping site row with missing fields");
            }
        }
    }
    if dropped > 0 {
        tracing::info!(dropped, "dropped incomplete site rows");
    }
    Ok(sites)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_code(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => normalize_code(s),
        Data::Int(i) => Some(i.to_string()),
        // Whole-number codes stored as floats lose the ".0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        other => normalize_code(&other.to_string()),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => parse_coordinate(s)?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Site>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = rdr
        .headers()
        .map_err(|e| Error::Upload(format!("cannot read csv header: {e}")))?
        .clone();
    let headers: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let columns = Columns::locate(&headers)?;

    let mut sites = Vec::new();
    let mut dropped = 0usize;
    for result in rdr.records() {
        let record = result.map_err(|e| Error::Upload(format!("malformed csv: {e}")))?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let site = build_site(
            normalize_code(field(columns.code)),
            parse_coordinate(field(columns.latitude)),
            parse_coordinate(field(columns.longitude)),
        );
        match site {
            Some(site) => sites.push(site),
            None => {
                dropped += 1;
                tracing::debug!(line = ?record.position().map(|p| p.line()), "dropping site row with missing fields");
            }
        }
    }
    if dropped > 0 {
        tracing::info!(dropped, "dropped incomplete site rows");
    }
    Ok(sites)
}
