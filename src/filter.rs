//! Zone/district selection shared by the polygon and site views.

use crate::types::{District, Site};

/// One side of a selection: everything, or a single concrete value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// Absent or blank input means no filter.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self::Only(v.to_string()),
            _ => Self::All,
        }
    }

    fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => value == Some(wanted.as_str()),
        }
    }
}

/// A (zone, district) pair; both must match for a record to pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub zone: Choice,
    pub district: Choice,
}

impl Selection {
    pub fn new(zone: Choice, district: Choice) -> Self {
        Self { zone, district }
    }

    pub fn from_params(zone: Option<&str>, district: Option<&str>) -> Self {
        Self::new(Choice::from_param(zone), Choice::from_param(district))
    }

    pub fn matches<T: Zoned>(&self, record: &T) -> bool {
        self.zone.accepts(record.zone()) && self.district.accepts(record.district_name())
    }
}

/// Records that carry a zone and district name.
pub trait Zoned {
    fn zone(&self) -> Option<&str>;
    fn district_name(&self) -> Option<&str>;
}

impl Zoned for District {
    fn zone(&self) -> Option<&str> {
        Some(&self.zone)
    }

    fn district_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Zoned for Site {
    fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    fn district_name(&self) -> Option<&str> {
        self.district_name.as_deref()
    }
}

/// Borrowing filter in input order.
pub fn select<'a, T: Zoned>(
    records: &'a [T],
    selection: &'a Selection,
) -> impl Iterator<Item = &'a T> + 'a {
    records.iter().filter(move |r| selection.matches(*r))
}

/// Owning filter in input order.
pub fn filter<T: Zoned>(records: Vec<T>, selection: &Selection) -> Vec<T> {
    records
        .into_iter()
        .filter(|r| selection.matches(r))
        .collect()
}
