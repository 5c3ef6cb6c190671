#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record types shared across the incident-lens workspace.
//!
//! Extraction produces loosely-typed [`RawIncident`] rows (field name to
//! string value). Before analysis each row is validated into an
//! [`IncidentRecord`] with a parsed timestamp, and after clustering it is
//! wrapped in an [`AnalyzedIncident`] carrying its cluster id, 2-D
//! coordinates and display colour.

pub mod palette;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Field holding the incident timestamp.
pub const DATE_TIME_FIELD: &str = "Date Time";
/// Field holding the agency incident number.
pub const INCIDENT_NUMBER_FIELD: &str = "Incident Number";
/// Field holding the incident location.
pub const LOCATION_FIELD: &str = "Location";
/// Field holding the free-text nature of the incident.
pub const NATURE_FIELD: &str = "Nature";
/// Field holding the originating agency identifier.
pub const INCIDENT_ORI_FIELD: &str = "Incident ORI";

/// Format of the [`DATE_TIME_FIELD`] value, e.g. `12/4/2024 0:04`.
pub const DATE_TIME_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Maps a source header (`"Date / Time"`, `"incident_number"`, ...) to its
/// canonical field name.
///
/// Unknown headers are kept with their whitespace collapsed.
#[must_use]
pub fn canonical_field_name(name: &str) -> String {
    let key: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match key.as_str() {
        "datetime" => DATE_TIME_FIELD.to_owned(),
        "incidentnumber" | "incidentno" => INCIDENT_NUMBER_FIELD.to_owned(),
        "location" | "address" => LOCATION_FIELD.to_owned(),
        "nature" => NATURE_FIELD.to_owned(),
        "incidentori" | "ori" => INCIDENT_ORI_FIELD.to_owned(),
        _ => name.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// Parses an incident timestamp in [`DATE_TIME_FORMAT`].
///
/// Returns `None` for anything that does not parse; callers drop such rows.
#[must_use]
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_TIME_FORMAT).ok()
}

/// One extracted row, before validation.
///
/// Field names are canonicalised on insert so rows from HTML tables and
/// PDF summaries share the same keys. Deserialized rows go through the
/// same path, so clients may send source headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct RawIncident {
    fields: BTreeMap<String, String>,
}

impl RawIncident {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field, canonicalising its name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(canonical_field_name(name), value.into());
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value of a field by canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns the raw timestamp text, if present.
    #[must_use]
    pub fn date_time(&self) -> Option<&str> {
        self.get(DATE_TIME_FIELD)
    }

    /// Returns the nature text, if present.
    #[must_use]
    pub fn nature(&self) -> Option<&str> {
        self.get(NATURE_FIELD)
    }

    /// Returns all fields.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Returns the number of fields in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawIncident {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = Self::new();
        for (name, value) in iter {
            raw.insert(name.as_ref(), value);
        }
        raw
    }
}

impl From<BTreeMap<String, String>> for RawIncident {
    fn from(fields: BTreeMap<String, String>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<RawIncident> for BTreeMap<String, String> {
    fn from(raw: RawIncident) -> Self {
        raw.fields
    }
}

/// Reason a [`RawIncident`] could not become an [`IncidentRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidIncidentError {
    /// The row has no [`DATE_TIME_FIELD`].
    MissingDateTime,
    /// The timestamp is not in [`DATE_TIME_FORMAT`].
    InvalidDateTime {
        /// The rejected value.
        value: String,
    },
}

impl std::fmt::Display for InvalidIncidentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDateTime => write!(f, "missing '{DATE_TIME_FIELD}' field"),
            Self::InvalidDateTime { value } => {
                write!(f, "invalid date/time '{value}': expected {DATE_TIME_FORMAT}")
            }
        }
    }
}

impl std::error::Error for InvalidIncidentError {}

/// A validated incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// When the incident was reported.
    pub date_time: NaiveDateTime,
    /// Free-text nature of the incident. Empty when the source omitted it.
    pub nature: String,
    /// Remaining source fields, passed through unvalidated.
    pub fields: BTreeMap<String, String>,
}

impl IncidentRecord {
    /// Validates a raw row.
    ///
    /// A missing nature becomes an empty string; only the timestamp can
    /// reject a row.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIncidentError`] if the timestamp is missing or
    /// unparseable.
    pub fn from_raw(raw: &RawIncident) -> Result<Self, InvalidIncidentError> {
        let value = raw
            .date_time()
            .ok_or(InvalidIncidentError::MissingDateTime)?;
        let date_time =
            parse_date_time(value).ok_or_else(|| InvalidIncidentError::InvalidDateTime {
                value: value.to_owned(),
            })?;

        let fields = raw
            .fields()
            .iter()
            .filter(|(name, _)| *name != DATE_TIME_FIELD && *name != NATURE_FIELD)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            date_time,
            nature: raw.nature().unwrap_or_default().to_owned(),
            fields,
        })
    }
}

/// An incident placed by the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedIncident {
    /// The validated incident.
    #[serde(flatten)]
    pub record: IncidentRecord,
    /// Cluster id in `[0, k)`.
    pub cluster: usize,
    /// First principal-component coordinate.
    pub x: f64,
    /// Second principal-component coordinate.
    pub y: f64,
    /// Display colour derived from `cluster`.
    pub color: String,
}
