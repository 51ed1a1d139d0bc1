use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a person in the tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PersonId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Drawing anchor of a person node (top-left corner of its footprint).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite. JSON has no encoding for NaN or
    /// infinity, so only finite positions survive a save.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Position handed to a freshly added person before any layout runs.
    ///
    /// New nodes cascade diagonally so that repeated additions stay visible.
    #[must_use]
    pub fn placeholder(index: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let step = (index % 10) as f64;
        Self {
            x: 40.0f64.mul_add(step, 100.0),
            y: 30.0f64.mul_add(step, 100.0),
        }
    }
}

/// Opaque biographical record. Only `goes_by` carries an invariant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Biography {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    /// Preferred display name; required for insertion.
    pub goes_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub death_date: Option<DateTime<Utc>>,
    pub notes: String,
    /// Embedded image data or URL. Never inspected.
    pub photo: String,
}

impl Biography {
    /// Minimal record with just a preferred name.
    pub fn named(goes_by: impl Into<String>) -> Self {
        Self {
            goes_by: goes_by.into(),
            ..Self::default()
        }
    }

    /// `true` when the record satisfies the insertion rule.
    #[must_use]
    pub fn has_display_name(&self) -> bool {
        !self.goes_by.trim().is_empty()
    }

    /// Name shown on the node: preferred name, then first name, then `"Person"`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [self.goes_by.trim(), self.first_name.trim()]
            .into_iter()
            .find(|name| !name.is_empty())
            .unwrap_or("Person")
    }

    /// Upper-cased first letter of the preferred or first name, `'?'` if neither is set.
    #[must_use]
    pub fn initials(&self) -> char {
        [self.goes_by.trim(), self.first_name.trim()]
            .into_iter()
            .find_map(|name| name.chars().next())
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('?')
    }

    /// Given, middle and family names joined with single spaces.
    #[must_use]
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A node in the family tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: Biography,
}

impl Person {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.data.display_name()
    }
}
