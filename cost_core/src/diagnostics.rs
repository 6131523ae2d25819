//! # Diagnostics
//!
//! Recoverable anomalies noticed during an audit. These never abort a run:
//! the engine substitutes a default (100 % localization factors, a zero curve
//! cost) and records what happened here so the final report can list every
//! gap. Entries are deduplicated by value, so asking the same failing question
//! twice produces one entry.

use serde::{Deserialize, Serialize};

/// One recoverable anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// No localization factor matched; 100 % factors were substituted
    LocalizationMiss {
        item_id: String,
        province_state: String,
        city: String,
        message: String,
    },

    /// A cost curve could not answer for the requested x; cost set to 0
    InterpolationOutOfRange {
        construction: String,
        x: f64,
        /// Library range `(min_x, max_x)`, `None` when the curve was empty
        range: Option<(f64, f64)>,
        message: String,
    },
}

impl Diagnostic {
    /// Human-readable message
    pub fn message(&self) -> &str {
        match self {
            Diagnostic::LocalizationMiss { message, .. } => message,
            Diagnostic::InterpolationOutOfRange { message, .. } => message,
        }
    }

    /// Short code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::LocalizationMiss { .. } => "LOCALIZATION_MISS",
            Diagnostic::InterpolationOutOfRange { .. } => "INTERPOLATION_OUT_OF_RANGE",
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

/// Ordered, deduplicated collection of [`Diagnostic`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic unless an equal one is already present.
    ///
    /// Returns `true` if the entry was new.
    pub fn record(&mut self, diagnostic: Diagnostic) -> bool {
        if self.entries.contains(&diagnostic) {
            return false;
        }
        self.entries.push(diagnostic);
        true
    }

    /// All diagnostics in first-seen order
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostics with the given code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.code() == code)
    }

    /// Fold another collection into this one, keeping dedup semantics
    pub fn merge(&mut self, other: Diagnostics) {
        for diagnostic in other.entries {
            self.record(diagnostic);
        }
    }
}
