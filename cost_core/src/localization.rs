//! # Localization Resolver
//!
//! Catalog costs are national baselines. A localization factor row scales them
//! for one city: `material` and `installation` percentages apply to the
//! material and labour components, and the row's `total` percentage is applied
//! to the equipment component.
//!
//! Rows are selected by exact `(province_state, city)` and by the two-letter
//! code prefix of the item id (the catalog's trade division). A miss is not an
//! error: the neutral `(100, 100, 100)` factors are returned and a
//! [`Diagnostic::LocalizationMiss`] is recorded.
//!
//! ```rust
//! use cost_core::diagnostics::Diagnostics;
//! use cost_core::localization::{Locale, LocalizationFactor, LocalizationTable};
//! use cost_core::units::Percent;
//!
//! let mut table = LocalizationTable::new();
//! table.insert(LocalizationFactor::new("ON", "Toronto", "AA", 110.0, 90.0, 100.0));
//!
//! let mut diags = Diagnostics::new();
//! let factors = table.resolve(&Locale::new("ON", "Toronto"), "AA1", &mut diags);
//! assert_eq!(factors.material, Percent(110.0));
//! assert!(diags.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::item::code_prefix;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::units::Percent;

/// A costing locale: province/state plus city, matched exactly
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    pub province_state: String,
    pub city: String,
}

impl Locale {
    pub fn new(province_state: impl Into<String>, city: impl Into<String>) -> Self {
        Locale {
            province_state: province_state.into(),
            city: city.into(),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.city, self.province_state)
    }
}

/// One row of `localization_factors.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationFactor {
    pub province_state: String,
    pub city: String,
    /// Two-character item id prefix this row applies to
    pub code_prefix: String,
    #[serde(rename = "material")]
    pub material_pct: Percent,
    #[serde(rename = "installation")]
    pub installation_pct: Percent,
    #[serde(rename = "total")]
    pub total_pct: Percent,
}

impl LocalizationFactor {
    pub fn new(
        province_state: impl Into<String>,
        city: impl Into<String>,
        code_prefix: impl Into<String>,
        material: f64,
        installation: f64,
        total: f64,
    ) -> Self {
        LocalizationFactor {
            province_state: province_state.into(),
            city: city.into(),
            code_prefix: code_prefix.into(),
            material_pct: Percent(material),
            installation_pct: Percent(installation),
            total_pct: Percent(total),
        }
    }

    fn factors(&self) -> RegionalFactors {
        RegionalFactors {
            material: self.material_pct,
            installation: self.installation_pct,
            equipment: self.total_pct,
        }
    }
}

/// Resolved regional multipliers for one item at one locale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionalFactors {
    pub material: Percent,
    pub installation: Percent,
    pub equipment: Percent,
}

impl RegionalFactors {
    /// The substitute used when no localization row matches
    pub const NEUTRAL: RegionalFactors = RegionalFactors {
        material: Percent::HUNDRED,
        installation: Percent::HUNDRED,
        equipment: Percent::HUNDRED,
    };
}

impl Default for RegionalFactors {
    fn default() -> Self {
        RegionalFactors::NEUTRAL
    }
}

/// All localization rows, indexed by locale.
#[derive(Debug, Clone, Default)]
pub struct LocalizationTable {
    by_locale: HashMap<Locale, Vec<LocalizationFactor>>,
    len: usize,
}

impl LocalizationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, factor: LocalizationFactor) {
        let key = Locale::new(factor.province_state.clone(), factor.city.clone());
        self.by_locale.entry(key).or_default().push(factor);
        self.len += 1;
    }

    /// Number of factor rows
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether any row exists for this locale
    pub fn has_locale(&self, locale: &Locale) -> bool {
        self.by_locale.contains_key(locale)
    }

    /// Pure lookup with no diagnostics side effect.
    ///
    /// The first row whose code prefix matches wins.
    pub fn lookup(&self, locale: &Locale, item_id: &str) -> Option<RegionalFactors> {
        let prefix = code_prefix(item_id);
        self.by_locale
            .get(locale)?
            .iter()
            .find(|row| row.code_prefix.eq_ignore_ascii_case(&prefix))
            .map(LocalizationFactor::factors)
    }

    /// Resolve factors for an item, substituting neutral factors on a miss.
    pub fn resolve(
        &self,
        locale: &Locale,
        item_id: &str,
        diagnostics: &mut Diagnostics,
    ) -> RegionalFactors {
        if let Some(factors) = self.lookup(locale, item_id) {
            return factors;
        }

        let message = format!(
            "No localization factors found for item '{}' in {}; using 100% factors",
            item_id, locale
        );
        let is_new = diagnostics.record(Diagnostic::LocalizationMiss {
            item_id: item_id.to_string(),
            province_state: locale.province_state.clone(),
            city: locale.city.clone(),
            message: message.clone(),
        });
        if is_new {
            tracing::warn!(item_id, locale = %locale, "{message}");
        }
        RegionalFactors::NEUTRAL
    }
}
