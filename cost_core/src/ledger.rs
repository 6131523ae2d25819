//! # Audit Ledger
//!
//! Every priced line item of an audit run, in pricing order. The ledger is
//! append-only: entries are validated on the way in and never edited, so the
//! aggregator can recompute every total from it alone.
//!
//! ## Document format
//!
//! ```json
//! {
//!   "province_state": "ON",
//!   "city": "Toronto",
//!   "items": [
//!     { "id": "AA1", "quantity": 2.0, "material_mult": 1.0,
//!       "labour_mult": 1.0, "equipment_mult": 1.0,
//!       "tags": ["envelope", "wall"] }
//!   ]
//! }
//! ```
//!
//! [`Ledger::from_json`] enforces the type contract strictly: a quantity given
//! as a string or a tag given as a number is rejected with
//! [`CostError::TypeContract`], never coerced.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{CostError, CostResult};
use crate::localization::Locale;

// ============================================================================
// Tags
// ============================================================================

/// Descriptive tags on a ledger entry. Categories are matched against these
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag unless it is blank or already present
    pub fn push(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        let tag = tag.trim();
        if !tag.is_empty() && !self.0.iter().any(|t| t == tag) {
            self.0.push(tag.to_string());
        }
    }

    /// Append another tag set, keeping first-seen order
    pub fn merge(&mut self, other: impl Into<Tags>) {
        for tag in other.into().0 {
            self.push(tag);
        }
    }

    /// Case-insensitive membership
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Tags {
    fn from(tag: &str) -> Self {
        let mut tags = Tags::new();
        tags.push(tag);
        tags
    }
}

impl From<String> for Tags {
    fn from(tag: String) -> Self {
        Tags::from(tag.as_str())
    }
}

impl From<Vec<String>> for Tags {
    fn from(list: Vec<String>) -> Self {
        list.into_iter().collect()
    }
}

impl From<Vec<&str>> for Tags {
    fn from(list: Vec<&str>) -> Self {
        list.into_iter().collect()
    }
}

impl From<&[&str]> for Tags {
    fn from(list: &[&str]) -> Self {
        list.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for Tags {
    fn from(list: [&str; N]) -> Self {
        list.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.push(tag);
        }
        tags
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// One priced line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostedLineItem {
    #[serde(rename = "id")]
    pub catalog_id: String,
    pub quantity: f64,
    pub material_mult: f64,
    #[serde(rename = "labour_mult", alias = "labor_mult")]
    pub labor_mult: f64,
    pub equipment_mult: f64,
    pub tags: Tags,
}

impl CostedLineItem {
    /// Build a line item, enforcing that every number is finite
    pub fn new(
        catalog_id: impl Into<String>,
        quantity: f64,
        material_mult: f64,
        labor_mult: f64,
        equipment_mult: f64,
        tags: impl Into<Tags>,
    ) -> CostResult<Self> {
        let catalog_id = catalog_id.into().trim().to_uppercase();
        if catalog_id.is_empty() {
            return Err(CostError::type_contract("id", "\"\"", "Catalog id must not be empty"));
        }
        for (field, value) in [
            ("quantity", quantity),
            ("material_mult", material_mult),
            ("labour_mult", labor_mult),
            ("equipment_mult", equipment_mult),
        ] {
            if !value.is_finite() {
                return Err(CostError::type_contract(
                    field,
                    value.to_string(),
                    "Must be a finite number",
                ));
            }
        }
        Ok(CostedLineItem {
            catalog_id,
            quantity,
            material_mult,
            labor_mult,
            equipment_mult,
            tags: tags.into(),
        })
    }

    /// Parse one ledger entry from JSON without coercion.
    ///
    /// `id` and `quantity` are required; multipliers default to 1.0; `tags`
    /// may be a string or a list of strings.
    pub fn from_json(value: &Value) -> CostResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            CostError::type_contract("item", value.to_string(), "Ledger entry must be an object")
        })?;

        let catalog_id = match obj.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(CostError::type_contract("id", other.to_string(), "Must be a string"))
            }
            None => return Err(CostError::type_contract("id", "null", "Missing catalog id")),
        };

        let quantity = match obj.get("quantity") {
            Some(v) => number_field("quantity", v)?,
            None => return Err(CostError::type_contract("quantity", "null", "Missing quantity")),
        };

        let mult = |names: &[&str]| -> CostResult<f64> {
            match names.iter().find_map(|n| obj.get(*n).map(|v| (*n, v))) {
                Some((name, v)) => number_field(name, v),
                None => Ok(1.0),
            }
        };
        let material_mult = mult(&["material_mult"])?;
        let labor_mult = mult(&["labour_mult", "labor_mult"])?;
        let equipment_mult = mult(&["equipment_mult"])?;

        let tags = match obj.get("tags") {
            None | Some(Value::Null) => Tags::new(),
            Some(Value::String(s)) => Tags::from(s.as_str()),
            Some(Value::Array(list)) => list
                .iter()
                .map(|t| match t {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(CostError::type_contract(
                        "tags",
                        other.to_string(),
                        "Every tag must be a string",
                    )),
                })
                .collect::<CostResult<Tags>>()?,
            Some(other) => {
                return Err(CostError::type_contract(
                    "tags",
                    other.to_string(),
                    "Tags must be a string or a list of strings",
                ))
            }
        };

        CostedLineItem::new(catalog_id, quantity, material_mult, labor_mult, equipment_mult, tags)
    }
}

fn number_field(field: &str, value: &Value) -> CostResult<f64> {
    value.as_f64().ok_or_else(|| {
        CostError::type_contract(field, value.to_string(), "Must be a number")
    })
}

// ============================================================================
// Ledger
// ============================================================================

/// Append-only list of line items for one audit at one locale
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    locale: Locale,
    entries: Vec<CostedLineItem>,
}

/// Serialized form of a [`Ledger`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub province_state: String,
    pub city: String,
    pub items: Vec<CostedLineItem>,
}

impl Ledger {
    pub fn new(locale: Locale) -> Self {
        Ledger {
            locale,
            entries: Vec::new(),
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn append(&mut self, entry: CostedLineItem) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CostedLineItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            province_state: self.locale.province_state.clone(),
            city: self.locale.city.clone(),
            items: self.entries.clone(),
        }
    }

    /// Parse a ledger document, validating every entry
    pub fn from_json(value: &Value) -> CostResult<Self> {
        let string_field = |name: &str| -> CostResult<String> {
            match value.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(CostError::type_contract(name, other.to_string(), "Must be a string")),
                None => Err(CostError::type_contract(name, "null", "Missing field")),
            }
        };
        let locale = Locale::new(string_field("province_state")?, string_field("city")?);

        let items = match value.get("items") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(CostError::type_contract("items", other.to_string(), "Must be a list"))
            }
            None => return Err(CostError::type_contract("items", "null", "Missing field")),
        };

        let mut ledger = Ledger::new(locale);
        for item in items {
            ledger.append(CostedLineItem::from_json(item)?);
        }
        Ok(ledger)
    }
}
