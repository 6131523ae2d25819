//! # Cost Assembler
//!
//! Prices line items and records them. An [`AuditContext`] is the state of
//! one audit run: the injected catalog, the run's locale, the append-only
//! ledger, report rows and diagnostics. Every pricing call goes through it;
//! there is no ambient "current report".
//!
//! ## Pricing formula
//!
//! ```text
//! cost = ( material_op_cost  * material_pct/100     * material_mult
//!        + labor_op_cost     * installation_pct/100 * labor_mult
//!        + equipment_op_cost * equipment_pct/100    * equipment_mult ) * quantity
//! ```
//!
//! A multiplier of exactly 0 is treated as 1.0.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cost_core::assembler::{AuditContext, PriceOptions};
//! use cost_core::localization::Locale;
//!
//! let mut ctx = AuditContext::new(&catalog, Locale::new("ON", "Toronto"));
//! let cost = ctx.price("AA1", 2.0, PriceOptions::new().tags("envelope"))?;
//! let report = ctx.finish()?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::{self, CostSummary, DEFAULT_CATEGORIES};
use crate::catalog::{CatalogItem, CatalogStore, EquipmentRow};
use crate::config::{CostingConfig, DEFAULT_EXTRAPOLATION_PCT};
use crate::diagnostics::Diagnostics;
use crate::errors::{CostError, CostResult};
use crate::ledger::{CostedLineItem, Ledger, Tags};
use crate::localization::{Locale, RegionalFactors};
use crate::locations::closest_location;
use crate::report::{AuditReport, ReportMetadata, ReportRow, SCHEMA_VERSION};
use crate::sizing::{DualSelection, EquipmentSelection, SizeMatch, SizeResolver};

// ============================================================================
// Formula
// ============================================================================

/// The three per-component multipliers of a line item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multipliers {
    pub material: f64,
    pub labor: f64,
    pub equipment: f64,
}

impl Multipliers {
    pub fn of(entry: &CostedLineItem) -> Self {
        Multipliers {
            material: entry.material_mult,
            labor: entry.labor_mult,
            equipment: entry.equipment_mult,
        }
    }
}

fn effective(mult: f64) -> f64 {
    if mult == 0.0 {
        1.0
    } else {
        mult
    }
}

/// Localized cost of `quantity` units of an item
pub fn line_cost(
    item: &CatalogItem,
    factors: &RegionalFactors,
    mults: Multipliers,
    quantity: f64,
) -> f64 {
    let material = item.material_op_cost * factors.material.fraction() * effective(mults.material);
    let labor = item.labor_op_cost * factors.installation.fraction() * effective(mults.labor);
    let equipment =
        item.equipment_op_cost * factors.equipment.fraction() * effective(mults.equipment);
    (material + labor + equipment) * quantity
}

// ============================================================================
// Requests and results
// ============================================================================

/// Optional arguments to [`AuditContext::price`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceOptions {
    /// `None` uses the catalog item's default
    pub material_mult: Option<f64>,
    /// `None` uses the catalog item's default
    pub labor_mult: Option<f64>,
    pub equipment_mult: Option<f64>,
    pub tags: Tags,
}

impl PriceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn material_mult(mut self, mult: f64) -> Self {
        self.material_mult = Some(mult);
        self
    }

    pub fn labor_mult(mut self, mult: f64) -> Self {
        self.labor_mult = Some(mult);
        self
    }

    pub fn equipment_mult(mut self, mult: f64) -> Self {
        self.equipment_mult = Some(mult);
        self
    }

    pub fn tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags.merge(tags);
        self
    }
}

/// Attributes carried by a [`ComponentRequest`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentAttributes {
    /// Capacity, or the `Size` axis of a dual lookup
    pub size: Option<f64>,
    /// Connection count; selects the dual-constraint lookup
    pub connections: Option<f64>,
    /// Require an exact size match
    pub exact: bool,
    pub tags: Tags,
}

/// One component handed over by the quantity-extraction side:
/// `(catalog_family_hint, quantity, attributes)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRequest {
    /// An equipment family, an assembly name, or a catalog id
    pub family_hint: String,
    pub quantity: f64,
    #[serde(default)]
    pub attributes: ComponentAttributes,
}

/// Priced equipment from a sized lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquipmentCost<'a> {
    pub selection: EquipmentSelection<'a>,
    pub cost: f64,
}

/// Priced branch distributors from a dual-constraint lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchCost<'a> {
    pub selection: DualSelection<'a>,
    pub cost: f64,
}

// ============================================================================
// Audit context
// ============================================================================

/// State of one audit run
#[derive(Debug)]
pub struct AuditContext<'a> {
    catalog: &'a CatalogStore,
    locale: Locale,
    audit_id: Uuid,
    started_at: DateTime<Utc>,
    extrapolation_pct: f64,
    categories: Vec<String>,
    ledger: Ledger,
    rows: Vec<ReportRow>,
    diagnostics: Diagnostics,
}

impl<'a> AuditContext<'a> {
    /// Start an audit at a locale with default settings
    pub fn new(catalog: &'a CatalogStore, locale: Locale) -> Self {
        AuditContext {
            catalog,
            locale: locale.clone(),
            audit_id: Uuid::new_v4(),
            started_at: Utc::now(),
            extrapolation_pct: DEFAULT_EXTRAPOLATION_PCT,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            ledger: Ledger::new(locale),
            rows: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Start an audit from configuration. `locale` overrides the configured
    /// default; with neither, the request is invalid.
    pub fn from_config(
        catalog: &'a CatalogStore,
        config: &CostingConfig,
        locale: Option<Locale>,
    ) -> CostResult<Self> {
        let locale = locale
            .or_else(|| config.default_locale.clone())
            .ok_or_else(|| {
                CostError::invalid_input("locale", "none", "No locale given and no default_locale configured")
            })?;
        let mut ctx = AuditContext::new(catalog, locale);
        ctx.extrapolation_pct = config.extrapolation_pct;
        ctx.categories = config.categories.clone();
        Ok(ctx)
    }

    /// Start an audit at the surveyed city closest to a site
    pub fn at_coordinates(catalog: &'a CatalogStore, latitude: f64, longitude: f64) -> CostResult<Self> {
        let location = closest_location(catalog.locations(), latitude, longitude)
            .ok_or_else(|| CostError::reference_not_found("locations", "any surveyed location"))?;
        tracing::info!(
            city = %location.city,
            province_state = %location.province_state,
            "Costing at closest surveyed location"
        );
        Ok(AuditContext::new(catalog, location.locale()))
    }

    pub fn with_extrapolation_pct(mut self, pct: f64) -> Self {
        self.extrapolation_pct = pct;
        self
    }

    pub fn with_categories<S: AsRef<str>>(mut self, categories: &[S]) -> Self {
        self.categories = categories.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn catalog(&self) -> &'a CatalogStore {
        self.catalog
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn audit_id(&self) -> Uuid {
        self.audit_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn extrapolation_pct(&self) -> f64 {
        self.extrapolation_pct
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn resolver(&self) -> SizeResolver<'a> {
        SizeResolver::new(self.catalog)
    }

    /// Localization factors for an item at this audit's locale
    pub fn regional_factors(&mut self, item_id: &str) -> RegionalFactors {
        self.catalog
            .localization()
            .resolve(&self.locale, item_id, &mut self.diagnostics)
    }

    /// Price a catalog item and append it to the ledger
    pub fn price(&mut self, catalog_id: &str, quantity: f64, options: PriceOptions) -> CostResult<f64> {
        let catalog = self.catalog;
        let item = catalog.get_catalog_item(catalog_id)?;
        let entry = CostedLineItem::new(
            item.id.clone(),
            quantity,
            options.material_mult.unwrap_or(item.material_mult),
            options.labor_mult.unwrap_or(item.labor_mult),
            options.equipment_mult.unwrap_or(1.0),
            options.tags,
        )?;
        let factors = self.regional_factors(&item.id);
        let cost = line_cost(item, &factors, Multipliers::of(&entry), quantity);
        tracing::debug!(id = %item.id, quantity, cost, "priced line item");
        self.ledger.append(entry);
        Ok(cost)
    }

    /// Price an equipment row with its own multipliers, tagging the entry with
    /// the row's family and description
    pub fn price_reference(
        &mut self,
        row: &EquipmentRow,
        quantity: f64,
        tags: impl Into<Tags>,
    ) -> CostResult<f64> {
        let options = PriceOptions::new()
            .material_mult(row.material_mult)
            .labor_mult(row.labour_mult)
            .tags(tags)
            .tags([row.family.as_str(), row.description.as_str()]);
        self.price(&row.catalog_id, quantity, options)
    }

    /// Size and price equipment from a family. `quantity` is multiplied by the
    /// resolved unit count.
    pub fn price_equipment(
        &mut self,
        family: &str,
        size: Option<f64>,
        mode: SizeMatch,
        quantity: f64,
        tags: impl Into<Tags>,
    ) -> CostResult<EquipmentCost<'a>> {
        let selection = self.resolver().resolve_equipment(family, size, mode)?;
        let cost = self.price_reference(
            selection.row,
            quantity * f64::from(selection.multiplier),
            tags,
        )?;
        Ok(EquipmentCost { selection, cost })
    }

    /// Size and price a family against connections and capacity, including the
    /// remainder unit if one is selected
    pub fn price_branch_distributor(
        &mut self,
        family: &str,
        connections: f64,
        capacity: f64,
        tags: impl Into<Tags>,
    ) -> CostResult<BranchCost<'a>> {
        self.price_dual(family, connections, capacity, 1.0, tags.into())
    }

    /// Dual-constraint pricing with every resolved unit scaled by `quantity`
    fn price_dual(
        &mut self,
        family: &str,
        connections: f64,
        capacity: f64,
        quantity: f64,
        tags: Tags,
    ) -> CostResult<BranchCost<'a>> {
        let selection = self.resolver().resolve_dual(family, connections, capacity)?;
        let mut cost = self.price_reference(
            selection.main,
            quantity * f64::from(selection.multiplier),
            tags.clone(),
        )?;
        if let Some(remainder) = selection.remainder {
            cost += self.price_reference(remainder.row, quantity, tags)?;
        }
        Ok(BranchCost { selection, cost })
    }

    /// Price every component of an assembly by its listed quantity times
    /// `overall_mult`
    pub fn price_assembly(
        &mut self,
        name: &str,
        overall_mult: f64,
        tags: impl Into<Tags>,
    ) -> CostResult<f64> {
        let catalog = self.catalog;
        let assembly = catalog.assembly(name)?;
        let mut tags: Tags = tags.into();
        tags.push(assembly.name.as_str());

        let mut total = 0.0;
        for (material_id, quantity) in assembly.components() {
            let row = catalog.equipment_by_material_id(material_id)?;
            total += self.price_reference(row, quantity * overall_mult, tags.clone())?;
        }
        Ok(total)
    }

    /// Route an extracted component to the right pricing path:
    /// connections select the dual lookup, a known family the sized lookup,
    /// a known assembly the assembly path, anything else is a catalog id.
    pub fn price_component(&mut self, request: &ComponentRequest) -> CostResult<f64> {
        let attrs = &request.attributes;
        let hint = request.family_hint.as_str();
        let tags = attrs.tags.clone();
        if !request.quantity.is_finite() {
            return Err(CostError::type_contract(
                "quantity",
                request.quantity.to_string(),
                format!("Quantity for '{hint}' must be a finite number"),
            ));
        }

        if let Some(connections) = attrs.connections {
            let capacity = attrs.size.unwrap_or(0.0);
            return Ok(self
                .price_dual(hint, connections, capacity, request.quantity, tags)?
                .cost);
        }
        if self.catalog.has_family(hint) {
            let mode = if attrs.exact {
                SizeMatch::Exact
            } else {
                SizeMatch::Minimum
            };
            return Ok(self
                .price_equipment(hint, attrs.size, mode, request.quantity, tags)?
                .cost);
        }
        if self.catalog.assembly(hint).is_ok() {
            return self.price_assembly(hint, request.quantity, tags);
        }
        self.price(hint, request.quantity, PriceOptions::new().tags(tags))
    }

    /// Price a batch of components in order, returning the total
    pub fn price_components(&mut self, requests: &[ComponentRequest]) -> CostResult<f64> {
        let mut total = 0.0;
        for request in requests {
            total += self.price_component(request)?;
        }
        Ok(total)
    }

    /// Attach a per-component row to the report
    pub fn add_row(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    /// Category totals of the ledger so far, unrounded
    pub fn summarize(&mut self) -> CostResult<CostSummary> {
        aggregator::summarize(
            &self.ledger,
            self.catalog,
            &self.categories,
            &mut self.diagnostics,
        )
    }

    /// Close the audit and build its report
    pub fn finish(mut self) -> CostResult<AuditReport> {
        let summary = self.summarize()?.rounded();
        let component_totals = aggregator::summarize_rows(&self.rows, &self.categories).rounded();
        tracing::info!(
            audit_id = %self.audit_id,
            entries = self.ledger.len(),
            grand_total = summary.grand_total,
            diagnostics = self.diagnostics.len(),
            "Audit finished"
        );
        Ok(AuditReport {
            meta: ReportMetadata {
                version: SCHEMA_VERSION.to_string(),
                audit_id: self.audit_id,
                created: self.started_at,
                locale: self.locale,
            },
            summary,
            component_totals,
            ledger: self.ledger.entries().to_vec(),
            rows: self.rows,
            diagnostics: self.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;

    fn toronto(store: &CatalogStore) -> AuditContext<'_> {
        AuditContext::new(store, Locale::new("ON", "Toronto"))
    }

    #[test]
    fn test_price_localized_item() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let cost = ctx.price("AA1", 2.0, PriceOptions::new().tags("envelope")).unwrap();
        assert!((cost - 31.0).abs() < 1e-9);
        assert_eq!(ctx.ledger().len(), 1);
        let entry = &ctx.ledger().entries()[0];
        assert_eq!(entry.catalog_id, "AA1");
        assert!(entry.tags.contains("envelope"));
    }

    #[test]
    fn test_price_with_multipliers() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let options = PriceOptions::new().material_mult(2.0).labor_mult(0.5);
        let cost = ctx.price("AA1", 1.0, options).unwrap();
        // 10 * 1.1 * 2 + 5 * 0.9 * 0.5
        assert!((cost - 24.25).abs() < 1e-9);
    }

    #[test]
    fn test_zero_multiplier_treated_as_one() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let cost = ctx
            .price("AA1", 1.0, PriceOptions::new().material_mult(0.0))
            .unwrap();
        assert!((cost - 15.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_item_is_fatal_and_not_recorded() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let err = ctx.price("NOPE", 1.0, PriceOptions::new()).unwrap_err();
        assert_eq!(err.error_code(), "CATALOG_ITEM_NOT_FOUND");
        assert!(ctx.ledger().is_empty());
    }

    #[test]
    fn test_non_finite_quantity_is_type_contract_error() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let err = ctx.price("AA1", f64::NAN, PriceOptions::new()).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONTRACT");
        assert!(ctx.ledger().is_empty());
    }

    #[test]
    fn test_unknown_locale_records_diagnostic_once() {
        let store = sample_catalog();
        let mut ctx = AuditContext::new(&store, Locale::new("ZZ", "Nowhere"));
        let a = ctx.price("AA1", 1.0, PriceOptions::new()).unwrap();
        let b = ctx.price("AA1", 1.0, PriceOptions::new()).unwrap();
        assert_eq!(a, 15.0);
        assert_eq!(b, 15.0);
        assert_eq!(ctx.diagnostics().len(), 1);
    }

    #[test]
    fn test_price_equipment_merges_row_tags() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let priced = ctx
            .price_equipment("Boilers", Some(250.0), SizeMatch::Minimum, 1.0, "heating_cooling")
            .unwrap();
        assert_eq!(priced.selection.multiplier, 2);
        // two AB102 units: (3000 + 1000 + 100) * 2
        assert!((priced.cost - 8200.0).abs() < 1e-9);
        let entry = &ctx.ledger().entries()[0];
        assert_eq!(entry.quantity, 2.0);
        let tags: Vec<_> = entry.tags.iter().collect();
        assert_eq!(tags, vec!["heating_cooling", "Boilers", "boiler 200kW"]);
    }

    #[test]
    fn test_price_branch_distributor_with_remainder() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let priced = ctx
            .price_branch_distributor("Branch Distributors", 10.0, 30.0, "heating_cooling")
            .unwrap();
        // one BD004 (400 + 150) plus a BD001 remainder (100 + 50)
        assert!((priced.cost - 700.0).abs() < 1e-9);
        assert_eq!(ctx.ledger().len(), 2);
    }

    #[test]
    fn test_price_component_dual_scales_by_quantity() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let request = ComponentRequest {
            family_hint: "Branch Distributors".to_string(),
            quantity: 0.5,
            attributes: ComponentAttributes {
                size: Some(30.0),
                connections: Some(10.0),
                ..Default::default()
            },
        };
        let cost = ctx.price_component(&request).unwrap();
        assert!((cost - 350.0).abs() < 1e-9);
        let quantities: Vec<f64> = ctx.ledger().entries().iter().map(|e| e.quantity).collect();
        assert_eq!(quantities, vec![0.5, 0.5]);
    }

    #[test]
    fn test_price_component_rejects_non_finite_quantity() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        for (hint, connections) in [("Branch Distributors", Some(3.0)), ("Boilers", None), ("AA1", None)] {
            let request = ComponentRequest {
                family_hint: hint.to_string(),
                quantity: f64::NAN,
                attributes: ComponentAttributes {
                    size: Some(30.0),
                    connections,
                    ..Default::default()
                },
            };
            let err = ctx.price_component(&request).unwrap_err();
            assert_eq!(err.error_code(), "TYPE_CONTRACT", "{hint}");
        }
        assert!(ctx.ledger().is_empty());
    }

    #[test]
    fn test_price_assembly() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let cost = ctx.price_assembly("ahu-basic", 2.0, "ventilation").unwrap();
        // fans: 2 * 2 * 400; coil: 1 * 2 * 750
        assert!((cost - 3100.0).abs() < 1e-9);
        assert_eq!(ctx.ledger().len(), 2);
        assert!(ctx.ledger().entries()[0].tags.contains("AHU-Basic"));
    }

    #[test]
    fn test_price_component_routing() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        let requests = vec![
            ComponentRequest {
                family_hint: "AA1".to_string(),
                quantity: 2.0,
                attributes: ComponentAttributes {
                    tags: Tags::from("envelope"),
                    ..Default::default()
                },
            },
            ComponentRequest {
                family_hint: "Boilers".to_string(),
                quantity: 1.0,
                attributes: ComponentAttributes {
                    size: Some(100.0),
                    exact: true,
                    ..Default::default()
                },
            },
        ];
        let total = ctx.price_components(&requests).unwrap();
        // 31 + (1800 + 700)
        assert!((total - 2531.0).abs() < 1e-9);
        assert_eq!(ctx.ledger().len(), 2);
    }

    #[test]
    fn test_from_config_requires_locale() {
        let store = sample_catalog();
        let config = CostingConfig::default();
        let err = AuditContext::from_config(&store, &config, None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let config = CostingConfig {
            default_locale: Some(Locale::new("ON", "Toronto")),
            extrapolation_pct: 10.0,
            ..Default::default()
        };
        let ctx = AuditContext::from_config(&store, &config, None).unwrap();
        assert_eq!(ctx.locale().city, "Toronto");
        assert_eq!(ctx.extrapolation_pct(), 10.0);
    }

    #[test]
    fn test_at_coordinates_picks_closest_city() {
        let store = sample_catalog();
        let ctx = AuditContext::at_coordinates(&store, 43.7, -79.4).unwrap();
        assert_eq!(ctx.locale(), &Locale::new("ON", "Toronto"));
        assert!(AuditContext::at_coordinates(&CatalogStore::new(), 0.0, 0.0).is_err());
    }

    #[test]
    fn test_finish_builds_rounded_report() {
        let store = sample_catalog();
        let mut ctx = toronto(&store);
        ctx.price("AA1", 2.0, PriceOptions::new().tags("envelope")).unwrap();
        ctx.price("AA1", 1.0 / 3.0, PriceOptions::new().tags("lighting")).unwrap();
        ctx.add_row(ReportRow::new("Wall", 1.0, "m2", 12.346, "envelope"));
        let audit_id = ctx.audit_id();
        let report = ctx.finish().unwrap();
        assert_eq!(report.meta.audit_id, audit_id);
        assert_eq!(report.summary.category("envelope"), Some(31.0));
        assert_eq!(report.summary.category("lighting"), Some(5.17));
        assert_eq!(report.summary.grand_total, 36.17);
        assert_eq!(report.component_totals.category("envelope"), Some(12.35));
        assert_eq!(report.ledger.len(), 2);
        assert!(report.diagnostics.is_empty());
    }
}
