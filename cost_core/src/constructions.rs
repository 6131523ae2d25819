//! # Construction Costing
//!
//! Envelope costs are priced per ft² of construction. Each construction in the
//! library is a stack of material layers, each layer a cost item times a
//! quantity per ft². Costing every construction of one construction type at a
//! locale yields a cost curve over thermal resistance, and a surface of any
//! RSI is then priced off that curve.
//!
//! Glazing is keyed by `1/U`, so the same curve machinery applies; pass a
//! glazing U-value through [`Rsi::from`].

use serde::{Deserialize, Serialize};

use crate::assembler::AuditContext;
use crate::catalog::{CatalogStore, ConstructionKind, ConstructionRow};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::CostResult;
use crate::interpolation::{CostCurve, CurveLookup};
use crate::ledger::Tags;
use crate::localization::Locale;
use crate::report::{round_cents, ReportRow};
use crate::units::{Rsi, SqFt, SqM};

/// Cost of one material layer per ft²
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCost {
    pub material_index: String,
    pub catalog_id: String,
    pub quantity: f64,
    pub cost: f64,
}

/// Cost of one construction per ft²
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionCost {
    pub construction_type_name: String,
    pub kind: ConstructionKind,
    /// RSI for opaque, `1/U` for glazing
    pub x: Option<f64>,
    pub layers: Vec<LayerCost>,
    pub total: f64,
}

/// Price a construction from its layers at a locale.
///
/// Each layer is rounded to cents. The equipment component is not localized.
pub fn cost_construction(
    catalog: &CatalogStore,
    construction: &ConstructionRow,
    locale: &Locale,
    diagnostics: &mut Diagnostics,
) -> CostResult<ConstructionCost> {
    let mut layers = Vec::with_capacity(construction.material_layers.len());
    for index in &construction.material_layers {
        let material = catalog.construction_material(index)?;
        let item = catalog.get_catalog_item(&material.catalog_id)?;
        let factors = catalog.localization().resolve(locale, &item.id, diagnostics);

        // glazing rows list their area-based layers with a blank quantity
        let quantity = if construction.kind == ConstructionKind::Glazing && material.quantity == 0.0 {
            1.0
        } else {
            material.quantity
        };

        let unit = item.material_op_cost * material.material_mult * factors.material.fraction()
            + item.labor_op_cost * material.labour_mult * factors.installation.fraction()
            + item.equipment_op_cost;
        layers.push(LayerCost {
            material_index: material.material_index.clone(),
            catalog_id: item.id.clone(),
            quantity,
            cost: round_cents(unit * quantity),
        });
    }

    let total = round_cents(layers.iter().map(|l| l.cost).sum());
    Ok(ConstructionCost {
        construction_type_name: construction.construction_type_name.clone(),
        kind: construction.kind,
        x: construction.curve_x(),
        layers,
        total,
    })
}

/// Cost curve `(x, cost per ft²)` of every construction of one type.
///
/// An unknown type gives an empty curve.
pub fn construction_curve(
    catalog: &CatalogStore,
    type_name: &str,
    locale: &Locale,
    diagnostics: &mut Diagnostics,
) -> CostResult<CostCurve> {
    let mut points = Vec::new();
    for construction in catalog.constructions_of_type(type_name) {
        let costed = cost_construction(catalog, construction, locale, diagnostics)?;
        if let Some(x) = costed.x {
            points.push((x, costed.total));
        }
    }
    Ok(CostCurve::new(points))
}

/// Priced envelope surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCost {
    pub construction_type_name: String,
    pub rsi: f64,
    pub area: SqM,
    pub cost_per_sqft: f64,
    pub cost: f64,
    pub lookup: CurveLookup,
    pub note: Option<String>,
}

/// Price a surface of `area` at thermal resistance `rsi` off its
/// construction type's curve, and add a report row for it.
///
/// Beyond the extrapolation band the cost is 0, with a note and a
/// diagnostic.
pub fn cost_surface(
    ctx: &mut AuditContext<'_>,
    type_name: &str,
    rsi: Rsi,
    area: SqM,
    tags: impl Into<Tags>,
) -> CostResult<SurfaceCost> {
    let locale = ctx.locale().clone();
    let curve = construction_curve(ctx.catalog(), type_name, &locale, ctx.diagnostics_mut())?;
    let lookup = curve.lookup(rsi.0, ctx.extrapolation_pct());

    let note = match lookup {
        CurveLookup::Interpolated { .. } => None,
        CurveLookup::Extrapolated { range, .. } => Some(format!(
            "RSI {:.3} extrapolated from '{}' library range {:.3} to {:.3}",
            rsi.0, type_name, range.0, range.1
        )),
        CurveLookup::OutOfRange { range } => {
            let message = format!(
                "RSI {:.3} is outside '{}' library range {:.3} to {:.3} beyond the {}% band; cost set to 0",
                rsi.0,
                type_name,
                range.0,
                range.1,
                ctx.extrapolation_pct()
            );
            record_out_of_range(ctx, type_name, rsi.0, Some(range), &message);
            Some(message)
        }
        CurveLookup::Empty => {
            let message = format!("No cost found for construction type '{type_name}'; cost set to 0");
            record_out_of_range(ctx, type_name, rsi.0, None, &message);
            Some(message)
        }
    };

    let cost_per_sqft = lookup.cost().unwrap_or(0.0);
    let sqft: SqFt = area.into();
    let cost = cost_per_sqft * sqft.0;

    let mut row_tags: Tags = tags.into();
    row_tags.push("envelope");
    let mut row = ReportRow::new(type_name, area.0, "m2", cost, row_tags);
    if let Some(n) = &note {
        row = row.with_note(n.clone());
    }
    ctx.add_row(row);

    Ok(SurfaceCost {
        construction_type_name: type_name.to_string(),
        rsi: rsi.0,
        area,
        cost_per_sqft,
        cost,
        lookup,
        note,
    })
}

fn record_out_of_range(
    ctx: &mut AuditContext<'_>,
    construction: &str,
    x: f64,
    range: Option<(f64, f64)>,
    message: &str,
) {
    let is_new = ctx.diagnostics_mut().record(Diagnostic::InterpolationOutOfRange {
        construction: construction.to_string(),
        x,
        range,
        message: message.to_string(),
    });
    if is_new {
        tracing::warn!(construction, x, "{message}");
    }
}
