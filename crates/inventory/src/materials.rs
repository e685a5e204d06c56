//! Bill-of-materials lines enriched with display names and size metrics.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use millops_core::{BomLineId, StockRecordId};

use crate::dimensions::{Metrics, metrics_for_size};
use crate::step::{BillOfMaterialLine, MaterialSource};
use crate::stock::StockRecord;

const SPECIES_KEYS: &[&str] = &["порода", "breed"];
const SIZE_KEYS: &[&str] = &["размер", "size"];
const FALLBACK_NAME: &str = "Material";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    pub id: StockRecordId,
    pub available: Decimal,
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMaterial {
    pub line_id: BomLineId,
    pub name: String,
    pub quantity_per_repeat: Decimal,
    pub unit: Option<String>,
    /// Present when the line references a stock record that was found.
    pub stock: Option<StockSummary>,
    pub per_unit_metrics: Option<Metrics>,
    pub total_metrics: Option<Metrics>,
}

/// Resolve name and metrics for one line.
///
/// `stock` is the record the line references, if it was found. Totals scale
/// every per-unit metric by `quantity_per_repeat × planned`, and are absent
/// when that product is out of range.
pub fn enrich_material(
    line: &BillOfMaterialLine,
    stock: Option<&StockRecord>,
    planned: Decimal,
) -> EnrichedMaterial {
    let size = stock.and_then(|s| s.attribute(SIZE_KEYS));
    let per_unit_metrics = metrics_for_size(size);

    let quantity_per_repeat = line.quantity_per_repeat();
    let factor = quantity_per_repeat
        .checked_mul(planned)
        .and_then(|factor| factor.to_f64());
    let total_metrics = per_unit_metrics
        .zip(factor)
        .map(|(metrics, factor)| metrics.scaled(factor));

    EnrichedMaterial {
        line_id: line.id,
        name: display_name(line, stock),
        quantity_per_repeat,
        unit: line.unit.clone(),
        stock: stock.map(|s| StockSummary {
            id: s.id,
            available: s.quantity,
            size: size.map(str::to_string),
        }),
        per_unit_metrics,
        total_metrics,
    }
}

fn display_name(line: &BillOfMaterialLine, stock: Option<&StockRecord>) -> String {
    if let Some(record) = stock {
        let parts = [
            Some(record.name.as_str()),
            record.attribute(SPECIES_KEYS),
            record.attribute(SIZE_KEYS),
        ];
        let name = parts
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return name;
        }
    }
    match &line.source {
        MaterialSource::Catalog { name, .. } if !name.trim().is_empty() => name.trim().to_string(),
        _ => FALLBACK_NAME.to_string(),
    }
}
