use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millops_core::{ItemKindId, ShelfId, StockRecordId, WarehouseId};

/// A (warehouse, shelf) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub warehouse_id: WarehouseId,
    pub shelf_id: ShelfId,
}

impl Location {
    pub fn new(warehouse_id: WarehouseId, shelf_id: ShelfId) -> Self {
        Self {
            warehouse_id,
            shelf_id,
        }
    }
}

/// Free-form key/value attribute (species, size, grade, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A countable quantity of one item kind at one location.
///
/// `quantity` is never negative; only the step-result and relocation services
/// mutate it, always under a row lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: StockRecordId,
    pub item_kind: ItemKindId,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub quantity: Decimal,
    pub location: Location,
}

impl StockRecord {
    /// First attribute whose key matches one of `aliases` case-insensitively,
    /// provided its value is non-empty.
    pub fn attribute(&self, aliases: &[&str]) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| {
                let key = a.key.to_lowercase();
                aliases.iter().any(|alias| key == *alias)
            })
            .map(|a| a.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Attribute set with lower-cased keys, sorted; the identity used when
    /// matching records across locations.
    pub fn normalized_attributes(&self) -> Vec<(String, String)> {
        normalize(&self.attributes)
    }

    /// Same item kind and the same normalized attribute set.
    pub fn is_compatible_with(&self, other: &StockRecord) -> bool {
        self.item_kind == other.item_kind
            && self.normalized_attributes() == other.normalized_attributes()
    }
}

fn normalize(attributes: &[Attribute]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = attributes
        .iter()
        .map(|a| (a.key.to_lowercase(), a.value.clone()))
        .collect();
    pairs.sort();
    pairs
}

/// A stock record about to be created (identity assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockRecord {
    pub item_kind: ItemKindId,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub quantity: Decimal,
    pub location: Location,
}

impl NewStockRecord {
    /// Copy of `source`'s identity (kind, name, attributes) at another location.
    pub fn split_from(source: &StockRecord, location: Location, quantity: Decimal) -> Self {
        Self {
            item_kind: source.item_kind,
            name: source.name.clone(),
            attributes: source.attributes.clone(),
            quantity,
            location,
        }
    }

    pub fn with_id(self, id: StockRecordId) -> StockRecord {
        StockRecord {
            id,
            item_kind: self.item_kind,
            name: self.name,
            attributes: self.attributes,
            quantity: self.quantity,
            location: self.location,
        }
    }
}
