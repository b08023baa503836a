//! Material-input mapper from the `SLJobmatls` IDO (Type `S`).
//!
//! Pure lookup import: the external item code must match an existing
//! MaterialItem; shape, dimensions and price category come from the matched
//! item. When the item is missing the row maps to no `material_item_id` and
//! the dispatcher records it as an error - material items must be imported
//! first.
//!
//! The quantity field `MatlQtyConv` is reinterpreted by unit:
//!   `mm`            → cut length (stock_length)
//!   `ks`/`pcs`/`ea` → rounded piece count
//!   anything else   → stored raw
//!
//! This mapper bypasses the kernel's execute path: the sync dispatcher
//! performs the inline upsert because material inputs also maintain the
//! material-operation link table.

use serde_json::Value;
use std::collections::HashMap;

use super::kernel::{self, FieldMapping, ImporterConfig, MappedRow};
use crate::errors::Result;
use crate::materials::{MaterialInputUpsert, MaterialItem};
use gestima_infor::RawRow;

pub struct JobMaterialsImporter {
    config: ImporterConfig,
    part_id: i64,
    /// Pre-loaded MaterialItems keyed by external code.
    material_items: HashMap<String, MaterialItem>,
    /// Pre-loaded `(part_id, seq) → operation id` index.
    operations: HashMap<(i64, i32), i64>,
}

impl JobMaterialsImporter {
    pub fn new(
        part_id: i64,
        material_items: HashMap<String, MaterialItem>,
        operations: HashMap<(i64, i32), i64>,
    ) -> Self {
        Self {
            config: ImporterConfig {
                entity_name: "MaterialInput",
                ido_name: "SLJobmatls",
                field_mappings: vec![
                    FieldMapping::new("ItmItem", "article_number").required(),
                    FieldMapping::new("Item", "material_item_code").required(),
                    FieldMapping::new("OperNum", "operation_seq").with_transform(kernel::to_i64),
                    FieldMapping::new("MatlQtyConv", "matl_qty").with_transform(kernel::to_f64),
                    FieldMapping::new("UM", "unit"),
                ],
                duplicate_check_field: "material_item_code",
            },
            part_id,
            material_items,
            operations,
        }
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// Maps one raw row. Returns `None` when no MaterialItem matches the
    /// external code (router-side error, nothing is created).
    pub fn map_row(&self, raw: &RawRow) -> Option<MappedRow> {
        let mut mapped = kernel::apply_basic_mapping(&self.config, raw);

        let code = kernel::row_str(&mapped, "material_item_code")?;
        let item = self.material_items.get(&code)?;

        mapped.insert("material_item_id".to_string(), Value::from(item.id));
        mapped.insert(
            "price_category_id".to_string(),
            item.price_category_id.map(Value::from).unwrap_or(Value::Null),
        );
        mapped.insert(
            "stock_shape".to_string(),
            item.stock_shape
                .map(|s| Value::from(s.as_str()))
                .unwrap_or(Value::Null),
        );

        // Start from the item's dimensions; the unit interpretation below may
        // override the cut length.
        for (key, value) in [
            ("stock_diameter", item.stock_diameter),
            ("stock_length", item.stock_length),
            ("stock_width", item.stock_width),
            ("stock_height", item.stock_height),
            ("stock_wall_thickness", item.stock_wall_thickness),
        ] {
            mapped.insert(
                key.to_string(),
                value.map(Value::from).unwrap_or(Value::Null),
            );
        }

        let qty = kernel::row_f64(&mapped, "matl_qty");
        let unit = kernel::row_str(&mapped, "unit")
            .unwrap_or_default()
            .to_lowercase();

        // Only mm and piece units translate into the quantity/length fields;
        // other units (kg, m, ...) keep the raw value in `matl_qty` and the
        // piece count stays at 1.
        let mut quantity = 1.0;
        match (unit.as_str(), qty) {
            ("mm", Some(q)) => {
                mapped.insert("stock_length".to_string(), Value::from(q));
            }
            ("ks" | "pcs" | "ea", Some(q)) => {
                quantity = q.round().max(1.0);
            }
            _ => {}
        }
        mapped.insert("quantity".to_string(), Value::from(quantity));

        Some(mapped)
    }

    /// Converts a mapped row into the repository upsert payload, resolving
    /// the operation link through the pre-loaded index.
    pub fn to_upsert(&self, mapped: &MappedRow, seq: i32) -> MaterialInputUpsert {
        let operation_id = kernel::row_i64(mapped, "operation_seq")
            .and_then(|op_seq| self.operations.get(&(self.part_id, op_seq as i32)).copied());

        MaterialInputUpsert {
            material_item_id: kernel::row_i64(mapped, "material_item_id").unwrap_or(0),
            seq,
            price_category_id: kernel::row_i64(mapped, "price_category_id"),
            stock_shape: kernel::row_str(mapped, "stock_shape")
                .as_deref()
                .map(crate::parts::StockShape::parse),
            stock_diameter: kernel::row_f64(mapped, "stock_diameter"),
            stock_length: kernel::row_f64(mapped, "stock_length"),
            stock_width: kernel::row_f64(mapped, "stock_width"),
            stock_height: kernel::row_f64(mapped, "stock_height"),
            stock_wall_thickness: kernel::row_f64(mapped, "stock_wall_thickness"),
            quantity: kernel::row_f64(mapped, "quantity").unwrap_or(1.0),
            notes: kernel::row_str(mapped, "material_item_code")
                .map(|code| format!("Infor sync: {code}")),
            operation_id,
        }
    }

    pub fn part_id(&self) -> i64 {
        self.part_id
    }
}
