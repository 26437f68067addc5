//! Cart line payloads.
//!
//! `AddCartLine` is the request body for adding a product to the current
//! cart. Its value doubles as the identity of an in-flight add request, so
//! it is `Eq + Hash`.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Request to add one product line to the current cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartLine {
    /// Product being added.
    pub product_id: Uuid,
    /// Quantity ordered, in `unit_of_measure` units.
    pub qty_ordered: Decimal,
    /// Unit of measure code (empty = product default).
    #[serde(default)]
    pub unit_of_measure: String,
    /// Free-form line notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Custom line properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl AddCartLine {
    /// Create a line for `qty_ordered` units of `product_id` in the default unit of measure.
    pub fn new(product_id: Uuid, qty_ordered: Decimal) -> Self {
        Self {
            product_id,
            qty_ordered,
            unit_of_measure: String::new(),
            notes: None,
            properties: BTreeMap::new(),
        }
    }

    /// Set the unit of measure.
    pub fn with_unit_of_measure(mut self, uom: impl Into<String>) -> Self {
        self.unit_of_measure = uom.into();
        self
    }

    /// Set line notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Add a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Check the quantity is positive.
    ///
    /// The backend is the authority on line validity; this is for callers
    /// that want to refuse obviously bad input (e.g. CLI arguments) early.
    ///
    /// # Errors
    /// `InvalidQuantity` if the quantity is zero or negative.
    pub fn validate(&self) -> Result<()> {
        if self.qty_ordered <= Decimal::ZERO {
            return Err(CoreError::InvalidQuantity(format!(
                "{} for product {}",
                self.qty_ordered, self.product_id
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AddCartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit_of_measure.is_empty() {
            write!(f, "{} x {}", self.qty_ordered, self.product_id)
        } else {
            write!(
                f,
                "{} {} x {}",
                self.qty_ordered, self.unit_of_measure, self.product_id
            )
        }
    }
}

/// A line in a cart, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Server-assigned line ID.
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub product_name: Option<String>,
    pub qty_ordered: Decimal,
    #[serde(default)]
    pub unit_of_measure: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Position of the line within the cart.
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Collection of cart lines (batch add response).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineList {
    #[serde(default)]
    pub cart_lines: Vec<CartLine>,
}
