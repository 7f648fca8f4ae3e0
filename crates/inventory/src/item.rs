use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ItemId};

use crate::stock::validate_quantity;

/// An inventory item as stored in the `items` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn create(id: ItemId, new: NewItem, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            quantity: new.quantity,
            price: new.price,
            category: new.category,
            created_at,
        }
    }

    /// Return the item with `patch` applied. The patch is assumed validated.
    pub fn patched(&self, patch: &ItemPatch) -> Self {
        Self {
            id: self.id,
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            quantity: patch.quantity.unwrap_or(self.quantity),
            price: patch.price.unwrap_or(self.price),
            category: patch.category.clone().or_else(|| self.category.clone()),
            created_at: self.created_at,
        }
    }

    pub fn is_below(&self, threshold: i64) -> bool {
        self.quantity < threshold
    }

    /// `quantity * price`.
    pub fn stock_value(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// Validated input for creating an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub category: Option<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, quantity: i64, price: f64, category: Option<String>) -> DomainResult<Self> {
        Ok(Self {
            name: validate_name(name.into())?,
            quantity: validate_quantity(quantity)?,
            price: validate_price(price)?,
            category,
        })
    }
}

/// Partial update of an item's editable fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none() && self.price.is_none() && self.category.is_none()
    }

    pub fn validate(self) -> DomainResult<Self> {
        if self.is_empty() {
            return Err(DomainError::validation("no valid fields provided for update"));
        }
        Ok(Self {
            name: self.name.map(validate_name).transpose()?,
            quantity: self.quantity.map(validate_quantity).transpose()?,
            price: self.price.map(validate_price).transpose()?,
            category: self.category,
        })
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: f64) -> DomainResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price cannot be negative"));
    }
    Ok(price)
}
