//! Line-item bookkeeping and invoice totals.
//!
//! The ledger's item list is the only source of truth: totals are
//! summed from it on every read, and any display is a projection of
//! `items()`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;

/// Ledger-assigned identity of a line item. Never reused within one
/// ledger, so a stale selection cannot hit a different item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

/// One product or service row. Immutable once added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    id: ItemId,
    name: String,
    unit_price: Decimal,
    quantity: u32,
}

impl LineItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Flat tax applied to the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    /// Fraction, e.g. `0.15` for 15%.
    pub rate: Decimal,
}

impl TaxPolicy {
    pub fn new(rate: Decimal) -> Self {
        TaxPolicy { rate }
    }

    pub fn tax_on(&self, subtotal: Decimal) -> Decimal {
        subtotal * self.rate
    }

    /// Rates below zero would make the grand total smaller than the
    /// subtotal.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rate.is_sign_negative() && !self.rate.is_zero() {
            return Err(ValidationError::InvalidTaxRate(self.rate.to_string()));
        }
        Ok(())
    }
}

impl Default for TaxPolicy {
    /// 15% VAT.
    fn default() -> Self {
        TaxPolicy {
            rate: Decimal::new(15, 2),
        }
    }
}

/// Totals snapshot handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    items: Vec<LineItem>,
    next_id: u64,
    tax: TaxPolicy,
}

impl Ledger {
    /// Empty ledger with the default 15% tax.
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn with_tax_policy(tax: TaxPolicy) -> Self {
        Ledger {
            tax,
            ..Ledger::default()
        }
    }

    pub fn tax_policy(&self) -> TaxPolicy {
        self.tax
    }

    /// Validate and append an item. On error the ledger is untouched.
    pub fn add_item(
        &mut self,
        name: &str,
        unit_price: Decimal,
        quantity: i64,
    ) -> Result<LineItem, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyItemName);
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(ValidationError::InvalidUnitPrice(unit_price.to_string()));
        }
        // Fold "-0" into plain zero so it never prints with a sign.
        let unit_price = if unit_price.is_zero() {
            Decimal::ZERO
        } else {
            unit_price
        };
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| ValidationError::InvalidQuantity(quantity.to_string()))?;
        self.check_headroom(unit_price, quantity)?;

        let item = LineItem {
            id: ItemId(self.next_id),
            name: name.to_string(),
            unit_price,
            quantity,
        };
        self.next_id += 1;
        self.items.push(item.clone());
        debug!(
            id = item.id.0,
            name = %item.name,
            line_total = %item.line_total(),
            subtotal = %self.subtotal(),
            "line item added"
        );
        Ok(item)
    }

    /// The item's line total and the totals it would produce must all fit
    /// in a `Decimal`.
    fn check_headroom(&self, unit_price: Decimal, quantity: u32) -> Result<(), ValidationError> {
        let too_large = || ValidationError::AmountTooLarge(unit_price.to_string());
        let line_total = unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(too_large)?;
        let subtotal = self
            .subtotal()
            .checked_add(line_total)
            .ok_or_else(too_large)?;
        let tax = subtotal.checked_mul(self.tax.rate).ok_or_else(too_large)?;
        subtotal.checked_add(tax).ok_or_else(too_large)?;
        Ok(())
    }

    /// Add from raw form text: a decimal price and an integer quantity.
    pub fn add_item_from_input(
        &mut self,
        name: &str,
        unit_price: &str,
        quantity: &str,
    ) -> Result<LineItem, ValidationError> {
        let price_text = unit_price.trim();
        let price = Decimal::from_str(price_text)
            .or_else(|_| Decimal::from_scientific(price_text))
            .map_err(|_| ValidationError::InvalidUnitPrice(unit_price.to_string()))?;
        let qty = quantity
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidQuantity(quantity.to_string()))?;
        self.add_item(name, price, qty)
    }

    /// Remove the item with `id`. Unknown ids are ignored.
    pub fn remove_item(&mut self, id: ItemId) -> Option<LineItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        self.remove_at(index)
    }

    /// Remove by display position. Out-of-range indexes are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<LineItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        debug!(id = removed.id.0, subtotal = %self.subtotal(), "line item removed");
        Some(removed)
    }

    /// Remove whatever the user has selected; no selection is a no-op.
    pub fn remove_selected(&mut self, selection: Option<ItemId>) -> Option<LineItem> {
        selection.and_then(|id| self.remove_item(id))
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn tax_amount(&self) -> Decimal {
        self.tax.tax_on(self.subtotal())
    }

    pub fn grand_total(&self) -> Decimal {
        let subtotal = self.subtotal();
        subtotal + self.tax.tax_on(subtotal)
    }

    pub fn totals(&self) -> InvoiceTotals {
        let subtotal = self.subtotal();
        let tax_amount = self.tax.tax_on(subtotal);
        InvoiceTotals {
            subtotal,
            tax_rate: self.tax.rate,
            tax_amount,
            grand_total: subtotal + tax_amount,
        }
    }
}
