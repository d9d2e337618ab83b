//! Cart and checkout payloads.
//!
//! Cart lines name a service by type; prices come from the
//! `service_charges` price list at submission time, never from the client.

use serde::{Deserialize, Serialize};

use super::SectionRecord;
use crate::collection::Collection;
use crate::error::ValidationError;
use crate::filing::PaymentMethod;
use crate::money::Money;
use crate::validation::{self, Validate, MAX_SHORT_TEXT};

fn one() -> u32 {
    1
}

/// One requested service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub service_type: String,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Unit price, filled in from the price list when the cart is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Money>,
    /// `unit_price * quantity`, filled in when the cart is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_total: Option<Money>,
}

impl CartItem {
    /// Price this line at `unit_price`.
    pub fn priced(mut self, unit_price: Money) -> Self {
        self.line_total = Some(unit_price.times(self.quantity));
        self.unit_price = Some(unit_price);
        self
    }
}

impl Validate for CartItem {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("cart.items.serviceType", &self.service_type)?;
        if self.quantity == 0 {
            return Err(ValidationError::Invalid {
                field: "cart.items.quantity",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl SectionRecord for CartItem {
    const COLLECTION: Collection = Collection::CartItems;
}

/// Cart step payload. The item list replaces any saved cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of priced line totals. Unpriced lines count as zero.
    pub fn total(items: &[CartItem]) -> Money {
        Money::sum(items.iter().filter_map(|i| i.line_total))
    }
}

impl Validate for Cart {
    fn validate(&self) -> Result<(), ValidationError> {
        self.items.validate()
    }
}

/// Checkout step payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_reference: Option<String>,
    /// Defaults to the cart total when absent.
    #[serde(default)]
    pub amount: Option<Money>,
}

impl Validate for Checkout {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(reference) = &self.transaction_reference {
            validation::require_text("checkout.transactionReference", reference)?;
        }
        validation::opt_max_len(
            "checkout.transactionReference",
            self.transaction_reference.as_deref(),
            MAX_SHORT_TEXT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantity_defaults_to_one() {
        let item: CartItem = serde_json::from_value(json!({"serviceType": "salaried_filing"})).unwrap();
        assert_eq!(item.quantity, 1);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let item: CartItem =
            serde_json::from_value(json!({"serviceType": "ntn_registration", "quantity": 0})).unwrap();
        assert!(item.validate().is_err());
    }

    #[test]
    fn pricing_sets_line_total() {
        let item: CartItem =
            serde_json::from_value(json!({"serviceType": "wealth_statement", "quantity": 3})).unwrap();
        let priced = item.priced(Money::from_rupees(1500));
        assert_eq!(priced.line_total, Some(Money::from_rupees(4500)));
        assert_eq!(Cart::total(&[priced]), Money::from_rupees(4500));
    }

    #[test]
    fn checkout_rejects_unknown_method() {
        let res = serde_json::from_value::<Checkout>(json!({"paymentMethod": "cheque"}));
        assert!(res.is_err());
        let ok: Checkout = serde_json::from_value(json!({"paymentMethod": "jazzcash"})).unwrap();
        assert_eq!(ok.payment_method, PaymentMethod::Jazzcash);
    }
}
