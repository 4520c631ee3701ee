//! Quotation total calculation.
//!
//! One pure function shared by every render path (in-app summary, reminder
//! email, invoice) so the figures can never drift apart. The order of
//! operations is contractual: base → discounts → clamp at zero → tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub service_type_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub service_days: u32,
    /// Optional surcharge percentage for off-hours pickups.
    pub time_adjustment_pct: Option<Decimal>,
}

impl ServiceItem {
    /// Charter services price per day regardless of passenger count.
    fn is_charter(&self) -> bool {
        self.service_type_name.to_lowercase().contains("charter")
    }

    fn base_price(&self) -> Decimal {
        let days = Decimal::from(self.service_days.max(1));
        if self.is_charter() {
            self.unit_price * days
        } else {
            self.unit_price * Decimal::from(self.quantity.max(1)) * days
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingInput {
    pub items: Vec<ServiceItem>,
    /// Stored amount used when a quotation predates line items.
    pub fallback_amount: Decimal,
    pub package_price: Option<Decimal>,
    pub discount_percentage: Decimal,
    pub tax_percentage: Decimal,
    pub promotion: Option<Promotion>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub service_base_total: Decimal,
    pub time_adjustment_total: Decimal,
    pub service_total: Decimal,
    pub package_total: Decimal,
    pub base_total: Decimal,
    pub promotion_discount: Decimal,
    pub regular_discount: Decimal,
    pub total_discount: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

pub fn compute_totals(input: &PricingInput) -> PricingBreakdown {
    let hundred = Decimal::from(100);

    let mut service_base_total = Decimal::ZERO;
    let mut time_adjustment_total = Decimal::ZERO;

    if input.items.is_empty() {
        service_base_total = input.fallback_amount;
    } else {
        for item in &input.items {
            let item_base = item.base_price();
            service_base_total += item_base;

            if let Some(adjustment_pct) = item.time_adjustment_pct {
                time_adjustment_total += item_base * adjustment_pct / hundred;
            }
        }
    }

    let service_total = service_base_total + time_adjustment_total;
    let package_total = input.package_price.unwrap_or(Decimal::ZERO);
    let base_total = service_total + package_total;

    let promotion_discount = match &input.promotion {
        Some(promotion) => match promotion.discount_type {
            DiscountType::Percentage => base_total * promotion.discount_value / hundred,
            DiscountType::Fixed => promotion.discount_value,
        },
        None => Decimal::ZERO,
    };
    let regular_discount = base_total * input.discount_percentage / hundred;
    let total_discount = promotion_discount + regular_discount;

    // Clamp happens before tax: tax is never charged on a negative base.
    let subtotal = (base_total - total_discount).max(Decimal::ZERO);
    let tax_amount = subtotal * input.tax_percentage / hundred;
    let total = subtotal + tax_amount;

    PricingBreakdown {
        service_base_total,
        time_adjustment_total,
        service_total,
        package_total,
        base_total,
        promotion_discount,
        regular_discount,
        total_discount,
        subtotal,
        tax_amount,
        total,
    }
}
