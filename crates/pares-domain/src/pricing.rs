use chrono::NaiveDate;
use serde::Serialize;

use crate::commission::{commission_amount, effective_rate};
use crate::model::{CommissionSettings, Package, Promotion, PromotionType};
use crate::{ValidationError, round_currency};

pub fn is_promotion_live(promotion: &Promotion, today: NaiveDate) -> bool {
    promotion.is_active
        && promotion.start_date.is_none_or(|start| start <= today)
        && promotion.end_date.is_none_or(|end| end >= today)
}

/// Price and session count a customer pays for at checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseQuote {
    pub original_price: f64,
    pub final_price: f64,
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub sessions_total: u32,
    pub bonus_sessions: u32,
}

pub fn quote_purchase(
    package: &Package,
    promotion: Option<&Promotion>,
    commission: &CommissionSettings,
    today: NaiveDate,
) -> Result<PurchaseQuote, ValidationError> {
    let mut final_price = package.price;
    let mut bonus_sessions = 0;

    if let Some(promotion) = promotion {
        if promotion.package_id != package.id || !is_promotion_live(promotion, today) {
            return Err(ValidationError::new(
                "promotionId",
                "Promotion is not available for this package.",
            ));
        }

        match promotion.promotion_type {
            PromotionType::PercentageDiscount => {
                let percentage = promotion.discount_percentage.unwrap_or(0.0).clamp(0.0, 100.0);
                final_price = round_currency(package.price * (1.0 - percentage / 100.0));
            }
            PromotionType::FixedDiscount => {
                let amount = promotion.discount_amount.unwrap_or(0.0).max(0.0);
                final_price = round_currency((package.price - amount).max(0.0));
            }
            PromotionType::BuyXGetY => {
                bonus_sessions = bonus_sessions_for(
                    package.session_count,
                    promotion.buy_quantity.unwrap_or(0),
                    promotion.get_quantity.unwrap_or(0),
                );
            }
        }
    }

    let commission_rate = effective_rate(commission, &package.service_provider_id);
    Ok(PurchaseQuote {
        original_price: package.price,
        final_price,
        commission_rate,
        commission_amount: commission_amount(final_price, commission_rate),
        sessions_total: package.session_count + bonus_sessions,
        bonus_sessions,
    })
}

/// Sessions granted on top of `sessions` by a "buy X get Y" offer.
pub fn bonus_sessions_for(sessions: u32, buy_quantity: u32, get_quantity: u32) -> u32 {
    if buy_quantity == 0 {
        return 0;
    }
    (sessions / buy_quantity) * get_quantity
}
