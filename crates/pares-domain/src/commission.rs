use serde::Deserialize;

use crate::model::{CommissionSettings, CustomCommissionRate};
use crate::{ValidationError, round_currency};

/// Rate applied to a sale by `provider_id`: the provider's custom rate when
/// one is configured, otherwise the default, clamped to the allowed band.
pub fn effective_rate(settings: &CommissionSettings, provider_id: &str) -> f64 {
    let rate = settings
        .custom_rates
        .iter()
        .find(|custom| custom.service_provider_id == provider_id)
        .map_or(settings.default_rate, |custom| custom.rate);

    if settings.minimum_rate <= settings.maximum_rate {
        rate.clamp(settings.minimum_rate, settings.maximum_rate)
    } else {
        rate
    }
}

pub fn commission_amount(price: f64, rate: f64) -> f64 {
    round_currency(price * rate / 100.0)
}

pub fn validate_settings(settings: &CommissionSettings) -> Result<(), ValidationError> {
    let rates = [
        ("defaultRate", settings.default_rate),
        ("minimumRate", settings.minimum_rate),
        ("maximumRate", settings.maximum_rate),
    ];
    for (field, rate) in rates {
        ensure_percentage(field, rate)?;
    }

    if settings.minimum_rate > settings.maximum_rate {
        return Err(ValidationError::new(
            "minimumRate",
            "Minimum rate cannot exceed the maximum rate.",
        ));
    }
    if settings.default_rate < settings.minimum_rate
        || settings.default_rate > settings.maximum_rate
    {
        return Err(ValidationError::new(
            "defaultRate",
            "Default rate must lie between the minimum and maximum rates.",
        ));
    }

    for (field, fee) in [
        ("featuredPackageFee", settings.featured_package_fee),
        ("verificationFee", settings.verification_fee),
    ] {
        if !fee.is_finite() || fee < 0.0 {
            return Err(ValidationError::new(field, "Fees cannot be negative."));
        }
    }

    for custom in &settings.custom_rates {
        if custom.service_provider_id.trim().is_empty() {
            return Err(ValidationError::new(
                "customRates",
                "Each custom rate needs a service provider.",
            ));
        }
        ensure_percentage("customRates", custom.rate)?;
    }

    Ok(())
}

fn ensure_percentage(field: &'static str, rate: f64) -> Result<(), ValidationError> {
    if rate.is_finite() && (0.0..=100.0).contains(&rate) {
        Ok(())
    } else {
        Err(ValidationError::new(field, "Rates must be between 0 and 100."))
    }
}

/// Partial update accepted by the admin commission screen.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSettingsPatch {
    pub default_rate: Option<f64>,
    pub minimum_rate: Option<f64>,
    pub maximum_rate: Option<f64>,
    pub featured_package_fee: Option<f64>,
    pub verification_fee: Option<f64>,
    pub custom_rates: Option<Vec<CustomCommissionRate>>,
}

impl CommissionSettingsPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merges the patch over `current` and validates the result.
    pub fn apply(self, current: &CommissionSettings) -> Result<CommissionSettings, ValidationError> {
        let merged = CommissionSettings {
            default_rate: self.default_rate.unwrap_or(current.default_rate),
            minimum_rate: self.minimum_rate.unwrap_or(current.minimum_rate),
            maximum_rate: self.maximum_rate.unwrap_or(current.maximum_rate),
            featured_package_fee: self
                .featured_package_fee
                .unwrap_or(current.featured_package_fee),
            verification_fee: self.verification_fee.unwrap_or(current.verification_fee),
            custom_rates: self
                .custom_rates
                .unwrap_or_else(|| current.custom_rates.clone()),
        };
        validate_settings(&merged)?;
        Ok(merged)
    }
}
