use serde::Serialize;

use crate::model::{PackagePurchase, PaymentStatus, ServiceProvider, User, UserType};
use crate::{ValidationError, non_empty_filter, round_currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminUserAction {
    Activate,
    Deactivate,
    Verify,
    Unverify,
}

impl AdminUserAction {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "activate" => Ok(Self::Activate),
            "deactivate" => Ok(Self::Deactivate),
            "verify" => Ok(Self::Verify),
            "unverify" => Ok(Self::Unverify),
            _ => Err(ValidationError::new("action", "Unknown action.")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Verify => "verify",
            Self::Unverify => "unverify",
        }
    }

    /// Applies the action. Verification only touches provider profiles and
    /// is a no-op for other accounts.
    pub fn apply(self, user: &mut User, provider: Option<&mut ServiceProvider>) {
        match self {
            Self::Activate => user.is_active = true,
            Self::Deactivate => user.is_active = false,
            Self::Verify | Self::Unverify => {
                if let Some(provider) = provider {
                    provider.is_verified = self == Self::Verify;
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminUserFilter {
    pub user_type: Option<UserType>,
    pub search: Option<String>,
    pub active: Option<bool>,
}

impl AdminUserFilter {
    pub fn from_query(
        user_type: Option<&str>,
        search: Option<&str>,
        status: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let user_type = match non_empty_filter(user_type) {
            Some(raw) => Some(
                UserType::parse(&raw)
                    .ok_or_else(|| ValidationError::new("userType", "Unknown user type."))?,
            ),
            None => None,
        };
        let active = match non_empty_filter(status).as_deref() {
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            Some(_) => {
                return Err(ValidationError::new(
                    "status",
                    "Status must be active, inactive or all.",
                ));
            }
            None => None,
        };
        Ok(Self {
            user_type,
            search: search
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_lowercase),
            active,
        })
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.user_type.is_some_and(|user_type| user.user_type != user_type) {
            return false;
        }
        if let Some(search) = self.search.as_deref() {
            let hit = user.first_name.to_lowercase().contains(search)
                || user.last_name.to_lowercase().contains(search)
                || user.email.to_lowercase().contains(search);
            if !hit {
                return false;
            }
        }
        self.active.is_none_or(|active| user.is_active == active)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProviderSummary {
    pub id: String,
    pub business_name: Option<String>,
    pub is_verified: bool,
    pub rating: f64,
    pub total_sales: f64,
    pub commission: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<AdminProviderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_count: Option<u32>,
}

impl AdminUserView {
    pub fn build(
        user: &User,
        providers: &[ServiceProvider],
        purchases: &[PackagePurchase],
    ) -> Self {
        let paid = |purchase: &&PackagePurchase| purchase.payment_status == PaymentStatus::Completed;
        match user.user_type {
            UserType::ServiceProvider => {
                let summary = providers
                    .iter()
                    .find(|provider| provider.user_id == user.id)
                    .map(|provider| {
                        let sales = purchases
                            .iter()
                            .filter(|purchase| purchase.service_provider_id == provider.id)
                            .filter(paid);
                        let (total_sales, commission) =
                            sales.fold((0.0, 0.0), |(sales, commission), purchase| {
                                (
                                    sales + purchase.final_price,
                                    commission + purchase.commission_amount,
                                )
                            });
                        AdminProviderSummary {
                            id: provider.id.clone(),
                            business_name: provider.business_name.clone(),
                            is_verified: provider.is_verified,
                            rating: provider.rating,
                            total_sales: round_currency(total_sales),
                            commission: round_currency(commission),
                        }
                    });
                Self {
                    user: user.clone(),
                    service_provider: summary,
                    total_spent: None,
                    package_count: None,
                }
            }
            UserType::Customer => {
                let bought: Vec<&PackagePurchase> = purchases
                    .iter()
                    .filter(|purchase| purchase.customer_id == user.id)
                    .filter(paid)
                    .collect();
                Self {
                    user: user.clone(),
                    service_provider: None,
                    total_spent: Some(round_currency(
                        bought.iter().map(|purchase| purchase.final_price).sum(),
                    )),
                    package_count: Some(bought.len() as u32),
                }
            }
            UserType::Admin => Self {
                user: user.clone(),
                service_provider: None,
                total_spent: None,
                package_count: None,
            },
        }
    }
}
