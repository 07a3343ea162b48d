use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Category, Package, Promotion, ServiceProvider};
use crate::pricing::is_promotion_live;
use crate::{ValidationError, contains_ignore_case, non_empty_filter};

/// Borrowed view over the catalogue collections.
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    pub packages: &'a [Package],
    pub providers: &'a [ServiceProvider],
    pub categories: &'a [Category],
    pub promotions: &'a [Promotion],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured_only: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl PackageFilter {
    /// Builds a filter from raw query-string values. `category=all` and empty
    /// values are ignored; prices must parse as numbers.
    pub fn from_query(
        category: Option<&str>,
        search: Option<&str>,
        featured: Option<&str>,
        min_price: Option<&str>,
        max_price: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            category: non_empty_filter(category),
            search: search
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_lowercase),
            featured_only: featured.is_some_and(|value| value.trim() == "true"),
            min_price: parse_price("minPrice", min_price)?,
            max_price: parse_price("maxPrice", max_price)?,
        })
    }

    pub fn matches(&self, package: &Package, provider: Option<&ServiceProvider>) -> bool {
        if !package.is_active {
            return false;
        }

        if let Some(category) = self.category.as_deref() {
            if package.category_id.as_deref() != Some(category) {
                return false;
            }
        }

        if let Some(search) = self.search.as_deref() {
            let hit = package.title.to_lowercase().contains(search)
                || contains_ignore_case(package.description.as_deref(), search)
                || contains_ignore_case(
                    provider.and_then(|provider| provider.business_name.as_deref()),
                    search,
                );
            if !hit {
                return false;
            }
        }

        if self.featured_only && !package.is_featured {
            return false;
        }

        if self.min_price.is_some_and(|min| package.price < min) {
            return false;
        }

        if self.max_price.is_some_and(|max| package.price > max) {
            return false;
        }

        true
    }
}

fn parse_price(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ValidationError::new(field, "must be a number")),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: String,
    pub business_name: Option<String>,
    pub location_city: Option<String>,
    pub location_district: Option<String>,
    pub rating: f64,
    pub total_reviews: u32,
    pub is_verified: bool,
}

impl From<&ServiceProvider> for ProviderSummary {
    fn from(provider: &ServiceProvider) -> Self {
        Self {
            id: provider.id.clone(),
            business_name: provider.business_name.clone(),
            location_city: provider.location_city.clone(),
            location_district: provider.location_district.clone(),
            rating: provider.rating,
            total_reviews: provider.total_reviews,
            is_verified: provider.is_verified,
        }
    }
}

/// A package as shown on the browse and detail pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageListing {
    #[serde(flatten)]
    pub package: Package,
    pub service_provider: Option<ProviderSummary>,
    pub category: Option<Category>,
    pub promotions: Vec<Promotion>,
}

impl<'a> Catalog<'a> {
    pub fn provider(&self, provider_id: &str) -> Option<&'a ServiceProvider> {
        self.providers
            .iter()
            .find(|provider| provider.id == provider_id)
    }

    pub fn category(&self, category_id: Option<&str>) -> Option<&'a Category> {
        let category_id = category_id?;
        self.categories
            .iter()
            .find(|category| category.id == category_id)
    }

    pub fn active_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|category| category.is_active)
            .cloned()
            .collect()
    }

    pub fn listing(&self, package: &Package, today: NaiveDate) -> PackageListing {
        PackageListing {
            package: package.clone(),
            service_provider: self
                .provider(&package.service_provider_id)
                .map(ProviderSummary::from),
            category: self.category(package.category_id.as_deref()).cloned(),
            promotions: self
                .promotions
                .iter()
                .filter(|promotion| promotion.package_id == package.id)
                .filter(|promotion| is_promotion_live(promotion, today))
                .cloned()
                .collect(),
        }
    }

    pub fn search(&self, filter: &PackageFilter, today: NaiveDate) -> Vec<PackageListing> {
        self.packages
            .iter()
            .filter(|package| filter.matches(package, self.provider(&package.service_provider_id)))
            .map(|package| self.listing(package, today))
            .collect()
    }

    pub fn find_listing(&self, package_id: &str, today: NaiveDate) -> Option<PackageListing> {
        self.packages
            .iter()
            .find(|package| package.id == package_id)
            .map(|package| self.listing(package, today))
    }

    /// Packages owned by one provider, newest first, with their category.
    pub fn provider_packages(&self, provider_id: &str) -> Vec<ProviderPackage> {
        let mut packages: Vec<ProviderPackage> = self
            .packages
            .iter()
            .filter(|package| package.service_provider_id == provider_id)
            .map(|package| ProviderPackage {
                package: package.clone(),
                category: self.category(package.category_id.as_deref()).cloned(),
            })
            .collect();
        packages.sort_by(|left, right| right.package.created_at.cmp(&left.package.created_at));
        packages
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPackage {
    #[serde(flatten)]
    pub package: Package,
    pub category: Option<Category>,
}

/// Fields a provider submits when publishing a package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPackage {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub price: f64,
    pub session_count: u32,
    pub duration_minutes: Option<u32>,
    pub validity_days: Option<u32>,
}

pub const DEFAULT_VALIDITY_DAYS: u32 = 90;
pub const MAX_VALIDITY_DAYS: u32 = 3650;
pub const MAX_SESSION_COUNT: u32 = 1000;
pub const MAX_DURATION_MINUTES: u32 = 1440;

impl NewPackage {
    pub fn validate(&self, categories: &[Category]) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "Title is required."));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ValidationError::new("price", "Price must be greater than zero."));
        }
        if self.session_count == 0 {
            return Err(ValidationError::new(
                "sessionCount",
                "Session count must be greater than zero.",
            ));
        }
        if self.session_count > MAX_SESSION_COUNT {
            return Err(ValidationError::new(
                "sessionCount",
                format!("Session count may not exceed {MAX_SESSION_COUNT}."),
            ));
        }
        if let Some(days) = self.validity_days {
            if days == 0 {
                return Err(ValidationError::new(
                    "validityDays",
                    "Validity must be at least one day.",
                ));
            }
            if days > MAX_VALIDITY_DAYS {
                return Err(ValidationError::new(
                    "validityDays",
                    format!("Validity may not exceed {MAX_VALIDITY_DAYS} days."),
                ));
            }
        }
        if let Some(minutes) = self.duration_minutes {
            if minutes == 0 {
                return Err(ValidationError::new(
                    "durationMinutes",
                    "Duration must be greater than zero.",
                ));
            }
            if minutes > MAX_DURATION_MINUTES {
                return Err(ValidationError::new(
                    "durationMinutes",
                    format!("Duration may not exceed {MAX_DURATION_MINUTES} minutes."),
                ));
            }
        }
        if let Some(category_id) = self.category_id.as_deref() {
            if !categories.iter().any(|category| category.id == category_id) {
                return Err(ValidationError::new("categoryId", "Unknown category."));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::PromotionType;

    fn package(id: &str, title: &str, price: f64, featured: bool) -> Package {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("timestamp");
        Package {
            id: id.to_string(),
            service_provider_id: "sp_1".to_string(),
            category_id: Some("cat_fitness".to_string()),
            title: title.to_string(),
            description: Some("Kişisel antrenman".to_string()),
            price,
            session_count: 8,
            duration_minutes: Some(60),
            validity_days: 90,
            is_active: true,
            is_featured: featured,
            created_at: now,
            updated_at: now,
        }
    }

    fn provider() -> ServiceProvider {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("timestamp");
        ServiceProvider {
            id: "sp_1".to_string(),
            user_id: "usr_provider".to_string(),
            business_name: Some("Ayşe Fitness Studio".to_string()),
            description: None,
            specialization: None,
            location_city: Some("İstanbul".to_string()),
            location_district: None,
            location_address: None,
            latitude: None,
            longitude: None,
            rating: 4.8,
            total_reviews: 12,
            is_verified: true,
            is_featured: false,
            commission_rate: 10.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn filter_ignores_all_category_and_blank_values() {
        let filter = PackageFilter::from_query(Some("all"), Some("  "), None, Some(""), None)
            .expect("filter");
        assert_eq!(filter, PackageFilter::default());
    }

    #[test]
    fn filter_rejects_unparsable_price() {
        let error = PackageFilter::from_query(None, None, None, Some("cheap"), None)
            .expect_err("price must parse");
        assert_eq!(error.field, "minPrice");
    }

    #[test]
    fn search_matches_provider_business_name_case_insensitively() {
        let provider = provider();
        let package = package("pkg_1", "Pilates", 1200.0, false);
        let filter =
            PackageFilter::from_query(None, Some("AYŞE"), None, None, None).expect("filter");
        assert!(filter.matches(&package, Some(&provider)));
        assert!(!filter.matches(&package, None));
    }

    #[test]
    fn price_bounds_are_inclusive_and_inactive_packages_are_hidden() {
        let mut package = package("pkg_1", "Yoga", 1000.0, true);
        let filter = PackageFilter::from_query(None, None, Some("true"), Some("1000"), Some("1000"))
            .expect("filter");
        assert!(filter.matches(&package, None));

        package.is_active = false;
        assert!(!filter.matches(&package, None));
    }

    #[test]
    fn listing_embeds_only_live_promotions() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).expect("date");
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().expect("timestamp");
        let packages = vec![package("pkg_1", "Yoga", 1000.0, false)];
        let providers = vec![provider()];
        let promotions = vec![
            Promotion {
                id: "promo_live".to_string(),
                package_id: "pkg_1".to_string(),
                title: "Bahar".to_string(),
                description: None,
                promotion_type: PromotionType::PercentageDiscount,
                buy_quantity: None,
                get_quantity: None,
                discount_percentage: Some(15.0),
                discount_amount: None,
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 31),
                is_active: true,
                created_at,
            },
            Promotion {
                id: "promo_over".to_string(),
                package_id: "pkg_1".to_string(),
                title: "Kış".to_string(),
                description: None,
                promotion_type: PromotionType::FixedDiscount,
                buy_quantity: None,
                get_quantity: None,
                discount_percentage: None,
                discount_amount: Some(100.0),
                start_date: None,
                end_date: NaiveDate::from_ymd_opt(2026, 2, 28),
                is_active: true,
                created_at,
            },
        ];
        let catalog = Catalog {
            packages: &packages,
            providers: &providers,
            categories: &[],
            promotions: &promotions,
        };

        let listing = catalog.find_listing("pkg_1", today).expect("listing");
        assert_eq!(listing.promotions.len(), 1);
        assert_eq!(listing.promotions[0].id, "promo_live");
        assert_eq!(
            listing
                .service_provider
                .and_then(|provider| provider.business_name),
            Some("Ayşe Fitness Studio".to_string())
        );
        assert!(catalog.find_listing("missing", today).is_none());
    }

    #[test]
    fn new_package_requires_positive_price_and_sessions() {
        let mut draft = NewPackage {
            title: "Boks".to_string(),
            price: 500.0,
            session_count: 4,
            ..NewPackage::default()
        };
        assert!(draft.validate(&[]).is_ok());

        draft.price = 0.0;
        assert_eq!(draft.validate(&[]).map_err(|error| error.field), Err("price"));

        draft.price = 500.0;
        draft.session_count = 0;
        assert_eq!(
            draft.validate(&[]).map_err(|error| error.field),
            Err("sessionCount")
        );

        draft.session_count = 4;
        draft.category_id = Some("cat_missing".to_string());
        assert_eq!(
            draft.validate(&[]).map_err(|error| error.field),
            Err("categoryId")
        );
    }

    #[test]
    fn new_package_caps_sessions_duration_and_validity() {
        let mut draft = NewPackage {
            title: "Pilates".to_string(),
            price: 900.0,
            session_count: MAX_SESSION_COUNT,
            duration_minutes: Some(MAX_DURATION_MINUTES),
            validity_days: Some(MAX_VALIDITY_DAYS),
            ..NewPackage::default()
        };
        assert!(draft.validate(&[]).is_ok());

        draft.session_count = MAX_SESSION_COUNT + 1;
        assert_eq!(
            draft.validate(&[]).map_err(|error| error.field),
            Err("sessionCount")
        );

        draft.session_count = 8;
        draft.duration_minutes = Some(MAX_DURATION_MINUTES + 1);
        assert_eq!(
            draft.validate(&[]).map_err(|error| error.field),
            Err("durationMinutes")
        );

        draft.duration_minutes = Some(60);
        draft.validity_days = Some(4_000_000_000);
        assert_eq!(
            draft.validate(&[]).map_err(|error| error.field),
            Err("validityDays")
        );

        draft.validity_days = Some(0);
        assert_eq!(
            draft.validate(&[]).map_err(|error| error.field),
            Err("validityDays")
        );
    }
}
