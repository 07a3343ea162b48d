use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::model::{
    Appointment, AppointmentStatus, Category, Package, PackagePurchase, PaymentStatus, Review,
    ServiceProvider, User, UserType,
};
use crate::{round_currency, round_one_decimal};

const TOP_CATEGORY_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub id: String,
    pub name: String,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u32,
    pub total_service_providers: u32,
    pub total_customers: u32,
    pub total_packages: u32,
    pub active_packages: u32,
    pub total_sales: f64,
    pub total_commission: f64,
    pub monthly_growth: f64,
    pub top_categories: Vec<CategoryShare>,
}

pub struct AdminStatsInput<'a> {
    pub users: &'a [User],
    pub packages: &'a [Package],
    pub purchases: &'a [PackagePurchase],
    pub categories: &'a [Category],
}

pub fn admin_stats(input: &AdminStatsInput<'_>, now: DateTime<Utc>) -> AdminStats {
    let count_type = |user_type: UserType| {
        input
            .users
            .iter()
            .filter(|user| user.user_type == user_type)
            .count() as u32
    };

    let paid: Vec<&PackagePurchase> = input
        .purchases
        .iter()
        .filter(|purchase| purchase.payment_status == PaymentStatus::Completed)
        .collect();

    AdminStats {
        total_users: input.users.len() as u32,
        total_service_providers: count_type(UserType::ServiceProvider),
        total_customers: count_type(UserType::Customer),
        total_packages: input.packages.len() as u32,
        active_packages: input.packages.iter().filter(|package| package.is_active).count() as u32,
        total_sales: round_currency(paid.iter().map(|purchase| purchase.final_price).sum()),
        total_commission: round_currency(
            paid.iter().map(|purchase| purchase.commission_amount).sum(),
        ),
        monthly_growth: monthly_growth(&paid, now.date_naive()),
        top_categories: top_categories(input.packages, input.categories),
    }
}

/// Percent change of sales in the current calendar month against the
/// previous one. Zero when the previous month had no sales.
fn monthly_growth(paid: &[&PackagePurchase], today: NaiveDate) -> f64 {
    let current = month_key(today);
    let previous = if current.1 == 1 {
        (current.0 - 1, 12)
    } else {
        (current.0, current.1 - 1)
    };

    let mut current_sales = 0.0;
    let mut previous_sales = 0.0;
    for purchase in paid {
        let key = month_key(purchase.purchase_date.date_naive());
        if key == current {
            current_sales += purchase.final_price;
        } else if key == previous {
            previous_sales += purchase.final_price;
        }
    }

    if previous_sales <= 0.0 {
        return 0.0;
    }
    round_one_decimal((current_sales - previous_sales) / previous_sales * 100.0)
}

fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn top_categories(packages: &[Package], categories: &[Category]) -> Vec<CategoryShare> {
    let total = packages.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for package in packages {
        if let Some(category_id) = package.category_id.as_deref() {
            *counts.entry(category_id).or_default() += 1;
        }
    }

    let mut shares: Vec<CategoryShare> = categories
        .iter()
        .filter_map(|category| {
            let count = counts.get(category.id.as_str()).copied()?;
            Some(CategoryShare {
                id: category.id.clone(),
                name: category.name.clone(),
                count,
                percentage: round_one_decimal(f64::from(count) / total as f64 * 100.0),
            })
        })
        .collect();
    shares.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.name.cmp(&right.name))
    });
    shares.truncate(TOP_CATEGORY_LIMIT);
    shares
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub total_packages: u32,
    pub active_packages: u32,
    pub total_sales: f64,
    pub net_earnings: f64,
    pub upcoming_appointments: u32,
    pub completed_appointments: u32,
    pub average_rating: f64,
    pub total_reviews: u32,
}

pub struct ProviderStatsInput<'a> {
    pub provider: &'a ServiceProvider,
    pub packages: &'a [Package],
    pub purchases: &'a [PackagePurchase],
    pub appointments: &'a [Appointment],
    pub reviews: &'a [Review],
}

pub fn provider_stats(input: &ProviderStatsInput<'_>, today: NaiveDate) -> ProviderStats {
    let provider_id = input.provider.id.as_str();
    let packages: Vec<&Package> = input
        .packages
        .iter()
        .filter(|package| package.service_provider_id == provider_id)
        .collect();

    let (total_sales, total_commission) = input
        .purchases
        .iter()
        .filter(|purchase| {
            purchase.service_provider_id == provider_id
                && purchase.payment_status == PaymentStatus::Completed
        })
        .fold((0.0, 0.0), |(sales, commission), purchase| {
            (
                sales + purchase.final_price,
                commission + purchase.commission_amount,
            )
        });

    let appointments: Vec<&Appointment> = input
        .appointments
        .iter()
        .filter(|appointment| appointment.service_provider_id == provider_id)
        .collect();

    let ratings: Vec<u8> = input
        .reviews
        .iter()
        .filter(|review| review.service_provider_id == provider_id && review.is_visible)
        .map(|review| review.rating)
        .collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        let sum: u32 = ratings.iter().map(|rating| u32::from(*rating)).sum();
        round_one_decimal(f64::from(sum) / ratings.len() as f64)
    };

    ProviderStats {
        total_packages: packages.len() as u32,
        active_packages: packages.iter().filter(|package| package.is_active).count() as u32,
        total_sales: round_currency(total_sales),
        net_earnings: round_currency(total_sales - total_commission),
        upcoming_appointments: appointments
            .iter()
            .filter(|appointment| {
                appointment.status == AppointmentStatus::Confirmed
                    && appointment.appointment_date >= today
            })
            .count() as u32,
        completed_appointments: appointments
            .iter()
            .filter(|appointment| appointment.status == AppointmentStatus::Completed)
            .count() as u32,
        average_rating,
        total_reviews: ratings.len() as u32,
    }
}
