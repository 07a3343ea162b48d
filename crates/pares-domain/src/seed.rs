//! Demo catalogue loaded at boot. Dates are relative to the supplied clock so
//! upcoming appointments and live promotions stay current.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::model::{
    Appointment, AppointmentStatus, AvailableSlot, Category, CommissionSettings,
    CustomCommissionRate, Conversation, Message, Package, PackagePurchase, PaymentStatus,
    ProfileDetails, Promotion, PromotionType, PurchaseStatus, Review, ServiceProvider,
    Transaction, TransactionStatus, TransactionType, User, UserType,
};

pub const DEMO_ADMIN_EMAIL: &str = "admin@paresapp.online";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_PROVIDER_EMAIL: &str = "provider@example.com";
pub const DEMO_PROVIDER_PASSWORD: &str = "provider123";
pub const DEMO_CUSTOMER_EMAIL: &str = "customer@example.com";
pub const DEMO_CUSTOMER_PASSWORD: &str = "customer123";
pub const DEMO_INACTIVE_EMAIL: &str = "ali.sahin@example.com";

/// A seeded login. The password is plaintext here and hashed by the service
/// before it is stored.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAccount {
    pub user: User,
    #[serde(skip)]
    pub password: String,
    pub details: ProfileDetails,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoDataset {
    pub accounts: Vec<SeedAccount>,
    pub categories: Vec<Category>,
    pub providers: Vec<ServiceProvider>,
    pub packages: Vec<Package>,
    pub promotions: Vec<Promotion>,
    pub purchases: Vec<PackagePurchase>,
    pub appointments: Vec<Appointment>,
    pub slots: Vec<AvailableSlot>,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub reviews: Vec<Review>,
    pub commission: CommissionSettings,
    pub transactions: Vec<Transaction>,
}

pub fn demo_dataset(now: DateTime<Utc>) -> DemoDataset {
    let today = now.date_naive();
    DemoDataset {
        accounts: accounts(now),
        categories: categories(now),
        providers: providers(now),
        packages: packages(now),
        promotions: promotions(now, today),
        purchases: purchases(now),
        appointments: appointments(now, today),
        slots: slots(today),
        conversations: conversations(now),
        messages: messages(now),
        reviews: reviews(now),
        commission: CommissionSettings {
            custom_rates: vec![CustomCommissionRate {
                service_provider_id: "sp_can".to_string(),
                rate: 8.0,
                reason: "Yüksek hacimli iş ortağı".to_string(),
            }],
            ..CommissionSettings::default()
        },
        transactions: transactions(now),
    }
}

fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

fn user(
    now: DateTime<Utc>,
    id: &str,
    email: &str,
    user_type: UserType,
    name: (&str, &str),
    phone: Option<&str>,
    is_active: bool,
    age_days: i64,
) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        user_type,
        first_name: name.0.to_string(),
        last_name: name.1.to_string(),
        phone: phone.map(ToString::to_string),
        avatar_url: None,
        is_active,
        email_verified: true,
        created_at: days_ago(now, age_days),
        updated_at: days_ago(now, age_days / 2),
    }
}

fn accounts(now: DateTime<Utc>) -> Vec<SeedAccount> {
    vec![
        SeedAccount {
            user: user(
                now,
                "usr_admin",
                DEMO_ADMIN_EMAIL,
                UserType::Admin,
                ("Admin", "User"),
                None,
                true,
                400,
            ),
            password: DEMO_ADMIN_PASSWORD.to_string(),
            details: ProfileDetails::default(),
        },
        SeedAccount {
            user: user(
                now,
                "usr_provider_ayse",
                DEMO_PROVIDER_EMAIL,
                UserType::ServiceProvider,
                ("Ayşe", "Yılmaz"),
                Some("+90 532 555 1234"),
                true,
                300,
            ),
            password: DEMO_PROVIDER_PASSWORD.to_string(),
            details: ProfileDetails {
                city: Some("İstanbul".to_string()),
                district: Some("Kadıköy".to_string()),
                address: Some("Moda Cd. No:12".to_string()),
                profession: Some("Pilates Eğitmeni".to_string()),
                experience: Some("8".to_string()),
                bio: Some("Reformer pilates ve fonksiyonel antrenman.".to_string()),
                specialties: Some("Pilates, Yoga, Postür".to_string()),
                ..ProfileDetails::default()
            },
        },
        SeedAccount {
            user: user(
                now,
                "usr_provider_can",
                "can.ozturk@example.com",
                UserType::ServiceProvider,
                ("Can", "Öztürk"),
                Some("+90 533 444 9876"),
                true,
                250,
            ),
            password: DEMO_PROVIDER_PASSWORD.to_string(),
            details: ProfileDetails {
                city: Some("İstanbul".to_string()),
                district: Some("Beşiktaş".to_string()),
                profession: Some("Masaj Terapisti".to_string()),
                experience: Some("5".to_string()),
                ..ProfileDetails::default()
            },
        },
        SeedAccount {
            user: user(
                now,
                "usr_customer_mehmet",
                DEMO_CUSTOMER_EMAIL,
                UserType::Customer,
                ("Mehmet", "Demir"),
                Some("+90 555 123 4567"),
                true,
                200,
            ),
            password: DEMO_CUSTOMER_PASSWORD.to_string(),
            details: ProfileDetails {
                city: Some("İstanbul".to_string()),
                district: Some("Üsküdar".to_string()),
                interests: vec!["Pilates".to_string(), "Masaj".to_string()],
                ..ProfileDetails::default()
            },
        },
        SeedAccount {
            user: user(
                now,
                "usr_customer_zeynep",
                "zeynep.kaya@example.com",
                UserType::Customer,
                ("Zeynep", "Kaya"),
                None,
                true,
                150,
            ),
            password: DEMO_CUSTOMER_PASSWORD.to_string(),
            details: ProfileDetails::default(),
        },
        SeedAccount {
            user: user(
                now,
                "usr_customer_ali",
                DEMO_INACTIVE_EMAIL,
                UserType::Customer,
                ("Ali", "Şahin"),
                None,
                false,
                90,
            ),
            password: DEMO_CUSTOMER_PASSWORD.to_string(),
            details: ProfileDetails::default(),
        },
    ]
}

fn categories(now: DateTime<Utc>) -> Vec<Category> {
    let category = |id: &str, name: &str, slug: &str, icon: &str, is_active: bool| Category {
        id: id.to_string(),
        name: name.to_string(),
        slug: slug.to_string(),
        description: None,
        icon: Some(icon.to_string()),
        is_active,
        created_at: days_ago(now, 400),
    };
    vec![
        category("cat_fitness", "Spor ve Fitness", "spor-ve-fitness", "dumbbell", true),
        category("cat_wellness", "Sağlık ve Wellness", "saglik-ve-wellness", "heart", true),
        category("cat_beauty", "Güzellik ve Bakım", "guzellik-ve-bakim", "sparkles", true),
        category("cat_education", "Eğitim ve Kurslar", "egitim-ve-kurslar", "book", true),
        category("cat_music", "Müzik", "muzik", "music", false),
    ]
}

fn providers(now: DateTime<Utc>) -> Vec<ServiceProvider> {
    vec![
        ServiceProvider {
            id: "sp_ayse".to_string(),
            user_id: "usr_provider_ayse".to_string(),
            business_name: Some("Ayşe Yılmaz Pilates Stüdyosu".to_string()),
            description: Some("Kadıköy'de butik reformer pilates stüdyosu.".to_string()),
            specialization: Some("Pilates".to_string()),
            location_city: Some("İstanbul".to_string()),
            location_district: Some("Kadıköy".to_string()),
            location_address: Some("Moda Cd. No:12".to_string()),
            latitude: Some(40.987),
            longitude: Some(29.026),
            rating: 4.5,
            total_reviews: 2,
            is_verified: true,
            is_featured: true,
            commission_rate: 10.0,
            created_at: days_ago(now, 300),
            updated_at: days_ago(now, 20),
        },
        ServiceProvider {
            id: "sp_can".to_string(),
            user_id: "usr_provider_can".to_string(),
            business_name: Some("Can Öztürk Masaj ve Terapi".to_string()),
            description: Some("Klasik ve spor masajı.".to_string()),
            specialization: Some("Masaj".to_string()),
            location_city: Some("İstanbul".to_string()),
            location_district: Some("Beşiktaş".to_string()),
            location_address: None,
            latitude: None,
            longitude: None,
            rating: 5.0,
            total_reviews: 1,
            is_verified: false,
            is_featured: false,
            commission_rate: 8.0,
            created_at: days_ago(now, 250),
            updated_at: days_ago(now, 30),
        },
    ]
}

fn packages(now: DateTime<Utc>) -> Vec<Package> {
    let package = |id: &str,
                   provider: &str,
                   category: &str,
                   title: &str,
                   description: &str,
                   price: f64,
                   sessions: (u32, u32, u32),
                   flags: (bool, bool),
                   age_days: i64| Package {
        id: id.to_string(),
        service_provider_id: provider.to_string(),
        category_id: Some(category.to_string()),
        title: title.to_string(),
        description: Some(description.to_string()),
        price,
        session_count: sessions.0,
        duration_minutes: Some(sessions.1),
        validity_days: sessions.2,
        is_active: flags.0,
        is_featured: flags.1,
        created_at: days_ago(now, age_days),
        updated_at: days_ago(now, age_days / 2),
    };
    vec![
        package(
            "pkg_pilates_8",
            "sp_ayse",
            "cat_fitness",
            "8 Seans Reformer Pilates",
            "Birebir reformer pilates dersleri.",
            2_400.0,
            (8, 50, 90),
            (true, true),
            200,
        ),
        package(
            "pkg_personal_12",
            "sp_ayse",
            "cat_fitness",
            "12 Seans Kişisel Antrenman",
            "Kişiye özel kuvvet ve kondisyon programı.",
            3_600.0,
            (12, 60, 120),
            (true, false),
            180,
        ),
        package(
            "pkg_yoga_4",
            "sp_ayse",
            "cat_wellness",
            "4 Seans Yoga ve Nefes",
            "Başlangıç seviyesi yoga ve nefes çalışması.",
            900.0,
            (4, 60, 60),
            (true, false),
            120,
        ),
        package(
            "pkg_massage_5",
            "sp_can",
            "cat_wellness",
            "5 Seans Klasik Masaj",
            "Rahatlatıcı klasik masaj terapisi.",
            2_000.0,
            (5, 45, 90),
            (true, true),
            150,
        ),
        package(
            "pkg_skin_6",
            "sp_can",
            "cat_beauty",
            "6 Seans Cilt Bakımı",
            "Derinlemesine temizlik ve nem bakımı.",
            3_000.0,
            (6, 60, 180),
            (true, false),
            90,
        ),
        package(
            "pkg_winter_2",
            "sp_can",
            "cat_beauty",
            "Kış Kampanyası 2 Seans",
            "Sezonu kapanan kampanya paketi.",
            500.0,
            (2, 45, 30),
            (false, false),
            380,
        ),
    ]
}

fn promotions(now: DateTime<Utc>, today: NaiveDate) -> Vec<Promotion> {
    vec![
        Promotion {
            id: "promo_pilates_spring".to_string(),
            package_id: "pkg_pilates_8".to_string(),
            title: "Bahar İndirimi".to_string(),
            description: Some("Tüm reformer paketlerinde %15 indirim.".to_string()),
            promotion_type: PromotionType::PercentageDiscount,
            buy_quantity: None,
            get_quantity: None,
            discount_percentage: Some(15.0),
            discount_amount: None,
            start_date: Some(today - Duration::days(10)),
            end_date: Some(today + Duration::days(20)),
            is_active: true,
            created_at: days_ago(now, 10),
        },
        Promotion {
            id: "promo_massage_bonus".to_string(),
            package_id: "pkg_massage_5".to_string(),
            title: "5 Al 1 Bedava".to_string(),
            description: None,
            promotion_type: PromotionType::BuyXGetY,
            buy_quantity: Some(5),
            get_quantity: Some(1),
            discount_percentage: None,
            discount_amount: None,
            start_date: Some(today - Duration::days(5)),
            end_date: Some(today + Duration::days(30)),
            is_active: true,
            created_at: days_ago(now, 5),
        },
        Promotion {
            id: "promo_yoga_winter".to_string(),
            package_id: "pkg_yoga_4".to_string(),
            title: "Kış Fırsatı".to_string(),
            description: None,
            promotion_type: PromotionType::FixedDiscount,
            buy_quantity: None,
            get_quantity: None,
            discount_percentage: None,
            discount_amount: Some(100.0),
            start_date: Some(today - Duration::days(60)),
            end_date: Some(today - Duration::days(2)),
            is_active: true,
            created_at: days_ago(now, 60),
        },
    ]
}

fn purchases(now: DateTime<Utc>) -> Vec<PackagePurchase> {
    let purchase = |id: &str,
                    customer: &str,
                    package: &str,
                    provider: &str,
                    prices: (f64, f64, f64),
                    sessions: (u32, u32),
                    status: PurchaseStatus,
                    age_days: i64,
                    validity_days: i64| {
        let purchased_at = days_ago(now, age_days);
        PackagePurchase {
            id: id.to_string(),
            customer_id: customer.to_string(),
            package_id: package.to_string(),
            service_provider_id: provider.to_string(),
            promotion_id: None,
            original_price: prices.0,
            final_price: prices.1,
            commission_amount: prices.2,
            sessions_total: sessions.0,
            sessions_used: sessions.1,
            sessions_remaining: sessions.0.saturating_sub(sessions.1),
            purchase_date: purchased_at,
            expiry_date: Some(purchased_at + Duration::days(validity_days)),
            status,
            payment_status: PaymentStatus::Completed,
            payment_method: Some("credit_card".to_string()),
            transaction_id: Some(format!("tx_{id}")),
            created_at: purchased_at,
            updated_at: purchased_at,
        }
    };
    let mut rows = vec![
        purchase(
            "pur_mehmet_pilates",
            "usr_customer_mehmet",
            "pkg_pilates_8",
            "sp_ayse",
            (2_400.0, 2_400.0, 240.0),
            (8, 3),
            PurchaseStatus::Active,
            45,
            90,
        ),
        purchase(
            "pur_mehmet_massage",
            "usr_customer_mehmet",
            "pkg_massage_5",
            "sp_can",
            (2_000.0, 2_000.0, 160.0),
            (6, 1),
            PurchaseStatus::Active,
            3,
            90,
        ),
        purchase(
            "pur_zeynep_yoga",
            "usr_customer_zeynep",
            "pkg_yoga_4",
            "sp_ayse",
            (900.0, 900.0, 90.0),
            (4, 0),
            PurchaseStatus::Active,
            1,
            60,
        ),
        purchase(
            "pur_zeynep_personal",
            "usr_customer_zeynep",
            "pkg_personal_12",
            "sp_ayse",
            (3_600.0, 3_600.0, 360.0),
            (12, 12),
            PurchaseStatus::Completed,
            130,
            120,
        ),
    ];
    if let Some(bonus) = rows.get_mut(1) {
        bonus.promotion_id = Some("promo_massage_bonus".to_string());
    }
    rows
}

fn appointments(now: DateTime<Utc>, today: NaiveDate) -> Vec<Appointment> {
    let appointment = |id: &str,
                       purchase: &str,
                       customer: &str,
                       provider: &str,
                       date: NaiveDate,
                       times: (&str, &str),
                       status: AppointmentStatus| Appointment {
        id: id.to_string(),
        package_purchase_id: purchase.to_string(),
        customer_id: customer.to_string(),
        service_provider_id: provider.to_string(),
        appointment_date: date,
        start_time: times.0.to_string(),
        end_time: times.1.to_string(),
        status,
        notes: None,
        customer_notes: None,
        provider_notes: None,
        created_at: days_ago(now, 3),
        updated_at: days_ago(now, 1),
    };
    vec![
        appointment(
            "apt_mehmet_next",
            "pur_mehmet_pilates",
            "usr_customer_mehmet",
            "sp_ayse",
            today + Duration::days(2),
            ("10:00", "11:00"),
            AppointmentStatus::Confirmed,
        ),
        appointment(
            "apt_mehmet_done",
            "pur_mehmet_pilates",
            "usr_customer_mehmet",
            "sp_ayse",
            today - Duration::days(7),
            ("10:00", "11:00"),
            AppointmentStatus::Completed,
        ),
        appointment(
            "apt_mehmet_massage",
            "pur_mehmet_massage",
            "usr_customer_mehmet",
            "sp_can",
            today + Duration::days(4),
            ("14:00", "15:00"),
            AppointmentStatus::Pending,
        ),
        appointment(
            "apt_zeynep_yoga",
            "pur_zeynep_yoga",
            "usr_customer_zeynep",
            "sp_ayse",
            today + Duration::days(2),
            ("11:00", "12:00"),
            AppointmentStatus::Confirmed,
        ),
    ]
}

fn slots(today: NaiveDate) -> Vec<AvailableSlot> {
    let ayse = ["09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00"];
    let can = ["10:00", "12:00", "14:00", "16:00"];
    let mut rows = Vec::new();
    for offset in 1..=7 {
        let date = today + Duration::days(offset);
        rows.push(AvailableSlot {
            service_provider_id: "sp_ayse".to_string(),
            date,
            slots: ayse.iter().map(|slot| (*slot).to_string()).collect(),
        });
        rows.push(AvailableSlot {
            service_provider_id: "sp_can".to_string(),
            date,
            slots: can.iter().map(|slot| (*slot).to_string()).collect(),
        });
    }
    rows
}

fn conversations(now: DateTime<Utc>) -> Vec<Conversation> {
    vec![
        Conversation {
            id: "conv_mehmet_ayse".to_string(),
            customer_id: "usr_customer_mehmet".to_string(),
            service_provider_id: "usr_provider_ayse".to_string(),
            customer_name: "Mehmet Demir".to_string(),
            service_provider_name: "Ayşe Yılmaz".to_string(),
            last_message: "Görüşmek üzere!".to_string(),
            last_message_time: now - Duration::hours(2),
            unread_count: 1,
            is_active: true,
        },
        Conversation {
            id: "conv_zeynep_can".to_string(),
            customer_id: "usr_customer_zeynep".to_string(),
            service_provider_id: "usr_provider_can".to_string(),
            customer_name: "Zeynep Kaya".to_string(),
            service_provider_name: "Can Öztürk".to_string(),
            last_message: "Hafta sonu müsait misiniz?".to_string(),
            last_message_time: now - Duration::days(1),
            unread_count: 0,
            is_active: true,
        },
    ]
}

fn messages(now: DateTime<Utc>) -> Vec<Message> {
    let message = |id: &str,
                   conversation: &str,
                   from: (&str, UserType),
                   to: (&str, UserType),
                   content: &str,
                   at: DateTime<Utc>,
                   is_read: bool| Message {
        id: id.to_string(),
        conversation_id: conversation.to_string(),
        sender_id: from.0.to_string(),
        receiver_id: to.0.to_string(),
        sender_type: Some(from.1),
        receiver_type: Some(to.1),
        content: content.to_string(),
        timestamp: at,
        is_read,
    };
    let customer = ("usr_customer_mehmet", UserType::Customer);
    let provider = ("usr_provider_ayse", UserType::ServiceProvider);
    vec![
        message(
            "msg_1",
            "conv_mehmet_ayse",
            customer,
            provider,
            "Merhaba, perşembe dersini 10:00'a alabilir miyiz?",
            now - Duration::hours(4),
            true,
        ),
        message(
            "msg_2",
            "conv_mehmet_ayse",
            provider,
            customer,
            "Tabii, 10:00 sizin için ayrıldı.",
            now - Duration::hours(3),
            true,
        ),
        message(
            "msg_3",
            "conv_mehmet_ayse",
            provider,
            customer,
            "Görüşmek üzere!",
            now - Duration::hours(2),
            false,
        ),
        message(
            "msg_4",
            "conv_zeynep_can",
            ("usr_customer_zeynep", UserType::Customer),
            ("usr_provider_can", UserType::ServiceProvider),
            "Hafta sonu müsait misiniz?",
            now - Duration::days(1),
            true,
        ),
    ]
}

fn reviews(now: DateTime<Utc>) -> Vec<Review> {
    let review = |id: &str, customer: &str, provider: &str, purchase: &str, rating: u8, comment: &str| Review {
        id: id.to_string(),
        customer_id: customer.to_string(),
        service_provider_id: provider.to_string(),
        package_purchase_id: Some(purchase.to_string()),
        rating,
        comment: Some(comment.to_string()),
        is_visible: true,
        created_at: days_ago(now, 6),
    };
    vec![
        review(
            "rev_1",
            "usr_customer_mehmet",
            "sp_ayse",
            "pur_mehmet_pilates",
            5,
            "Çok ilgili ve profesyonel.",
        ),
        review(
            "rev_2",
            "usr_customer_zeynep",
            "sp_ayse",
            "pur_zeynep_personal",
            4,
            "Programlar çok iyi, saatler biraz dolu.",
        ),
        review(
            "rev_3",
            "usr_customer_mehmet",
            "sp_can",
            "pur_mehmet_massage",
            5,
            "Harika bir masaj deneyimi.",
        ),
    ]
}

fn transactions(now: DateTime<Utc>) -> Vec<Transaction> {
    let transaction = |id: &str,
                       kind: TransactionType,
                       amount: f64,
                       provider: (&str, &str),
                       package: Option<&str>,
                       customer: Option<&str>,
                       age_days: i64,
                       status: TransactionStatus| Transaction {
        id: id.to_string(),
        transaction_type: kind,
        amount,
        service_provider_id: provider.0.to_string(),
        service_provider_name: provider.1.to_string(),
        package_title: package.map(ToString::to_string),
        customer_name: customer.map(ToString::to_string),
        date: days_ago(now, age_days),
        status,
    };
    let ayse = ("sp_ayse", "Ayşe Yılmaz Pilates Stüdyosu");
    let can = ("sp_can", "Can Öztürk Masaj ve Terapi");
    vec![
        transaction(
            "txn_commission_1",
            TransactionType::Commission,
            360.0,
            ayse,
            Some("12 Seans Kişisel Antrenman"),
            Some("Zeynep Kaya"),
            130,
            TransactionStatus::Completed,
        ),
        transaction(
            "txn_commission_2",
            TransactionType::Commission,
            240.0,
            ayse,
            Some("8 Seans Reformer Pilates"),
            Some("Mehmet Demir"),
            45,
            TransactionStatus::Completed,
        ),
        transaction(
            "txn_featured_1",
            TransactionType::FeaturedFee,
            50.0,
            ayse,
            Some("8 Seans Reformer Pilates"),
            None,
            30,
            TransactionStatus::Completed,
        ),
        transaction(
            "txn_commission_3",
            TransactionType::Commission,
            160.0,
            can,
            Some("5 Seans Klasik Masaj"),
            Some("Mehmet Demir"),
            3,
            TransactionStatus::Completed,
        ),
        transaction(
            "txn_commission_4",
            TransactionType::Commission,
            90.0,
            ayse,
            Some("4 Seans Yoga ve Nefes"),
            Some("Zeynep Kaya"),
            1,
            TransactionStatus::Completed,
        ),
        transaction(
            "txn_verification_1",
            TransactionType::VerificationFee,
            100.0,
            can,
            None,
            None,
            2,
            TransactionStatus::Pending,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::commission::validate_settings;

    #[test]
    fn dataset_references_resolve() {
        let now = Utc::now();
        let data = demo_dataset(now);

        let user_ids: HashSet<&str> = data
            .accounts
            .iter()
            .map(|account| account.user.id.as_str())
            .collect();
        let provider_ids: HashSet<&str> = data.providers.iter().map(|p| p.id.as_str()).collect();
        let package_ids: HashSet<&str> = data.packages.iter().map(|p| p.id.as_str()).collect();
        let category_ids: HashSet<&str> = data.categories.iter().map(|c| c.id.as_str()).collect();

        for provider in &data.providers {
            assert!(user_ids.contains(provider.user_id.as_str()));
        }
        for package in &data.packages {
            assert!(provider_ids.contains(package.service_provider_id.as_str()));
            assert!(category_ids.contains(package.category_id.as_deref().unwrap_or_default()));
        }
        for purchase in &data.purchases {
            assert!(package_ids.contains(purchase.package_id.as_str()));
            assert!(user_ids.contains(purchase.customer_id.as_str()));
        }
        for promotion in &data.promotions {
            assert!(package_ids.contains(promotion.package_id.as_str()));
        }
        for conversation in &data.conversations {
            assert!(user_ids.contains(conversation.customer_id.as_str()));
            assert!(user_ids.contains(conversation.service_provider_id.as_str()));
        }
        assert!(validate_settings(&data.commission).is_ok());
    }

    #[test]
    fn demo_logins_are_unique_and_include_each_role() {
        let data = demo_dataset(Utc::now());
        let emails: HashSet<&str> = data
            .accounts
            .iter()
            .map(|account| account.user.email.as_str())
            .collect();
        assert_eq!(emails.len(), data.accounts.len());
        for email in [DEMO_ADMIN_EMAIL, DEMO_PROVIDER_EMAIL, DEMO_CUSTOMER_EMAIL] {
            assert!(emails.contains(email));
        }
    }

    #[test]
    fn upcoming_appointments_are_in_the_future() {
        let now = Utc::now();
        let data = demo_dataset(now);
        let upcoming = data
            .appointments
            .iter()
            .filter(|appointment| appointment.status == AppointmentStatus::Confirmed)
            .filter(|appointment| appointment.appointment_date > now.date_naive())
            .count();
        assert_eq!(upcoming, 2);
    }
}
