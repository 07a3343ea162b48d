use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use pares_domain::admin::{AdminUserAction, AdminUserFilter, AdminUserView};
use pares_domain::catalog::{
    Catalog, DEFAULT_VALIDITY_DAYS, NewPackage, PackageFilter, PackageListing, ProviderPackage,
    ProviderSummary,
};
use pares_domain::commission::CommissionSettingsPatch;
use pares_domain::messaging::{conversations_for, messages_in, record_delivery, validate_outgoing};
use pares_domain::pricing::quote_purchase;
use pares_domain::profile::ProfileUpdate;
use pares_domain::scheduling::{AppointmentChange, AppointmentFilter, open_slots};
use pares_domain::seed::DemoDataset;
use pares_domain::settings::{ProviderSettings, UserSettings};
use pares_domain::stats::{
    AdminStats, AdminStatsInput, ProviderStats, ProviderStatsInput, admin_stats, provider_stats,
};
use pares_domain::{
    Appointment, AppointmentStatus, AvailableSlot, Category, CommissionSettings, Conversation,
    Message, Package, PackagePurchase, PaymentStatus, ProfileDetails, Promotion, PurchaseStatus,
    Review, ServiceProvider, Transaction, TransactionStatus, TransactionType, User, UserType,
    ValidationError,
};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_PAYMENT_METHOD: &str = "credit_card";

#[derive(Clone, Default)]
pub struct MarketplaceStore {
    state: Arc<RwLock<MarketplaceState>>,
}

#[derive(Debug, Clone, Default)]
struct MarketplaceState {
    seeded: bool,
    users: Vec<User>,
    credentials: HashMap<String, String>,
    profiles: HashMap<String, ProfileDetails>,
    user_settings: HashMap<String, UserSettings>,
    provider_settings: HashMap<String, ProviderSettings>,
    categories: Vec<Category>,
    providers: Vec<ServiceProvider>,
    packages: Vec<Package>,
    promotions: Vec<Promotion>,
    purchases: Vec<PackagePurchase>,
    appointments: Vec<Appointment>,
    slots: Vec<AvailableSlot>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    reviews: Vec<Review>,
    commission: CommissionSettings,
    transactions: Vec<Transaction>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MarketplaceStoreError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{message}")]
    Conflict { message: String },
}

impl From<ValidationError> for MarketplaceStoreError {
    fn from(error: ValidationError) -> Self {
        Self::Validation {
            field: error.field,
            message: error.message,
        }
    }
}

/// A registration that already passed request validation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub package_purchase_id: String,
    pub customer_id: String,
    pub service_provider_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
}

/// A purchase as listed on the customer's packages page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseView {
    #[serde(flatten)]
    pub purchase: PackagePurchase,
    pub package: Option<Package>,
    pub service_provider: Option<ProviderSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl MarketplaceStore {
    /// Loads a dataset. `credentials` maps user ids to password hashes.
    pub fn from_dataset(dataset: DemoDataset, credentials: HashMap<String, String>) -> Self {
        let mut state = MarketplaceState {
            seeded: true,
            credentials,
            categories: dataset.categories,
            providers: dataset.providers,
            packages: dataset.packages,
            promotions: dataset.promotions,
            purchases: dataset.purchases,
            appointments: dataset.appointments,
            slots: dataset.slots,
            conversations: dataset.conversations,
            messages: dataset.messages,
            reviews: dataset.reviews,
            commission: dataset.commission,
            transactions: dataset.transactions,
            ..MarketplaceState::default()
        };
        for account in dataset.accounts {
            state
                .profiles
                .insert(account.user.id.clone(), account.details);
            state.users.push(account.user);
        }

        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn is_seeded(&self) -> bool {
        self.read(|state| state.seeded).await
    }

    // Accounts

    pub async fn user(&self, user_id: &str) -> Result<User, MarketplaceStoreError> {
        self.read(|state| find_user(state, user_id).cloned()).await
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim().to_lowercase();
        self.read(|state| {
            state
                .users
                .iter()
                .find(|user| user.email == email)
                .cloned()
        })
        .await
    }

    /// The account and its password hash, looked up by normalized email.
    pub async fn credentials_for_email(&self, email: &str) -> Option<(User, String)> {
        let email = email.trim().to_lowercase();
        self.read(|state| {
            let user = state.users.iter().find(|user| user.email == email)?;
            let hash = state.credentials.get(&user.id)?;
            Some((user.clone(), hash.clone()))
        })
        .await
    }

    pub async fn register_account(
        &self,
        account: NewAccount,
    ) -> Result<User, MarketplaceStoreError> {
        self.mutate(|state| {
            if state.users.iter().any(|user| user.email == account.email) {
                return Err(MarketplaceStoreError::Conflict {
                    message: "An account with this email already exists.".to_string(),
                });
            }

            let now = Utc::now();
            let user = User {
                id: format!("usr_{}", Uuid::new_v4().simple()),
                email: account.email,
                user_type: account.user_type,
                first_name: account.first_name,
                last_name: account.last_name,
                phone: account.phone,
                avatar_url: None,
                is_active: true,
                email_verified: false,
                created_at: now,
                updated_at: now,
            };

            if user.user_type == UserType::ServiceProvider {
                state.providers.push(ServiceProvider {
                    id: format!("sp_{}", Uuid::new_v4().simple()),
                    user_id: user.id.clone(),
                    business_name: Some(user.full_name()),
                    description: None,
                    specialization: None,
                    location_city: None,
                    location_district: None,
                    location_address: None,
                    latitude: None,
                    longitude: None,
                    rating: 0.0,
                    total_reviews: 0,
                    is_verified: false,
                    is_featured: false,
                    commission_rate: state.commission.default_rate,
                    created_at: now,
                    updated_at: now,
                });
            }

            state
                .credentials
                .insert(user.id.clone(), account.password_hash);
            state
                .profiles
                .insert(user.id.clone(), ProfileDetails::default());
            state.users.push(user.clone());
            Ok(user)
        })
        .await
    }

    // Catalogue

    pub async fn active_categories(&self) -> Vec<Category> {
        self.read(|state| catalog(state).active_categories()).await
    }

    pub async fn search_packages(
        &self,
        filter: &PackageFilter,
        today: NaiveDate,
    ) -> (Vec<PackageListing>, Vec<Category>) {
        self.read(|state| {
            let catalog = catalog(state);
            (catalog.search(filter, today), catalog.active_categories())
        })
        .await
    }

    pub async fn package_listing(
        &self,
        package_id: &str,
        today: NaiveDate,
    ) -> Result<PackageListing, MarketplaceStoreError> {
        self.read(|state| {
            catalog(state)
                .find_listing(package_id, today)
                .ok_or(MarketplaceStoreError::NotFound {
                    resource: "Package",
                })
        })
        .await
    }

    pub async fn provider_for_user(
        &self,
        user_id: &str,
    ) -> Result<ServiceProvider, MarketplaceStoreError> {
        self.read(|state| find_provider_for_user(state, user_id).cloned())
            .await
    }

    pub async fn provider_packages(
        &self,
        user_id: &str,
    ) -> Result<Vec<ProviderPackage>, MarketplaceStoreError> {
        self.read(|state| {
            let provider = find_provider_for_user(state, user_id)?;
            Ok(catalog(state).provider_packages(&provider.id))
        })
        .await
    }

    pub async fn create_package(
        &self,
        user_id: &str,
        input: NewPackage,
    ) -> Result<Package, MarketplaceStoreError> {
        self.mutate(|state| {
            input.validate(&state.categories)?;
            let provider_id = find_provider_for_user(state, user_id)?.id.clone();

            let now = Utc::now();
            let package = Package {
                id: format!("pkg_{}", Uuid::new_v4().simple()),
                service_provider_id: provider_id,
                category_id: input.category_id,
                title: input.title.trim().to_string(),
                description: input.description,
                price: input.price,
                session_count: input.session_count,
                duration_minutes: input.duration_minutes,
                validity_days: input.validity_days.unwrap_or(DEFAULT_VALIDITY_DAYS),
                is_active: true,
                is_featured: false,
                created_at: now,
                updated_at: now,
            };
            state.packages.push(package.clone());
            Ok(package)
        })
        .await
    }

    // Purchases

    pub async fn customer_purchases(&self, customer_id: &str) -> Vec<PurchaseView> {
        self.read(|state| {
            let catalog = catalog(state);
            let mut rows: Vec<PurchaseView> = state
                .purchases
                .iter()
                .filter(|purchase| purchase.customer_id == customer_id)
                .map(|purchase| PurchaseView {
                    purchase: purchase.clone(),
                    package: state
                        .packages
                        .iter()
                        .find(|package| package.id == purchase.package_id)
                        .cloned(),
                    service_provider: catalog
                        .provider(&purchase.service_provider_id)
                        .map(ProviderSummary::from),
                })
                .collect();
            rows.sort_by(|left, right| {
                right
                    .purchase
                    .purchase_date
                    .cmp(&left.purchase.purchase_date)
            });
            rows
        })
        .await
    }

    pub async fn create_purchase(
        &self,
        customer: &User,
        package_id: &str,
        promotion_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PackagePurchase, MarketplaceStoreError> {
        self.mutate(|state| {
            let package = state
                .packages
                .iter()
                .find(|package| package.id == package_id && package.is_active)
                .cloned()
                .ok_or(MarketplaceStoreError::NotFound {
                    resource: "Package",
                })?;

            let promotion = match promotion_id {
                Some(promotion_id) => Some(
                    state
                        .promotions
                        .iter()
                        .find(|promotion| promotion.id == promotion_id)
                        .cloned()
                        .ok_or_else(|| {
                            ValidationError::new(
                                "promotionId",
                                "Promotion is not available for this package.",
                            )
                        })?,
                ),
                None => None,
            };

            let quote = quote_purchase(
                &package,
                promotion.as_ref(),
                &state.commission,
                now.date_naive(),
            )?;

            let expiry_date = now
                .checked_add_signed(Duration::days(i64::from(package.validity_days)))
                .ok_or_else(|| {
                    MarketplaceStoreError::from(ValidationError::new(
                        "packageId",
                        "Package validity is out of range.",
                    ))
                })?;

            let id = format!("pur_{}", Uuid::new_v4().simple());
            let purchase = PackagePurchase {
                transaction_id: Some(format!("tx_{id}")),
                id,
                customer_id: customer.id.clone(),
                package_id: package.id.clone(),
                service_provider_id: package.service_provider_id.clone(),
                promotion_id: promotion.map(|promotion| promotion.id),
                original_price: quote.original_price,
                final_price: quote.final_price,
                commission_amount: quote.commission_amount,
                sessions_total: quote.sessions_total,
                sessions_used: 0,
                sessions_remaining: quote.sessions_total,
                purchase_date: now,
                expiry_date: Some(expiry_date),
                status: PurchaseStatus::Active,
                payment_status: PaymentStatus::Completed,
                payment_method: Some(DEFAULT_PAYMENT_METHOD.to_string()),
                created_at: now,
                updated_at: now,
            };

            let provider_name = provider_display_name(state, &package.service_provider_id);
            state.transactions.push(Transaction {
                id: format!("txn_{}", Uuid::new_v4().simple()),
                transaction_type: TransactionType::Commission,
                amount: purchase.commission_amount,
                service_provider_id: package.service_provider_id.clone(),
                service_provider_name: provider_name,
                package_title: Some(package.title.clone()),
                customer_name: Some(customer.full_name()),
                date: now,
                status: TransactionStatus::Completed,
            });
            state.purchases.push(purchase.clone());
            Ok(purchase)
        })
        .await
    }

    // Appointments

    pub async fn appointments(&self, filter: &AppointmentFilter) -> Vec<Appointment> {
        self.read(|state| filter.apply(&state.appointments)).await
    }

    pub async fn open_slots(&self, provider_id: &str, date: NaiveDate) -> Vec<String> {
        self.read(|state| open_slots(&state.slots, &state.appointments, provider_id, date))
            .await
    }

    /// Books without checking the purchase or slot; callers validate shape only.
    pub async fn create_appointment(&self, input: NewAppointment) -> Appointment {
        let now = Utc::now();
        let appointment = Appointment {
            id: format!("apt_{}", Uuid::new_v4().simple()),
            package_purchase_id: input.package_purchase_id,
            customer_id: input.customer_id,
            service_provider_id: input.service_provider_id,
            appointment_date: input.appointment_date,
            start_time: input.start_time,
            end_time: input.end_time,
            status: AppointmentStatus::Pending,
            notes: input.notes,
            customer_notes: None,
            provider_notes: None,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.appointments.push(appointment.clone());
        appointment
    }

    pub async fn update_appointment(
        &self,
        appointment_id: &str,
        change: &AppointmentChange,
        now: DateTime<Utc>,
    ) -> Result<Appointment, MarketplaceStoreError> {
        self.mutate(|state| {
            let appointment = find_appointment_mut(state, appointment_id)?;
            let mut updated = appointment.clone();
            change.apply_to(&mut updated)?;
            updated.updated_at = now;
            *appointment = updated.clone();
            Ok(updated)
        })
        .await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Appointment, MarketplaceStoreError> {
        self.mutate(|state| {
            let appointment = find_appointment_mut(state, appointment_id)?;
            appointment.status = AppointmentStatus::Cancelled;
            appointment.updated_at = now;
            Ok(appointment.clone())
        })
        .await
    }

    // Messaging

    pub async fn conversations(&self, user_id: Option<&str>) -> Vec<Conversation> {
        self.read(|state| conversations_for(&state.conversations, user_id))
            .await
    }

    pub async fn messages(&self, conversation_id: &str) -> Vec<Message> {
        self.read(|state| messages_in(&state.messages, conversation_id))
            .await
    }

    pub async fn send_message(
        &self,
        outgoing: OutgoingMessage,
        now: DateTime<Utc>,
    ) -> Result<Message, MarketplaceStoreError> {
        validate_outgoing(&outgoing.sender_id, &outgoing.receiver_id, &outgoing.content)?;

        self.mutate(|state| {
            let sender = state
                .users
                .iter()
                .find(|user| user.id == outgoing.sender_id)
                .cloned();
            let receiver = state
                .users
                .iter()
                .find(|user| user.id == outgoing.receiver_id)
                .cloned();

            let conversation_index = match outgoing.conversation_id.as_deref() {
                Some(conversation_id) => state
                    .conversations
                    .iter()
                    .position(|conversation| conversation.id == conversation_id)
                    .ok_or(MarketplaceStoreError::NotFound {
                        resource: "Conversation",
                    })?,
                None => {
                    state.conversations.push(open_conversation(
                        &outgoing,
                        sender.as_ref(),
                        receiver.as_ref(),
                        now,
                    ));
                    state.conversations.len() - 1
                }
            };

            let conversation = &mut state.conversations[conversation_index];
            let message = Message {
                id: format!("msg_{}", Uuid::new_v4().simple()),
                conversation_id: conversation.id.clone(),
                sender_id: outgoing.sender_id.trim().to_string(),
                receiver_id: outgoing.receiver_id.trim().to_string(),
                sender_type: sender.map(|user| user.user_type),
                receiver_type: receiver.map(|user| user.user_type),
                content: outgoing.content.trim().to_string(),
                timestamp: now,
                is_read: false,
            };
            record_delivery(conversation, &message);
            state.messages.push(message.clone());
            Ok(message)
        })
        .await
    }

    // Profile and settings

    pub async fn profile(
        &self,
        user_id: &str,
    ) -> Result<(User, ProfileDetails), MarketplaceStoreError> {
        self.read(|state| {
            let user = find_user(state, user_id)?.clone();
            let details = state.profiles.get(user_id).cloned().unwrap_or_default();
            Ok((user, details))
        })
        .await
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<(User, ProfileDetails), MarketplaceStoreError> {
        self.mutate(|state| {
            let mut user = find_user(state, user_id)?.clone();
            let mut details = state.profiles.get(user_id).cloned().unwrap_or_default();
            update.apply(&mut user, &mut details)?;
            user.updated_at = now;

            if let Some(stored) = state.users.iter_mut().find(|stored| stored.id == user_id) {
                *stored = user.clone();
            }
            state.profiles.insert(user_id.to_string(), details.clone());
            Ok((user, details))
        })
        .await
    }

    pub async fn user_settings(&self, user_id: &str) -> UserSettings {
        self.read(|state| state.user_settings.get(user_id).cloned().unwrap_or_default())
            .await
    }

    pub async fn save_user_settings(
        &self,
        user_id: &str,
        settings: UserSettings,
    ) -> Result<UserSettings, MarketplaceStoreError> {
        settings.validate()?;
        self.mutate(|state| {
            find_user(state, user_id)?;
            state
                .user_settings
                .insert(user_id.to_string(), settings.clone());
            Ok(settings)
        })
        .await
    }

    pub async fn provider_settings(&self, user_id: &str) -> ProviderSettings {
        self.read(|state| {
            state
                .provider_settings
                .get(user_id)
                .cloned()
                .unwrap_or_default()
        })
        .await
    }

    pub async fn save_provider_settings(
        &self,
        user_id: &str,
        settings: ProviderSettings,
    ) -> Result<ProviderSettings, MarketplaceStoreError> {
        let settings = settings.normalized()?;
        self.mutate(|state| {
            find_user(state, user_id)?;
            state
                .provider_settings
                .insert(user_id.to_string(), settings.clone());
            Ok(settings)
        })
        .await
    }

    // Administration

    pub async fn admin_users(&self, filter: &AdminUserFilter) -> Vec<AdminUserView> {
        self.read(|state| {
            state
                .users
                .iter()
                .filter(|user| filter.matches(user))
                .map(|user| AdminUserView::build(user, &state.providers, &state.purchases))
                .collect()
        })
        .await
    }

    pub async fn apply_admin_action(
        &self,
        user_id: &str,
        action: AdminUserAction,
        now: DateTime<Utc>,
    ) -> Result<AdminUserView, MarketplaceStoreError> {
        self.mutate(|state| {
            let user = state
                .users
                .iter_mut()
                .find(|user| user.id == user_id)
                .ok_or(MarketplaceStoreError::NotFound { resource: "User" })?;
            let provider = state
                .providers
                .iter_mut()
                .find(|provider| provider.user_id == user_id);

            action.apply(user, provider);
            user.updated_at = now;
            let user = user.clone();

            if let Some(provider) = state
                .providers
                .iter_mut()
                .find(|provider| provider.user_id == user_id)
            {
                provider.updated_at = now;
            }

            Ok(AdminUserView::build(
                &user,
                &state.providers,
                &state.purchases,
            ))
        })
        .await
    }

    pub async fn admin_stats(&self, now: DateTime<Utc>) -> AdminStats {
        self.read(|state| {
            admin_stats(
                &AdminStatsInput {
                    users: &state.users,
                    packages: &state.packages,
                    purchases: &state.purchases,
                    categories: &state.categories,
                },
                now,
            )
        })
        .await
    }

    pub async fn transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        self.read(|state| {
            let mut rows: Vec<Transaction> = state
                .transactions
                .iter()
                .filter(|transaction| {
                    filter
                        .transaction_type
                        .is_none_or(|kind| transaction.transaction_type == kind)
                        && filter
                            .status
                            .is_none_or(|status| transaction.status == status)
                })
                .cloned()
                .collect();
            rows.sort_by(|left, right| right.date.cmp(&left.date));
            rows
        })
        .await
    }

    pub async fn commission_settings(&self) -> CommissionSettings {
        self.read(|state| state.commission.clone()).await
    }

    pub async fn update_commission_settings(
        &self,
        patch: CommissionSettingsPatch,
    ) -> Result<CommissionSettings, MarketplaceStoreError> {
        self.mutate(|state| {
            let merged = patch.apply(&state.commission)?;
            state.commission = merged.clone();
            Ok(merged)
        })
        .await
    }

    pub async fn provider_stats(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<ProviderStats, MarketplaceStoreError> {
        self.read(|state| {
            let provider = find_provider_for_user(state, user_id)?;
            Ok(provider_stats(
                &ProviderStatsInput {
                    provider,
                    packages: &state.packages,
                    purchases: &state.purchases,
                    appointments: &state.appointments,
                    reviews: &state.reviews,
                },
                today,
            ))
        })
        .await
    }

    async fn read<T, F>(&self, operation: F) -> T
    where
        F: FnOnce(&MarketplaceState) -> T,
    {
        let state = self.state.read().await;
        operation(&state)
    }

    async fn mutate<T, F>(&self, operation: F) -> Result<T, MarketplaceStoreError>
    where
        F: FnOnce(&mut MarketplaceState) -> Result<T, MarketplaceStoreError>,
    {
        let mut state = self.state.write().await;
        operation(&mut state)
    }
}

fn catalog(state: &MarketplaceState) -> Catalog<'_> {
    Catalog {
        packages: &state.packages,
        providers: &state.providers,
        categories: &state.categories,
        promotions: &state.promotions,
    }
}

fn find_user<'a>(
    state: &'a MarketplaceState,
    user_id: &str,
) -> Result<&'a User, MarketplaceStoreError> {
    state
        .users
        .iter()
        .find(|user| user.id == user_id)
        .ok_or(MarketplaceStoreError::NotFound { resource: "User" })
}

fn find_provider_for_user<'a>(
    state: &'a MarketplaceState,
    user_id: &str,
) -> Result<&'a ServiceProvider, MarketplaceStoreError> {
    state
        .providers
        .iter()
        .find(|provider| provider.user_id == user_id)
        .ok_or(MarketplaceStoreError::NotFound {
            resource: "Service provider profile",
        })
}

fn find_appointment_mut<'a>(
    state: &'a mut MarketplaceState,
    appointment_id: &str,
) -> Result<&'a mut Appointment, MarketplaceStoreError> {
    state
        .appointments
        .iter_mut()
        .find(|appointment| appointment.id == appointment_id)
        .ok_or(MarketplaceStoreError::NotFound {
            resource: "Appointment",
        })
}

fn provider_display_name(state: &MarketplaceState, provider_id: &str) -> String {
    let Some(provider) = state
        .providers
        .iter()
        .find(|provider| provider.id == provider_id)
    else {
        return String::new();
    };
    provider.business_name.clone().unwrap_or_else(|| {
        state
            .users
            .iter()
            .find(|user| user.id == provider.user_id)
            .map(User::full_name)
            .unwrap_or_default()
    })
}

/// Starts a conversation for a first message. The customer side is whichever
/// participant holds a customer account; unknown ids default to the sender.
fn open_conversation(
    outgoing: &OutgoingMessage,
    sender: Option<&User>,
    receiver: Option<&User>,
    now: DateTime<Utc>,
) -> Conversation {
    let receiver_is_customer =
        receiver.is_some_and(|user| user.user_type == UserType::Customer)
            && sender.is_none_or(|user| user.user_type != UserType::Customer);
    let (customer_id, customer, provider_id, provider) = if receiver_is_customer {
        (&outgoing.receiver_id, receiver, &outgoing.sender_id, sender)
    } else {
        (&outgoing.sender_id, sender, &outgoing.receiver_id, receiver)
    };

    Conversation {
        id: format!("conv_{}", Uuid::new_v4().simple()),
        customer_id: customer_id.trim().to_string(),
        service_provider_id: provider_id.trim().to_string(),
        customer_name: customer.map(User::full_name).unwrap_or_default(),
        service_provider_name: provider.map(User::full_name).unwrap_or_default(),
        last_message: String::new(),
        last_message_time: now,
        unread_count: 0,
        is_active: true,
    }
}
