use serde::{Deserialize, Serialize};

use crate::ValidationError;
use crate::scheduling::{ensure_time_range, parse_clock_time};

const VISIBILITY_VALUES: &[&str] = &["public", "private", "customers_only"];
const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub booking_reminders: bool,
    pub promotional_emails: bool,
    pub weekly_digest: bool,
    pub profile_visibility: String,
    pub show_booking_history: bool,
    pub allow_provider_contact: bool,
    pub share_location_data: bool,
    pub preferred_city: String,
    pub preferred_categories: Vec<String>,
    pub budget_range: String,
    pub session_duration: String,
    pub default_payment_method: String,
    pub save_payment_info: bool,
    pub auto_renew_packages: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            sms_notifications: false,
            booking_reminders: true,
            promotional_emails: true,
            weekly_digest: false,
            profile_visibility: "public".to_string(),
            show_booking_history: false,
            allow_provider_contact: true,
            share_location_data: true,
            preferred_city: "İstanbul".to_string(),
            preferred_categories: vec![
                "Spor ve Fitness".to_string(),
                "Sağlık ve Wellness".to_string(),
            ],
            budget_range: "1000-2000".to_string(),
            session_duration: "60".to_string(),
            default_payment_method: "credit_card".to_string(),
            save_payment_info: true,
            auto_renew_packages: false,
        }
    }
}

impl UserSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_visibility(&self.profile_visibility)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "18:00".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    pub auto_accept_bookings: bool,
    pub require_advance_booking: bool,
    pub advance_booking_hours: u32,
    pub max_bookings_per_day: u32,
    pub working_days: Vec<String>,
    pub working_hours: WorkingHours,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub booking_reminders: bool,
    pub marketing_emails: bool,
    pub bank_name: String,
    pub account_number: String,
    pub iban: String,
    pub show_phone_number: bool,
    pub show_email: bool,
    pub allow_direct_messages: bool,
    pub profile_visibility: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            auto_accept_bookings: false,
            require_advance_booking: true,
            advance_booking_hours: 24,
            max_bookings_per_day: 8,
            working_days: WEEKDAYS
                .iter()
                .take(5)
                .map(|day| (*day).to_string())
                .collect(),
            working_hours: WorkingHours::default(),
            email_notifications: true,
            sms_notifications: false,
            booking_reminders: true,
            marketing_emails: false,
            bank_name: String::new(),
            account_number: String::new(),
            iban: String::new(),
            show_phone_number: true,
            show_email: false,
            allow_direct_messages: true,
            profile_visibility: "public".to_string(),
        }
    }
}

impl ProviderSettings {
    /// Checks the document and canonicalises working hours and day names.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        validate_visibility(&self.profile_visibility)?;

        let mut days = Vec::with_capacity(self.working_days.len());
        for day in &self.working_days {
            let day = day.trim().to_ascii_lowercase();
            if !WEEKDAYS.contains(&day.as_str()) {
                return Err(ValidationError::new("workingDays", "Unknown weekday."));
            }
            if !days.contains(&day) {
                days.push(day);
            }
        }
        self.working_days = days;

        self.working_hours.start = parse_clock_time("workingHours", &self.working_hours.start)?;
        self.working_hours.end = parse_clock_time("workingHours", &self.working_hours.end)?;
        ensure_time_range(&self.working_hours.start, &self.working_hours.end)
            .map_err(|error| ValidationError::new("workingHours", error.message))?;

        if self.max_bookings_per_day == 0 {
            return Err(ValidationError::new(
                "maxBookingsPerDay",
                "Allow at least one booking per day.",
            ));
        }
        Ok(self)
    }
}

fn validate_visibility(value: &str) -> Result<(), ValidationError> {
    if VISIBILITY_VALUES.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "profileVisibility",
            "Visibility must be public, private or customers_only.",
        ))
    }
}
