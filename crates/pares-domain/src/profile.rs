use serde::{Deserialize, Serialize};

use crate::ValidationError;
use crate::model::{ProfileDetails, User};

const DEFAULT_PHONE: &str = "+90 555 000 0000";
const DEFAULT_CITY: &str = "İstanbul";
const DEFAULT_DISTRICT: &str = "Merkez";
const DEFAULT_EXPERIENCE: &str = "0";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub district: String,
    pub interests: Vec<String>,
    pub bio: String,
    pub avatar: Option<String>,
}

impl ProfileView {
    pub fn build(user: &User, details: &ProfileDetails) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: or_default(user.phone.as_deref(), DEFAULT_PHONE),
            city: or_default(details.city.as_deref(), DEFAULT_CITY),
            district: or_default(details.district.as_deref(), DEFAULT_DISTRICT),
            interests: details.interests.clone(),
            bio: or_default(details.bio.as_deref(), ""),
            avatar: details.avatar.clone().or_else(|| user.avatar_url.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfileView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub district: String,
    pub address: String,
    pub profession: String,
    pub experience: String,
    pub bio: String,
    pub specialties: String,
    pub avatar: Option<String>,
}

impl ProviderProfileView {
    pub fn build(user: &User, details: &ProfileDetails) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: or_default(user.phone.as_deref(), DEFAULT_PHONE),
            city: or_default(details.city.as_deref(), DEFAULT_CITY),
            district: or_default(details.district.as_deref(), DEFAULT_DISTRICT),
            address: or_default(details.address.as_deref(), ""),
            profession: or_default(details.profession.as_deref(), ""),
            experience: or_default(details.experience.as_deref(), DEFAULT_EXPERIENCE),
            bio: or_default(details.bio.as_deref(), ""),
            specialties: or_default(details.specialties.as_deref(), ""),
            avatar: details.avatar.clone().or_else(|| user.avatar_url.clone()),
        }
    }
}

/// Editable account fields. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub interests: Option<Vec<String>>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub profession: Option<String>,
    pub experience: Option<String>,
    pub specialties: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut User, details: &mut ProfileDetails) -> Result<(), ValidationError> {
        if let Some(first_name) = self.first_name {
            user.first_name = required_name("firstName", &first_name)?;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = required_name("lastName", &last_name)?;
        }
        if let Some(phone) = self.phone {
            user.phone = optional_text(&phone);
        }
        if let Some(city) = self.city {
            details.city = optional_text(&city);
        }
        if let Some(district) = self.district {
            details.district = optional_text(&district);
        }
        if let Some(interests) = self.interests {
            details.interests = interests
                .iter()
                .filter_map(|interest| optional_text(interest))
                .collect();
        }
        if let Some(bio) = self.bio {
            details.bio = optional_text(&bio);
        }
        if let Some(address) = self.address {
            details.address = optional_text(&address);
        }
        if let Some(profession) = self.profession {
            details.profession = optional_text(&profession);
        }
        if let Some(experience) = self.experience {
            details.experience = optional_text(&experience);
        }
        if let Some(specialties) = self.specialties {
            details.specialties = optional_text(&specialties);
        }
        Ok(())
    }
}

fn required_name(field: &'static str, value: &str) -> Result<String, ValidationError> {
    optional_text(value).ok_or_else(|| ValidationError::new(field, "Name cannot be empty."))
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn or_default(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}
