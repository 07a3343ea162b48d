use chrono::{NaiveDate, NaiveTime};

use crate::ValidationError;
use crate::model::{Appointment, AppointmentStatus, AvailableSlot};

const DATE_FORMAT: &str = "%Y-%m-%d";
const CLOCK_FORMAT: &str = "%H:%M";

pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::new(field, "Dates must use the YYYY-MM-DD format."))
}

/// Parses an `HH:MM` wall-clock value and returns it in canonical form.
pub fn parse_clock_time(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    NaiveTime::parse_from_str(raw.trim(), CLOCK_FORMAT)
        .map(|time| time.format(CLOCK_FORMAT).to_string())
        .map_err(|_| ValidationError::new(field, "Times must use the HH:MM format."))
}

pub fn ensure_time_range(start: &str, end: &str) -> Result<(), ValidationError> {
    let start = NaiveTime::parse_from_str(start, CLOCK_FORMAT)
        .map_err(|_| ValidationError::new("startTime", "Times must use the HH:MM format."))?;
    let end = NaiveTime::parse_from_str(end, CLOCK_FORMAT)
        .map_err(|_| ValidationError::new("endTime", "Times must use the HH:MM format."))?;
    if end <= start {
        return Err(ValidationError::new(
            "endTime",
            "End time must be after the start time.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub provider_id: Option<String>,
    pub customer_id: Option<String>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.provider_id
            .as_deref()
            .is_none_or(|provider_id| appointment.service_provider_id == provider_id)
            && self
                .customer_id
                .as_deref()
                .is_none_or(|customer_id| appointment.customer_id == customer_id)
    }

    /// Matching appointments ordered by date, then start time.
    pub fn apply(&self, appointments: &[Appointment]) -> Vec<Appointment> {
        let mut rows: Vec<Appointment> = appointments
            .iter()
            .filter(|appointment| self.matches(appointment))
            .cloned()
            .collect();
        rows.sort_by(|left, right| {
            left.appointment_date
                .cmp(&right.appointment_date)
                .then_with(|| left.start_time.cmp(&right.start_time))
        });
        rows
    }
}

/// Published slots for a provider on `date`, minus start times already held
/// by an appointment that has not been cancelled.
pub fn open_slots(
    slots: &[AvailableSlot],
    appointments: &[Appointment],
    provider_id: &str,
    date: NaiveDate,
) -> Vec<String> {
    let Some(published) = slots
        .iter()
        .find(|slot| slot.service_provider_id == provider_id && slot.date == date)
    else {
        return Vec::new();
    };

    published
        .slots
        .iter()
        .filter(|start| {
            !appointments.iter().any(|appointment| {
                appointment.service_provider_id == provider_id
                    && appointment.appointment_date == date
                    && appointment.status != AppointmentStatus::Cancelled
                    && &appointment.start_time == *start
            })
        })
        .cloned()
        .collect()
}

/// Changes a provider or customer may apply to a booked appointment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentChange {
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentChange {
    /// Applies the change; blank values leave the stored field untouched.
    pub fn apply_to(&self, appointment: &mut Appointment) -> Result<(), ValidationError> {
        if let Some(raw) = self.status.as_deref().filter(|value| !value.trim().is_empty()) {
            appointment.status = AppointmentStatus::parse(raw)
                .ok_or_else(|| ValidationError::new("status", "Unknown appointment status."))?;
        }
        if let Some(notes) = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            appointment.notes = Some(notes.to_string());
        }
        Ok(())
    }
}
