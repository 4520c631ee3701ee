//! Trip reminder composition and dispatch.

use std::sync::Arc;

use chrono::Duration;
use tera::{Context, Tera};

use fleetline_core::calendar::{google_calendar_link, CalendarEvent};
use fleetline_core::config::EmailConfig;
use fleetline_core::domain::booking::BookingReminderDetails;
use fleetline_core::windows::ReminderLead;

use crate::message::{EmailMessage, MailError};
use crate::transport::MailTransport;

const HTML_TEMPLATE: &str = "trip_reminder.html.tera";
const TEXT_TEMPLATE: &str = "trip_reminder.txt.tera";

const LOCATION_TBD: &str = "Location TBD";
const DRIVER_TBD: &str = "To be assigned";
const PHONE_TBD: &str = "To be provided";
const VEHICLE_TBD: &str = "To be assigned";

#[derive(Clone, Debug)]
pub struct MailerSettings {
    pub from_address: String,
    pub operations_address: String,
    pub company_name: String,
    pub website_url: String,
}

impl From<&EmailConfig> for MailerSettings {
    fn from(config: &EmailConfig) -> Self {
        Self {
            from_address: config.from_address.clone(),
            operations_address: config.operations_address.clone(),
            company_name: config.company_name.clone(),
            website_url: config.website_url.clone(),
        }
    }
}

pub struct ReminderMailer {
    tera: Tera,
    settings: MailerSettings,
    transport: Arc<dyn MailTransport>,
}

impl ReminderMailer {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        settings: MailerSettings,
    ) -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            HTML_TEMPLATE,
            include_str!("../../../templates/email/trip_reminder.html.tera"),
        )?;
        tera.add_raw_template(
            TEXT_TEMPLATE,
            include_str!("../../../templates/email/trip_reminder.txt.tera"),
        )?;

        Ok(Self { tera, settings, transport })
    }

    pub fn settings(&self) -> &MailerSettings {
        &self.settings
    }

    /// Compose and dispatch one reminder. Fails with a skippable
    /// `MissingContact` when the booking cannot be delivered to.
    pub async fn send_trip_reminder(
        &self,
        details: &BookingReminderDetails,
        lead: ReminderLead,
    ) -> Result<EmailMessage, MailError> {
        let message = self.compose_trip_reminder(details, lead)?;
        self.transport.send(&message).await?;
        Ok(message)
    }

    pub fn compose_trip_reminder(
        &self,
        details: &BookingReminderDetails,
        lead: ReminderLead,
    ) -> Result<EmailMessage, MailError> {
        let booking = &details.booking;
        let missing = |field: &'static str| MailError::MissingContact {
            field,
            reference: booking.reference.clone(),
        };

        let customer_email = details
            .customer
            .as_ref()
            .and_then(|customer| customer.email.clone())
            .ok_or_else(|| missing("customer"))?;
        let driver_email = details
            .driver
            .as_ref()
            .and_then(|driver| driver.email.clone())
            .ok_or_else(|| missing("driver"))?;
        let creator_email = details.creator_email.clone().ok_or_else(|| missing("creator"))?;

        let calendar_link = self.calendar_link(details);

        let urgency_prefix = if lead.is_urgent() { "URGENT: " } else { "" };
        let subject = format!(
            "{urgency_prefix}Your Trip is Coming Soon - {} ({} reminder)",
            booking.reference,
            lead.time_text(),
        );

        let mut context = Context::new();
        context.insert("reference", &booking.reference);
        context.insert("service_name", &booking.service_name);
        context.insert("date", &booking.date.format("%d/%m/%Y").to_string());
        context.insert("time", &booking.time.format("%I:%M %p").to_string());
        context.insert(
            "pickup_location",
            booking.pickup_location.as_deref().unwrap_or(LOCATION_TBD),
        );
        context.insert(
            "dropoff_location",
            booking.dropoff_location.as_deref().unwrap_or(LOCATION_TBD),
        );
        context.insert("notes", &booking.notes);
        context.insert(
            "customer_name",
            details
                .customer
                .as_ref()
                .map(|customer| customer.name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or("there"),
        );
        context.insert(
            "driver_name",
            &details
                .driver
                .as_ref()
                .map(|driver| driver.full_name())
                .unwrap_or_else(|| DRIVER_TBD.to_string()),
        );
        context.insert(
            "driver_phone",
            details
                .driver
                .as_ref()
                .and_then(|driver| driver.phone.as_deref())
                .unwrap_or(PHONE_TBD),
        );
        context.insert(
            "vehicle_plate",
            details
                .vehicle
                .as_ref()
                .map(|vehicle| vehicle.plate_number.as_str())
                .unwrap_or(VEHICLE_TBD),
        );
        context.insert(
            "vehicle_model",
            &details
                .vehicle
                .as_ref()
                .map(|vehicle| vehicle.label())
                .unwrap_or_else(|| VEHICLE_TBD.to_string()),
        );
        context.insert("time_text", lead.time_text());
        context.insert("time_text_upper", &lead.time_text().to_uppercase());
        context.insert("urgent", &lead.is_urgent());
        context.insert("urgency_prefix", urgency_prefix);
        context.insert("calendar_link", &calendar_link);
        context.insert("company_name", &self.settings.company_name);
        context.insert("website_url", &self.settings.website_url);

        let html = self.tera.render(HTML_TEMPLATE, &context)?;
        let text = self.tera.render(TEXT_TEMPLATE, &context)?;

        Ok(EmailMessage {
            from: self.settings.from_address.clone(),
            to: vec![customer_email],
            bcc: vec![creator_email, driver_email, self.settings.operations_address.clone()],
            subject,
            html,
            text,
        })
    }

    fn calendar_link(&self, details: &BookingReminderDetails) -> String {
        let booking = &details.booking;
        let start = booking.starts_at();
        // Fixed 2h slot; actual trip length is not tracked on the booking.
        let end = start + Duration::hours(2);

        let pickup = booking.pickup_location.as_deref().unwrap_or(LOCATION_TBD);
        let dropoff = booking.dropoff_location.as_deref().unwrap_or(LOCATION_TBD);

        google_calendar_link(&CalendarEvent {
            title: format!("Vehicle Service: {}", booking.service_name),
            description: format!(
                "Booking ID: {}\nService: {}\nPickup: {pickup}\nDropoff: {dropoff}",
                booking.reference, booking.service_name,
            ),
            location: format!("{pickup} to {dropoff}"),
            start,
            end,
        })
    }
}
