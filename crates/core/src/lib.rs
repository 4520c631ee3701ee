pub mod calendar;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod windows;

pub use calendar::{google_calendar_link, CalendarEvent};
pub use domain::booking::{
    Booking, BookingId, BookingReminderDetails, BookingStatus, CustomerContact, DriverContact,
    VehicleSummary,
};
pub use domain::notification::{
    AdminAlert, AdminUser, Notification, NotificationEvent, NotificationKind,
};
pub use domain::quotation::{Quotation, QuotationId, QuotationStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{compute_totals, PricingBreakdown, PricingInput};
pub use windows::{ReminderLead, TimeWindow};
