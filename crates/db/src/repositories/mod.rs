use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use fleetline_core::domain::booking::{Booking, BookingId, BookingReminderDetails};
use fleetline_core::domain::notification::{
    AdminAlert, AdminUser, Notification, NotificationEvent,
};
use fleetline_core::domain::quotation::{Quotation, QuotationId};
use fleetline_core::windows::TimeWindow;

pub mod admin;
pub mod booking;
pub mod notification;
pub mod quotation;

pub use admin::SqlAdminDirectory;
pub use booking::SqlBookingRepository;
pub use notification::SqlNotificationRepository;
pub use quotation::SqlQuotationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait QuotationRepository: Send + Sync {
    async fn insert(&self, quotation: &Quotation) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError>;

    /// Sent, unconverted quotations whose expiry falls inside `window`.
    async fn sent_expiring_within(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<Quotation>, RepositoryError>;

    /// Sent, unconverted quotations already past their expiry.
    async fn sent_expired_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Quotation>, RepositoryError>;

    /// Flip to `expired`, guarded on the current status so re-runs are
    /// no-ops. Returns whether a row actually changed.
    async fn mark_expired(
        &self,
        id: &QuotationId,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError>;

    /// Bookings on `date` whose status is reminder-eligible.
    async fn reminderable_on(&self, date: NaiveDate) -> Result<Vec<Booking>, RepositoryError>;

    /// Booking plus driver/vehicle/customer/creator snapshots for the
    /// reminder email.
    async fn reminder_details(
        &self,
        id: &BookingId,
    ) -> Result<Option<BookingReminderDetails>, RepositoryError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanoutOutcome {
    /// This run claimed the event and wrote one row per recipient.
    Delivered { recipients: usize },
    /// A previous run already claimed the event; nothing was written.
    AlreadyTriggered,
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Read-only probe of the dedup ledger.
    async fn event_triggered(&self, event: &NotificationEvent) -> Result<bool, RepositoryError>;

    /// Claim the event and fan the alert out to `recipients` in one
    /// transaction. The ledger's primary key makes the claim race-free:
    /// losing an insert conflict means another run owns the event.
    async fn claim_and_fan_out(
        &self,
        alert: &AdminAlert,
        recipients: &[AdminUser],
        now: DateTime<Utc>,
    ) -> Result<FanoutOutcome, RepositoryError>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError>;

    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RepositoryError>;

    async fn list_for_event(
        &self,
        event: &NotificationEvent,
    ) -> Result<Vec<Notification>, RepositoryError>;
}

#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn insert(&self, admin: &AdminUser) -> Result<(), RepositoryError>;

    /// All recipients with an admin role, matched case-insensitively.
    async fn list_admins(&self) -> Result<Vec<AdminUser>, RepositoryError>;
}
