use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::windows::ReminderLead;

/// Every event kind the scheduler can emit. The `*_email_sent` kinds are
/// distinct from the in-app reminder kinds so the sent-marker dedup never
/// depends on notification title text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    QuotationExpiring24h,
    QuotationExpiring2h,
    QuotationExpired,
    BookingReminder24h,
    BookingReminder2h,
    BookingReminder24hEmailSent,
    BookingReminder2hEmailSent,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotationExpiring24h => "quotation_expiring_24h",
            Self::QuotationExpiring2h => "quotation_expiring_2h",
            Self::QuotationExpired => "quotation_expired",
            Self::BookingReminder24h => "booking_reminder_24h",
            Self::BookingReminder2h => "booking_reminder_2h",
            Self::BookingReminder24hEmailSent => "booking_reminder_24h_email_sent",
            Self::BookingReminder2hEmailSent => "booking_reminder_2h_email_sent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "quotation_expiring_24h" => Some(Self::QuotationExpiring24h),
            "quotation_expiring_2h" => Some(Self::QuotationExpiring2h),
            "quotation_expired" => Some(Self::QuotationExpired),
            "booking_reminder_24h" => Some(Self::BookingReminder24h),
            "booking_reminder_2h" => Some(Self::BookingReminder2h),
            "booking_reminder_24h_email_sent" => Some(Self::BookingReminder24hEmailSent),
            "booking_reminder_2h_email_sent" => Some(Self::BookingReminder2hEmailSent),
            _ => None,
        }
    }

    pub fn booking_reminder(lead: ReminderLead) -> Self {
        match lead {
            ReminderLead::Hours24 => Self::BookingReminder24h,
            ReminderLead::Hours2 => Self::BookingReminder2h,
        }
    }

    pub fn booking_reminder_email_sent(lead: ReminderLead) -> Self {
        match lead {
            ReminderLead::Hours24 => Self::BookingReminder24hEmailSent,
            ReminderLead::Hours2 => Self::BookingReminder2hEmailSent,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dedup key: at most one fan-out per (kind, related entity), ever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub related_id: Uuid,
}

/// An event payload destined for every admin recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAlert {
    pub kind: NotificationKind,
    pub related_id: Uuid,
    pub title: String,
    pub message: String,
}

impl AdminAlert {
    pub fn event(&self) -> NotificationEvent {
        NotificationEvent { kind: self.kind, related_id: self.related_id }
    }
}

/// One in-app notification row, per admin recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub related_id: Uuid,
    pub title: String,
    pub message: String,
    pub user_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use crate::windows::ReminderLead;

    use super::NotificationKind;

    #[test]
    fn kind_round_trips_through_its_wire_name() {
        let kinds = [
            NotificationKind::QuotationExpiring24h,
            NotificationKind::QuotationExpiring2h,
            NotificationKind::QuotationExpired,
            NotificationKind::BookingReminder24h,
            NotificationKind::BookingReminder2h,
            NotificationKind::BookingReminder24hEmailSent,
            NotificationKind::BookingReminder2hEmailSent,
        ];

        for kind in kinds {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("quotation_expiring_48h"), None);
    }

    #[test]
    fn email_sent_kinds_are_distinct_from_reminder_kinds() {
        assert_ne!(
            NotificationKind::booking_reminder(ReminderLead::Hours24),
            NotificationKind::booking_reminder_email_sent(ReminderLead::Hours24),
        );
        assert_ne!(
            NotificationKind::booking_reminder(ReminderLead::Hours2),
            NotificationKind::booking_reminder_email_sent(ReminderLead::Hours2),
        );
    }
}
