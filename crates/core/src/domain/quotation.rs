use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotationId(pub Uuid);

impl std::fmt::Display for QuotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Approved,
    Rejected,
    Expired,
    Converted,
    Paid,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Converted => "converted",
            Self::Paid => "paid",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "expired" => Some(Self::Expired),
            "converted" => Some(Self::Converted),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: QuotationId,
    pub quote_number: i64,
    pub customer_name: String,
    pub service_type: String,
    pub status: QuotationStatus,
    pub expiry_date: DateTime<Utc>,
    pub converted_to_booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quotation {
    pub fn is_converted(&self) -> bool {
        self.converted_to_booking_id.is_some()
    }

    pub fn can_transition_to(&self, next: QuotationStatus) -> bool {
        matches!(
            (self.status, next),
            (QuotationStatus::Draft, QuotationStatus::Sent)
                | (QuotationStatus::Sent, QuotationStatus::Approved)
                | (QuotationStatus::Sent, QuotationStatus::Rejected)
                | (QuotationStatus::Sent, QuotationStatus::Expired)
                | (QuotationStatus::Approved, QuotationStatus::Converted)
                | (QuotationStatus::Approved, QuotationStatus::Paid)
                | (QuotationStatus::Converted, QuotationStatus::Paid)
        )
    }

    pub fn transition_to(&mut self, next: QuotationStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidQuotationTransition { from: self.status, to: next })
    }

    /// Expiry fires only from `sent`; converted quotations never expire.
    pub fn expire(&mut self) -> Result<(), DomainError> {
        if self.is_converted() {
            return Err(DomainError::InvariantViolation(
                "converted quotations cannot expire".to_string(),
            ));
        }
        self.transition_to(QuotationStatus::Expired)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{Quotation, QuotationId, QuotationStatus};

    fn quotation(status: QuotationStatus) -> Quotation {
        Quotation {
            id: QuotationId(Uuid::new_v4()),
            quote_number: 42,
            customer_name: "Acme Corp".to_string(),
            service_type: "Airport Transfer".to_string(),
            status,
            expiry_date: Utc::now() - Duration::hours(1),
            converted_to_booking_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sent_quotation_can_expire() {
        let mut quotation = quotation(QuotationStatus::Sent);
        quotation.expire().expect("sent -> expired");
        assert_eq!(quotation.status, QuotationStatus::Expired);
    }

    #[test]
    fn draft_quotation_cannot_expire() {
        let mut quotation = quotation(QuotationStatus::Draft);
        let error = quotation.expire().expect_err("draft -> expired should fail");
        assert!(matches!(error, crate::errors::DomainError::InvalidQuotationTransition { .. }));
    }

    #[test]
    fn converted_quotation_cannot_expire() {
        let mut quotation = quotation(QuotationStatus::Sent);
        quotation.converted_to_booking_id = Some(Uuid::new_v4());

        let error = quotation.expire().expect_err("converted should never expire");
        assert!(matches!(error, crate::errors::DomainError::InvariantViolation(_)));
    }
}
