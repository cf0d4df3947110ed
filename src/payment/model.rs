//! Payment request models
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

pub use crate::models::{Payment, PaymentSummary, PaymentType, PaymentWithLoan};

use crate::models::money_amount_violation;

/// Request to record a payment against a loan
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub loan_id: i64,
    #[validate(custom = "validate_amount")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub notes: Option<String>,
}

impl RecordPaymentRequest {
    /// Trim notes, dropping them when blank
    pub fn normalized(mut self) -> Self {
        self.notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    match money_amount_violation(amount) {
        Some(code) => Err(ValidationError::new(code)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_frontend_payload() {
        let req: RecordPaymentRequest = serde_json::from_str(
            r#"{"loan_id":3,"amount":250.5,"payment_date":"2024-03-01","payment_type":"both","notes":"  march  "}"#,
        )
        .unwrap();
        let req = req.normalized();

        assert_eq!(req.loan_id, 3);
        assert_eq!(req.amount, Decimal::new(2505, 1));
        assert_eq!(req.payment_type, PaymentType::Both);
        assert_eq!(req.notes.as_deref(), Some("march"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_amount() {
        let req = RecordPaymentRequest {
            loan_id: 1,
            amount: Decimal::from(-10),
            payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            payment_type: PaymentType::Principal,
            notes: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_rejects_amounts_the_money_column_cannot_hold() {
        let with_amount = |amount: &str| RecordPaymentRequest {
            loan_id: 1,
            amount: amount.parse().unwrap(),
            payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            payment_type: PaymentType::Interest,
            notes: None,
        };

        assert!(with_amount("0.005").validate().is_err());
        assert!(with_amount("12345678901234.56").validate().is_err());
        assert!(with_amount("0.01").validate().is_ok());
        assert!(with_amount("0").validate().is_ok());
        assert!(with_amount("9999999999.99").validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_payment_type() {
        let result = serde_json::from_str::<RecordPaymentRequest>(
            r#"{"loan_id":3,"amount":1,"payment_date":"2024-03-01","payment_type":"fee"}"#,
        );
        assert!(result.is_err());
    }
}
