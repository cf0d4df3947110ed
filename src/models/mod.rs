//! Data models for the Loanbook backend

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

pub mod auth;
pub use auth::*;

/// Borrower record
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Loan status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Paid,
    Defaulted,
    Cancelled,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Paid => "paid",
            LoanStatus::Defaulted => "defaulted",
            LoanStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest value a `NUMERIC(12, 2)` money column holds
pub fn max_money_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Reason a money amount cannot be stored exactly, if any
///
/// Money columns are `NUMERIC(12, 2)`: non-negative, at most two decimal
/// places, at most `9_999_999_999.99`.
pub fn money_amount_violation(amount: &Decimal) -> Option<&'static str> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Some("amount_negative")
    } else if amount.normalize().scale() > 2 {
        Some("amount_too_precise")
    } else if *amount > max_money_amount() {
        Some("amount_too_large")
    } else {
        None
    }
}

/// Loan model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Loan {
    pub id: i64,
    pub client_id: i64,
    pub amount: Decimal,
    /// Percent, 0 to 100
    pub interest_rate: Decimal,
    pub term_months: i32,
    pub start_date: NaiveDate,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

/// Loan joined with the owning client's contact details
#[derive(Debug, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct LoanWithClient {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub loan: Loan,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Minimal loan view used to authorize a payment
#[derive(Debug, sqlx::FromRow, Clone, PartialEq)]
pub struct LoanOwnership {
    pub id: i64,
    pub client_id: i64,
    pub status: LoanStatus,
    pub owner_email: String,
}

/// What a payment pays down
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "payment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Principal,
    Interest,
    Both,
}

/// Payment model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub loan_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payment joined with its loan principal and the borrower's name
#[derive(Debug, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct PaymentWithLoan {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub loan_amount: Decimal,
    pub client_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Aggregate figures over the visible loans
#[derive(Debug, Serialize, sqlx::FromRow, Clone, PartialEq, Default)]
pub struct LoanSummary {
    pub total_loans: i64,
    pub total_amount: Decimal,
    pub avg_interest_rate: Option<Decimal>,
    pub active_loans: i64,
    pub paid_loans: i64,
    pub defaulted_loans: i64,
    pub cancelled_loans: i64,
}

/// Aggregate figures over the visible payments
#[derive(Debug, Serialize, sqlx::FromRow, Clone, PartialEq, Default)]
pub struct PaymentSummary {
    pub total_payments: i64,
    pub total_amount: Decimal,
    pub principal_payments: i64,
    pub interest_payments: i64,
    pub combined_payments: i64,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Body of acknowledgement-only responses
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
