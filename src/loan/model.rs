//! Loan request models
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

pub use crate::models::{Loan, LoanStatus, LoanSummary, LoanWithClient};

use crate::models::money_amount_violation;

/// Request to create a new loan
///
/// There is no status field: every loan starts out active.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLoanRequest {
    pub client_id: i64,
    #[validate(custom = "validate_principal")]
    pub amount: Decimal,
    #[validate(custom = "validate_interest_rate")]
    pub interest_rate: Decimal,
    #[validate(range(min = 1, message = "term must be at least one month"))]
    pub term_months: i32,
    pub start_date: NaiveDate,
}

/// Admin override of a loan's status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLoanStatusRequest {
    pub status: LoanStatus,
}

/// Query for listing loans
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub status: Option<LoanStatus>,
}

fn validate_principal(amount: &Decimal) -> Result<(), ValidationError> {
    match money_amount_violation(amount) {
        Some(code) => Err(ValidationError::new(code)),
        None => Ok(()),
    }
}

fn validate_interest_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO || *rate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("interest_rate_out_of_range"));
    }
    if rate.normalize().scale() > 2 {
        return Err(ValidationError::new("interest_rate_too_precise"));
    }
    Ok(())
}
