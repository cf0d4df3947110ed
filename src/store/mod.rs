//! Persistence gateway for users, clients, loans and payments
//!
//! Services talk to storage only through the [`Store`] trait. `PgStore` backs
//! the running server; `MemoryStore` backs tests and local experiments.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::client::{ClientRequest, SearchField};
use crate::loan::CreateLoanRequest;
use crate::models::{
    Client, Loan, LoanOwnership, LoanStatus, LoanSummary, LoanWithClient, NewUser, Payment,
    PaymentSummary, PaymentWithLoan, User,
};
use crate::payment::RecordPaymentRequest;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(db_err.message().to_string());
            }
        }
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Restricts client queries. `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientFilter {
    pub client_id: Option<i64>,
}

/// Restricts loan queries. `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub client_id: Option<i64>,
    pub status: Option<LoanStatus>,
}

/// Restricts payment queries. `client_id` matches the owning loan's client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub client_id: Option<i64>,
    pub loan_id: Option<i64>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the health endpoint
    async fn health_check(&self) -> StoreResult<()>;

    // Users

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// True when a user already holds either the username or the email
    async fn user_exists(&self, username: &str, email: &str) -> StoreResult<bool>;

    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn update_user_password(&self, id: i64, password_hash: &str) -> StoreResult<u64>;

    /// Create a client row for a newly registered user unless the email is
    /// already taken. Returns the number of rows inserted.
    async fn ensure_client_for_user(&self, first_name: &str, email: &str) -> StoreResult<u64>;

    // Clients

    async fn find_client_by_id(&self, id: i64) -> StoreResult<Option<Client>>;

    async fn find_client_by_email(&self, email: &str) -> StoreResult<Option<Client>>;

    /// Newest first
    async fn list_clients(&self, filter: ClientFilter) -> StoreResult<Vec<Client>>;

    /// Case-insensitive substring match on the chosen field(s)
    async fn search_clients(
        &self,
        filter: ClientFilter,
        query: &str,
        field: SearchField,
    ) -> StoreResult<Vec<Client>>;

    async fn insert_client(&self, client: &ClientRequest) -> StoreResult<Client>;

    async fn update_client(&self, id: i64, client: &ClientRequest) -> StoreResult<u64>;

    async fn delete_client(&self, id: i64) -> StoreResult<u64>;

    // Loans

    async fn get_loan_with_owner(&self, loan_id: i64) -> StoreResult<Option<LoanOwnership>>;

    async fn find_loan(&self, filter: LoanFilter, id: i64) -> StoreResult<Option<LoanWithClient>>;

    /// Newest first
    async fn list_loans(&self, filter: LoanFilter) -> StoreResult<Vec<LoanWithClient>>;

    /// Inserts with status `active`
    async fn insert_loan(&self, loan: &CreateLoanRequest) -> StoreResult<Loan>;

    /// Unconditional status write. Returns affected rows.
    async fn update_loan_status(&self, id: i64, status: LoanStatus) -> StoreResult<u64>;

    /// Status write guarded by the current status. Returns affected rows.
    async fn transition_loan_status(
        &self,
        id: i64,
        from: LoanStatus,
        to: LoanStatus,
    ) -> StoreResult<u64>;

    async fn loan_summary(&self, filter: LoanFilter) -> StoreResult<LoanSummary>;

    // Payments

    /// Zero when the loan has no payments
    async fn sum_payments_for_loan(&self, loan_id: i64) -> StoreResult<Decimal>;

    async fn insert_payment(&self, payment: &RecordPaymentRequest) -> StoreResult<Payment>;

    async fn find_payment(
        &self,
        filter: PaymentFilter,
        id: i64,
    ) -> StoreResult<Option<PaymentWithLoan>>;

    /// Latest payment date first
    async fn list_payments(&self, filter: PaymentFilter) -> StoreResult<Vec<PaymentWithLoan>>;

    async fn payment_summary(&self, filter: PaymentFilter) -> StoreResult<PaymentSummary>;
}

pub type SharedStore = Arc<dyn Store>;
