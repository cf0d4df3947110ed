use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{ClientFilter, LoanFilter, PaymentFilter, Store, StoreError, StoreResult};
use crate::client::{ClientRequest, SearchField};
use crate::loan::CreateLoanRequest;
use crate::models::{
    money_amount_violation, Client, Loan, LoanOwnership, LoanStatus, LoanSummary, LoanWithClient,
    NewUser, Payment, PaymentSummary, PaymentType, PaymentWithLoan, User,
};
use crate::payment::RecordPaymentRequest;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    clients: Vec<Client>,
    loans: Vec<Loan>,
    payments: Vec<Payment>,
    last_id: i64,
}

/// Mirrors the `NUMERIC(12, 2)` money columns, which reject or round what
/// does not fit
fn check_money(column: &str, amount: &Decimal) -> StoreResult<()> {
    match money_amount_violation(amount) {
        Some(code) => Err(StoreError::Database(format!("{}: {}", column, code))),
        None => Ok(()),
    }
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn client(&self, id: i64) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    fn loan(&self, id: i64) -> Option<&Loan> {
        self.loans.iter().find(|l| l.id == id)
    }

    fn loan_with_client(&self, loan: &Loan) -> Option<LoanWithClient> {
        let client = self.client(loan.client_id)?;
        Some(LoanWithClient {
            loan: loan.clone(),
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: client.email.clone(),
        })
    }

    fn payment_with_loan(&self, payment: &Payment) -> Option<PaymentWithLoan> {
        let loan = self.loan(payment.loan_id)?;
        let client = self.client(loan.client_id)?;
        Some(PaymentWithLoan {
            payment: payment.clone(),
            loan_amount: loan.amount,
            client_id: loan.client_id,
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
        })
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.clients
            .iter()
            .any(|c| c.email == email && Some(c.id) != except)
    }
}

fn client_matches(client: &Client, filter: ClientFilter) -> bool {
    filter.client_id.map_or(true, |id| client.id == id)
}

fn loan_matches(loan: &Loan, filter: LoanFilter) -> bool {
    filter.client_id.map_or(true, |id| loan.client_id == id)
        && filter.status.map_or(true, |s| loan.status == s)
}

fn payment_matches(row: &PaymentWithLoan, filter: PaymentFilter) -> bool {
    filter.client_id.map_or(true, |id| row.client_id == id)
        && filter.loan_id.map_or(true, |id| row.payment.loan_id == id)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// In-memory store
///
/// Intended for tests and local experiments. Mirrors the constraints the
/// PostgreSQL schema enforces: unique usernames and emails, and foreign keys
/// from loans to clients and payments to loans.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn user_exists(&self, username: &str, email: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::UniqueViolation("users".to_string()));
        }

        let user = User {
            id: tables.next_id(),
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_password(&self, id: i64, password_hash: &str) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ensure_client_for_user(&self, first_name: &str, email: &str) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(email, None) {
            return Ok(0);
        }

        let client = Client {
            id: tables.next_id(),
            first_name: first_name.to_string(),
            last_name: String::new(),
            email: email.to_string(),
            phone: None,
            created_at: Utc::now(),
        };
        tables.clients.push(client);
        Ok(1)
    }

    async fn find_client_by_id(&self, id: i64) -> StoreResult<Option<Client>> {
        let tables = self.tables.read().await;
        Ok(tables.client(id).cloned())
    }

    async fn find_client_by_email(&self, email: &str) -> StoreResult<Option<Client>> {
        let tables = self.tables.read().await;
        Ok(tables.clients.iter().find(|c| c.email == email).cloned())
    }

    async fn list_clients(&self, filter: ClientFilter) -> StoreResult<Vec<Client>> {
        let tables = self.tables.read().await;
        let mut clients: Vec<Client> = tables
            .clients
            .iter()
            .filter(|c| client_matches(c, filter))
            .cloned()
            .collect();
        clients.sort_by_key(|c| Reverse((c.created_at, c.id)));
        Ok(clients)
    }

    async fn search_clients(
        &self,
        filter: ClientFilter,
        query: &str,
        field: SearchField,
    ) -> StoreResult<Vec<Client>> {
        let query = query.trim();
        let tables = self.tables.read().await;
        let mut clients: Vec<Client> = tables
            .clients
            .iter()
            .filter(|c| client_matches(c, filter))
            .filter(|c| {
                let phone = c.phone.as_deref().unwrap_or_default();
                let name = contains_ci(&c.first_name, query) || contains_ci(&c.last_name, query);
                match field {
                    SearchField::Name => name,
                    SearchField::Email => contains_ci(&c.email, query),
                    SearchField::Phone => c.phone.is_some() && contains_ci(phone, query),
                    SearchField::Any => {
                        name || contains_ci(&c.email, query)
                            || (c.phone.is_some() && contains_ci(phone, query))
                    }
                }
            })
            .cloned()
            .collect();
        clients.sort_by_key(|c| Reverse((c.created_at, c.id)));
        Ok(clients)
    }

    async fn insert_client(&self, client: &ClientRequest) -> StoreResult<Client> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&client.email, None) {
            return Err(StoreError::UniqueViolation("clients_email_key".to_string()));
        }

        let client = Client {
            id: tables.next_id(),
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            created_at: Utc::now(),
        };
        tables.clients.push(client.clone());
        Ok(client)
    }

    async fn update_client(&self, id: i64, client: &ClientRequest) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        if tables.client(id).is_none() {
            return Ok(0);
        }
        if tables.email_taken(&client.email, Some(id)) {
            return Err(StoreError::UniqueViolation("clients_email_key".to_string()));
        }

        if let Some(existing) = tables.clients.iter_mut().find(|c| c.id == id) {
            existing.first_name = client.first_name.clone();
            existing.last_name = client.last_name.clone();
            existing.email = client.email.clone();
            existing.phone = client.phone.clone();
        }
        Ok(1)
    }

    async fn delete_client(&self, id: i64) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        if tables.loans.iter().any(|l| l.client_id == id) {
            return Err(StoreError::ForeignKeyViolation(
                "loans_client_id_fkey".to_string(),
            ));
        }

        let before = tables.clients.len();
        tables.clients.retain(|c| c.id != id);
        Ok((before - tables.clients.len()) as u64)
    }

    async fn get_loan_with_owner(&self, loan_id: i64) -> StoreResult<Option<LoanOwnership>> {
        let tables = self.tables.read().await;
        let ownership = tables.loan(loan_id).and_then(|loan| {
            tables.client(loan.client_id).map(|client| LoanOwnership {
                id: loan.id,
                client_id: loan.client_id,
                status: loan.status,
                owner_email: client.email.clone(),
            })
        });
        Ok(ownership)
    }

    async fn find_loan(&self, filter: LoanFilter, id: i64) -> StoreResult<Option<LoanWithClient>> {
        let tables = self.tables.read().await;
        Ok(tables
            .loan(id)
            .filter(|l| loan_matches(l, filter))
            .and_then(|l| tables.loan_with_client(l)))
    }

    async fn list_loans(&self, filter: LoanFilter) -> StoreResult<Vec<LoanWithClient>> {
        let tables = self.tables.read().await;
        let mut loans: Vec<LoanWithClient> = tables
            .loans
            .iter()
            .filter(|l| loan_matches(l, filter))
            .filter_map(|l| tables.loan_with_client(l))
            .collect();
        loans.sort_by_key(|l| Reverse((l.loan.created_at, l.loan.id)));
        Ok(loans)
    }

    async fn insert_loan(&self, loan: &CreateLoanRequest) -> StoreResult<Loan> {
        check_money("loans.amount", &loan.amount)?;
        let mut tables = self.tables.write().await;
        if tables.client(loan.client_id).is_none() {
            return Err(StoreError::ForeignKeyViolation(
                "loans_client_id_fkey".to_string(),
            ));
        }

        let loan = Loan {
            id: tables.next_id(),
            client_id: loan.client_id,
            amount: loan.amount,
            interest_rate: loan.interest_rate,
            term_months: loan.term_months,
            start_date: loan.start_date,
            status: LoanStatus::Active,
            created_at: Utc::now(),
        };
        tables.loans.push(loan.clone());
        Ok(loan)
    }

    async fn update_loan_status(&self, id: i64, status: LoanStatus) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        match tables.loans.iter_mut().find(|l| l.id == id) {
            Some(loan) => {
                loan.status = status;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn transition_loan_status(
        &self,
        id: i64,
        from: LoanStatus,
        to: LoanStatus,
    ) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        match tables
            .loans
            .iter_mut()
            .find(|l| l.id == id && l.status == from)
        {
            Some(loan) => {
                loan.status = to;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn loan_summary(&self, filter: LoanFilter) -> StoreResult<LoanSummary> {
        let tables = self.tables.read().await;
        let loans: Vec<&Loan> = tables
            .loans
            .iter()
            .filter(|l| loan_matches(l, filter))
            .collect();

        let count_status =
            |status: LoanStatus| loans.iter().filter(|l| l.status == status).count() as i64;
        let total_rate: Decimal = loans.iter().map(|l| l.interest_rate).sum();
        let avg_interest_rate = if loans.is_empty() {
            None
        } else {
            Some(total_rate / Decimal::from(loans.len()))
        };

        Ok(LoanSummary {
            total_loans: loans.len() as i64,
            total_amount: loans.iter().map(|l| l.amount).sum(),
            avg_interest_rate,
            active_loans: count_status(LoanStatus::Active),
            paid_loans: count_status(LoanStatus::Paid),
            defaulted_loans: count_status(LoanStatus::Defaulted),
            cancelled_loans: count_status(LoanStatus::Cancelled),
        })
    }

    async fn sum_payments_for_loan(&self, loan_id: i64) -> StoreResult<Decimal> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .iter()
            .filter(|p| p.loan_id == loan_id)
            .map(|p| p.amount)
            .sum())
    }

    async fn insert_payment(&self, payment: &RecordPaymentRequest) -> StoreResult<Payment> {
        check_money("payments.amount", &payment.amount)?;
        let mut tables = self.tables.write().await;
        if tables.loan(payment.loan_id).is_none() {
            return Err(StoreError::ForeignKeyViolation(
                "payments_loan_id_fkey".to_string(),
            ));
        }

        let payment = Payment {
            id: tables.next_id(),
            loan_id: payment.loan_id,
            amount: payment.amount,
            payment_date: payment.payment_date,
            payment_type: payment.payment_type,
            notes: payment.notes.clone(),
            created_at: Utc::now(),
        };
        tables.payments.push(payment.clone());
        Ok(payment)
    }

    async fn find_payment(
        &self,
        filter: PaymentFilter,
        id: i64,
    ) -> StoreResult<Option<PaymentWithLoan>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| tables.payment_with_loan(p))
            .filter(|row| payment_matches(row, filter)))
    }

    async fn list_payments(&self, filter: PaymentFilter) -> StoreResult<Vec<PaymentWithLoan>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<PaymentWithLoan> = tables
            .payments
            .iter()
            .filter_map(|p| tables.payment_with_loan(p))
            .filter(|row| payment_matches(row, filter))
            .collect();
        payments.sort_by_key(|row| Reverse((row.payment.payment_date, row.payment.id)));
        Ok(payments)
    }

    async fn payment_summary(&self, filter: PaymentFilter) -> StoreResult<PaymentSummary> {
        let tables = self.tables.read().await;
        let rows: Vec<PaymentWithLoan> = tables
            .payments
            .iter()
            .filter_map(|p| tables.payment_with_loan(p))
            .filter(|row| payment_matches(row, filter))
            .collect();

        let count_type = |kind: PaymentType| {
            rows.iter()
                .filter(|row| row.payment.payment_type == kind)
                .count() as i64
        };

        Ok(PaymentSummary {
            total_payments: rows.len() as i64,
            total_amount: rows.iter().map(|row| row.payment.amount).sum(),
            principal_payments: count_type(PaymentType::Principal),
            interest_payments: count_type(PaymentType::Interest),
            combined_payments: count_type(PaymentType::Both),
        })
    }
}
