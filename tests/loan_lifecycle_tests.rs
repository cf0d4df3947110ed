//! Loan lifecycle tests against the in-memory store
//!
//! Cover payment recording, visibility rules, and automatic settlement.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use loanbook_server::client::{ClientRequest, ClientService, SearchField};
use loanbook_server::error::ServiceError;
use loanbook_server::loan::{reconcile, CreateLoanRequest, LoanService, LoanStatus, Reconciliation};
use loanbook_server::models::{
    Client, Loan, LoanOwnership, LoanSummary, LoanWithClient, NewUser, Payment, PaymentSummary,
    PaymentType, PaymentWithLoan, User, UserRole,
};
use loanbook_server::payment::{PaymentService, RecordPaymentRequest};
use loanbook_server::scope::{resolve_scope, Identity, Scope};
use loanbook_server::store::{
    ClientFilter, LoanFilter, MemoryStore, PaymentFilter, SharedStore, Store, StoreError,
    StoreResult,
};

// ============================================================================
// Fixtures
// ============================================================================

struct Fixture {
    store: SharedStore,
    clients: ClientService,
    loans: LoanService,
    payments: PaymentService,
}

impl Fixture {
    fn new() -> Self {
        let store: SharedStore = Arc::new(MemoryStore::new());
        Self {
            clients: ClientService::new(store.clone()),
            loans: LoanService::new(store.clone()),
            payments: PaymentService::new(store.clone()),
            store,
        }
    }

    async fn client(&self, first_name: &str, email: &str) -> i64 {
        self.clients
            .create_client(ClientRequest {
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                email: email.to_string(),
                phone: Some("+1 555 0100".to_string()),
            })
            .await
            .unwrap()
            .id
    }

    async fn loan(&self, client_id: i64, amount: &str, rate: &str) -> i64 {
        self.loans
            .create_loan(CreateLoanRequest {
                client_id,
                amount: dec(amount),
                interest_rate: dec(rate),
                term_months: 12,
                start_date: date(2024, 1, 1),
            })
            .await
            .unwrap()
            .id
    }

    async fn status(&self, loan_id: i64) -> LoanStatus {
        self.loans
            .get_loan(Scope::All, loan_id)
            .await
            .unwrap()
            .loan
            .status
    }

    async fn payment_count(&self, loan_id: i64) -> usize {
        self.payments
            .list_payments_for_loan(Scope::All, loan_id)
            .await
            .unwrap()
            .len()
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn admin() -> Identity {
    Identity {
        user_id: 1,
        role: UserRole::Admin,
        email: "admin@example.com".to_string(),
    }
}

fn user(email: &str) -> Identity {
    Identity {
        user_id: 2,
        role: UserRole::User,
        email: email.to_string(),
    }
}

fn payment(loan_id: i64, amount: &str) -> RecordPaymentRequest {
    RecordPaymentRequest {
        loan_id,
        amount: dec(amount),
        payment_date: date(2024, 2, 1),
        payment_type: PaymentType::Both,
        notes: None,
    }
}

// ============================================================================
// Settlement
// ============================================================================

#[tokio::test]
async fn test_loan_paid_once_principal_and_interest_covered() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(client, "1000", "10").await;

    fx.payments
        .record_payment(&admin(), payment(loan, "600"))
        .await
        .unwrap();
    assert_eq!(fx.status(loan).await, LoanStatus::Active);

    fx.payments
        .record_payment(&admin(), payment(loan, "500"))
        .await
        .unwrap();
    assert_eq!(fx.status(loan).await, LoanStatus::Paid);
}

#[tokio::test]
async fn test_exact_principal_is_not_enough() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(client, "1000", "10").await;

    fx.payments
        .record_payment(&admin(), payment(loan, "1000"))
        .await
        .unwrap();
    assert_eq!(fx.status(loan).await, LoanStatus::Active);

    let outcome = reconcile(fx.store.as_ref(), loan).await.unwrap();
    assert_eq!(
        outcome,
        Reconciliation::Outstanding {
            total_paid: dec("1000"),
            total_due: dec("1100"),
        }
    );
}

#[tokio::test]
async fn test_overpayment_marks_paid_once() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(client, "1000", "10").await;

    let recorded = fx
        .payments
        .record_payment(&admin(), payment(loan, "5000"))
        .await
        .unwrap();
    assert_eq!(recorded.amount, dec("5000"));
    assert_eq!(fx.status(loan).await, LoanStatus::Paid);

    // Already settled, so further passes change nothing
    let again = reconcile(fx.store.as_ref(), loan).await.unwrap();
    assert_eq!(
        again,
        Reconciliation::NotActive {
            status: LoanStatus::Paid
        }
    );
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(client, "200", "0").await;

    fx.payments
        .record_payment(&admin(), payment(loan, "200"))
        .await
        .unwrap();
    assert_eq!(fx.status(loan).await, LoanStatus::Paid);

    for _ in 0..2 {
        let outcome = fx.loans.reconcile(loan).await.unwrap();
        assert!(matches!(outcome, Reconciliation::NotActive { .. }));
        assert_eq!(fx.status(loan).await, LoanStatus::Paid);
    }
}

#[tokio::test]
async fn test_reconcile_after_manual_reopen_settles_again() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(client, "100", "5").await;

    fx.payments
        .record_payment(&admin(), payment(loan, "105"))
        .await
        .unwrap();
    fx.loans
        .set_loan_status(loan, LoanStatus::Active)
        .await
        .unwrap();

    let outcome = fx.loans.reconcile(loan).await.unwrap();
    assert_eq!(outcome, Reconciliation::MarkedPaid);
    assert_eq!(fx.status(loan).await, LoanStatus::Paid);
}

#[tokio::test]
async fn test_reconcile_missing_loan() {
    let fx = Fixture::new();

    let outcome = reconcile(fx.store.as_ref(), 999).await.unwrap();
    assert_eq!(outcome, Reconciliation::LoanMissing);

    let via_service = fx.loans.reconcile(999).await;
    assert!(matches!(via_service, Err(ServiceError::NotFound("Loan"))));
}

#[tokio::test]
async fn test_concurrent_payments_settle_once() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(client, "1000", "10").await;

    let admin = admin();
    let (first, second) = tokio::join!(
        fx.payments.record_payment(&admin, payment(loan, "600")),
        fx.payments.record_payment(&admin, payment(loan, "600")),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(fx.payment_count(loan).await, 2);
    assert_eq!(fx.status(loan).await, LoanStatus::Paid);
}

// ============================================================================
// Payment rules
// ============================================================================

#[tokio::test]
async fn test_paying_inactive_loan_is_rejected() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;

    for status in [LoanStatus::Paid, LoanStatus::Defaulted, LoanStatus::Cancelled] {
        let loan = fx.loan(client, "1000", "10").await;
        fx.loans.set_loan_status(loan, status).await.unwrap();

        let result = fx
            .payments
            .record_payment(&admin(), payment(loan, "10"))
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
        assert_eq!(fx.payment_count(loan).await, 0);
    }
}

#[tokio::test]
async fn test_paying_missing_loan_is_not_found() {
    let fx = Fixture::new();

    let result = fx
        .payments
        .record_payment(&admin(), payment(42, "10"))
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound("Loan"))));
}

#[tokio::test]
async fn test_user_cannot_pay_someone_elses_loan() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    fx.client("Grace", "grace@example.com").await;
    let loan = fx.loan(ada, "1000", "10").await;

    let result = fx
        .payments
        .record_payment(&user("grace@example.com"), payment(loan, "10"))
        .await;
    assert!(matches!(result, Err(ServiceError::Forbidden)));
    assert_eq!(fx.payment_count(loan).await, 0);

    fx.payments
        .record_payment(&user("ada@example.com"), payment(loan, "10"))
        .await
        .unwrap();
    assert_eq!(fx.payment_count(loan).await, 1);
}

#[tokio::test]
async fn test_inactive_check_comes_before_ownership() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(ada, "1000", "10").await;
    fx.loans
        .set_loan_status(loan, LoanStatus::Cancelled)
        .await
        .unwrap();

    let result = fx
        .payments
        .record_payment(&user("mallory@example.com"), payment(loan, "10"))
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
}

// ============================================================================
// Visibility
// ============================================================================

#[tokio::test]
async fn test_user_without_client_sees_nothing() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(ada, "1000", "10").await;
    fx.payments
        .record_payment(&admin(), payment(loan, "100"))
        .await
        .unwrap();

    let scope = resolve_scope(fx.store.as_ref(), &user("nobody@example.com")).await;
    assert_eq!(scope, Scope::Nothing);

    assert!(fx.loans.list_loans(scope, None).await.unwrap().is_empty());
    assert!(fx.payments.list_payments(scope).await.unwrap().is_empty());
    assert!(fx.clients.list_clients(scope).await.unwrap().is_empty());
    assert!(fx
        .clients
        .search_clients(scope, "Ada", SearchField::Any)
        .await
        .unwrap()
        .is_empty());

    let summary = fx.loans.loan_summary(scope).await.unwrap();
    assert_eq!(summary.total_loans, 0);
    assert_eq!(summary.total_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_user_sees_only_own_rows() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let grace = fx.client("Grace", "grace@example.com").await;
    let ada_loan = fx.loan(ada, "1000", "10").await;
    let grace_loan = fx.loan(grace, "2000", "5").await;
    fx.payments
        .record_payment(&admin(), payment(ada_loan, "100"))
        .await
        .unwrap();
    let grace_payment = fx
        .payments
        .record_payment(&admin(), payment(grace_loan, "100"))
        .await
        .unwrap();

    let scope = resolve_scope(fx.store.as_ref(), &user("ada@example.com")).await;
    assert_eq!(scope, Scope::Client(ada));

    let loans = fx.loans.list_loans(scope, None).await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].loan.id, ada_loan);
    assert_eq!(loans[0].email, "ada@example.com");

    let payments = fx.payments.list_payments(scope).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].client_id, ada);
    assert_eq!(payments[0].loan_amount, dec("1000"));

    // Other people's rows look absent, not forbidden
    assert!(matches!(
        fx.loans.get_loan(scope, grace_loan).await,
        Err(ServiceError::NotFound("Loan"))
    ));
    assert!(matches!(
        fx.payments.get_payment(scope, grace_payment.id).await,
        Err(ServiceError::NotFound("Payment"))
    ));
    assert!(matches!(
        fx.clients.get_client(scope, grace).await,
        Err(ServiceError::ClientNotFound)
    ));
    assert!(fx
        .loans
        .list_loans_for_client(scope, grace)
        .await
        .unwrap()
        .is_empty());
    assert!(fx
        .payments
        .list_payments_for_loan(scope, grace_loan)
        .await
        .unwrap()
        .is_empty());

    let clients = fx.clients.list_clients(scope).await.unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].id, ada);
}

#[tokio::test]
async fn test_admin_sees_everything_newest_first() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let grace = fx.client("Grace", "grace@example.com").await;
    let first = fx.loan(ada, "1000", "10").await;
    let second = fx.loan(grace, "2000", "5").await;

    let loans = fx.loans.list_loans(Scope::All, None).await.unwrap();
    let ids: Vec<i64> = loans.iter().map(|l| l.loan.id).collect();
    assert_eq!(ids, vec![second, first]);

    fx.loans
        .set_loan_status(first, LoanStatus::Defaulted)
        .await
        .unwrap();
    let defaulted = fx
        .loans
        .list_loans(Scope::All, Some(LoanStatus::Defaulted))
        .await
        .unwrap();
    assert_eq!(defaulted.len(), 1);
    assert_eq!(defaulted[0].loan.id, first);

    let summary = fx.loans.loan_summary(Scope::All).await.unwrap();
    assert_eq!(summary.total_loans, 2);
    assert_eq!(summary.total_amount, dec("3000"));
    assert_eq!(summary.active_loans, 1);
    assert_eq!(summary.defaulted_loans, 1);
    assert_eq!(summary.avg_interest_rate, Some(dec("7.5")));
}

#[tokio::test]
async fn test_payments_ordered_by_payment_date() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(ada, "1000", "10").await;

    let mut late = payment(loan, "10");
    late.payment_date = date(2024, 6, 1);
    late.payment_type = PaymentType::Interest;
    let mut early = payment(loan, "20");
    early.payment_date = date(2024, 3, 1);
    early.payment_type = PaymentType::Principal;

    let late = fx.payments.record_payment(&admin(), late).await.unwrap();
    let early = fx.payments.record_payment(&admin(), early).await.unwrap();

    let rows = fx.payments.list_payments(Scope::All).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.payment.id).collect();
    assert_eq!(ids, vec![late.id, early.id]);

    let summary = fx.payments.payment_summary(Scope::All).await.unwrap();
    assert_eq!(summary.total_payments, 2);
    assert_eq!(summary.total_amount, dec("30"));
    assert_eq!(summary.principal_payments, 1);
    assert_eq!(summary.interest_payments, 1);
    assert_eq!(summary.combined_payments, 0);
}

// ============================================================================
// Admin operations
// ============================================================================

#[tokio::test]
async fn test_status_override_is_unconditional() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(ada, "1000", "10").await;

    for status in [LoanStatus::Paid, LoanStatus::Active, LoanStatus::Defaulted] {
        fx.loans.set_loan_status(loan, status).await.unwrap();
        assert_eq!(fx.status(loan).await, status);
    }

    let missing = fx.loans.set_loan_status(999, LoanStatus::Paid).await;
    assert!(matches!(missing, Err(ServiceError::NotFound("Loan"))));
}

#[tokio::test]
async fn test_new_loans_start_active_and_need_a_client() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(ada, "0", "0").await;
    assert_eq!(fx.status(loan).await, LoanStatus::Active);

    let orphan = fx
        .loans
        .create_loan(CreateLoanRequest {
            client_id: 999,
            amount: dec("100"),
            interest_rate: dec("1"),
            term_months: 1,
            start_date: date(2024, 1, 1),
        })
        .await;
    assert!(matches!(orphan, Err(ServiceError::ClientNotFound)));
}

#[tokio::test]
async fn test_client_email_conflicts_and_delete_rules() {
    let fx = Fixture::new();
    let ada = fx.client("Ada", "ada@example.com").await;
    let grace = fx.client("Grace", "grace@example.com").await;

    let duplicate = fx
        .clients
        .create_client(ClientRequest {
            first_name: "Other".to_string(),
            last_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        })
        .await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

    let steal_email = fx
        .clients
        .update_client(
            grace,
            ClientRequest {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            },
        )
        .await;
    assert!(matches!(steal_email, Err(ServiceError::Conflict(_))));

    fx.loan(ada, "100", "1").await;
    let with_loans = fx.clients.delete_client(ada).await;
    assert!(matches!(with_loans, Err(ServiceError::Conflict(_))));

    fx.clients.delete_client(grace).await.unwrap();
    let gone = fx.clients.delete_client(grace).await;
    assert!(matches!(gone, Err(ServiceError::ClientNotFound)));
}

#[tokio::test]
async fn test_client_search_by_field() {
    let fx = Fixture::new();
    fx.client("Ada", "ada@example.com").await;
    fx.client("Grace", "hopper@navy.mil").await;

    let by_name = fx
        .clients
        .search_clients(Scope::All, "gRaCe", SearchField::Name)
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].first_name, "Grace");

    let by_email = fx
        .clients
        .search_clients(Scope::All, "navy", SearchField::Email)
        .await
        .unwrap();
    assert_eq!(by_email.len(), 1);

    let name_field_ignores_email = fx
        .clients
        .search_clients(Scope::All, "navy", SearchField::Name)
        .await
        .unwrap();
    assert!(name_field_ignores_email.is_empty());

    let by_phone = fx
        .clients
        .search_clients(Scope::All, "555", SearchField::Phone)
        .await
        .unwrap();
    assert_eq!(by_phone.len(), 2);

    let blank = fx
        .clients
        .search_clients(Scope::All, "  ", SearchField::Any)
        .await
        .unwrap();
    assert_eq!(blank.len(), 2);
}

// ============================================================================
// Storage faults
// ============================================================================

/// Memory store whose payment totals can be made to fail
#[derive(Default)]
struct FailingTotals {
    inner: MemoryStore,
    fail_sums: AtomicBool,
}

#[async_trait]
impl Store for FailingTotals {
    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn user_exists(&self, username: &str, email: &str) -> StoreResult<bool> {
        self.inner.user_exists(username, email).await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }

    async fn update_user_password(&self, id: i64, password_hash: &str) -> StoreResult<u64> {
        self.inner.update_user_password(id, password_hash).await
    }

    async fn ensure_client_for_user(&self, first_name: &str, email: &str) -> StoreResult<u64> {
        self.inner.ensure_client_for_user(first_name, email).await
    }

    async fn find_client_by_id(&self, id: i64) -> StoreResult<Option<Client>> {
        self.inner.find_client_by_id(id).await
    }

    async fn find_client_by_email(&self, email: &str) -> StoreResult<Option<Client>> {
        self.inner.find_client_by_email(email).await
    }

    async fn list_clients(&self, filter: ClientFilter) -> StoreResult<Vec<Client>> {
        self.inner.list_clients(filter).await
    }

    async fn search_clients(
        &self,
        filter: ClientFilter,
        query: &str,
        field: SearchField,
    ) -> StoreResult<Vec<Client>> {
        self.inner.search_clients(filter, query, field).await
    }

    async fn insert_client(&self, client: &ClientRequest) -> StoreResult<Client> {
        self.inner.insert_client(client).await
    }

    async fn update_client(&self, id: i64, client: &ClientRequest) -> StoreResult<u64> {
        self.inner.update_client(id, client).await
    }

    async fn delete_client(&self, id: i64) -> StoreResult<u64> {
        self.inner.delete_client(id).await
    }

    async fn get_loan_with_owner(&self, loan_id: i64) -> StoreResult<Option<LoanOwnership>> {
        self.inner.get_loan_with_owner(loan_id).await
    }

    async fn find_loan(&self, filter: LoanFilter, id: i64) -> StoreResult<Option<LoanWithClient>> {
        self.inner.find_loan(filter, id).await
    }

    async fn list_loans(&self, filter: LoanFilter) -> StoreResult<Vec<LoanWithClient>> {
        self.inner.list_loans(filter).await
    }

    async fn insert_loan(&self, loan: &CreateLoanRequest) -> StoreResult<Loan> {
        self.inner.insert_loan(loan).await
    }

    async fn update_loan_status(&self, id: i64, status: LoanStatus) -> StoreResult<u64> {
        self.inner.update_loan_status(id, status).await
    }

    async fn transition_loan_status(
        &self,
        id: i64,
        from: LoanStatus,
        to: LoanStatus,
    ) -> StoreResult<u64> {
        self.inner.transition_loan_status(id, from, to).await
    }

    async fn loan_summary(&self, filter: LoanFilter) -> StoreResult<LoanSummary> {
        self.inner.loan_summary(filter).await
    }

    async fn sum_payments_for_loan(&self, loan_id: i64) -> StoreResult<Decimal> {
        if self.fail_sums.load(Ordering::SeqCst) {
            return Err(StoreError::Database("connection reset".to_string()));
        }
        self.inner.sum_payments_for_loan(loan_id).await
    }

    async fn insert_payment(&self, payment: &RecordPaymentRequest) -> StoreResult<Payment> {
        self.inner.insert_payment(payment).await
    }

    async fn find_payment(
        &self,
        filter: PaymentFilter,
        id: i64,
    ) -> StoreResult<Option<PaymentWithLoan>> {
        self.inner.find_payment(filter, id).await
    }

    async fn list_payments(&self, filter: PaymentFilter) -> StoreResult<Vec<PaymentWithLoan>> {
        self.inner.list_payments(filter).await
    }

    async fn payment_summary(&self, filter: PaymentFilter) -> StoreResult<PaymentSummary> {
        self.inner.payment_summary(filter).await
    }
}

#[tokio::test]
async fn test_failed_reconciliation_keeps_payment_and_can_be_retried() {
    let faulty = Arc::new(FailingTotals::default());
    let store: SharedStore = faulty.clone();
    let loans = LoanService::new(store.clone());
    let payments = PaymentService::new(store.clone());

    let client = store
        .insert_client(&ClientRequest {
            first_name: "Ada".to_string(),
            last_name: "Tester".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        })
        .await
        .unwrap();
    let loan = loans
        .create_loan(CreateLoanRequest {
            client_id: client.id,
            amount: dec("1000"),
            interest_rate: dec("10"),
            term_months: 12,
            start_date: date(2024, 1, 1),
        })
        .await
        .unwrap();

    faulty.fail_sums.store(true, Ordering::SeqCst);
    let recorded = payments
        .record_payment(&admin(), payment(loan.id, "1100"))
        .await
        .unwrap();

    let stored = payments.get_payment(Scope::All, recorded.id).await.unwrap();
    assert_eq!(stored.payment.amount, dec("1100"));
    let current = loans.get_loan(Scope::All, loan.id).await.unwrap();
    assert_eq!(current.loan.status, LoanStatus::Active);

    // Still failing: the retry surfaces the error instead of hiding it
    assert!(loans.reconcile(loan.id).await.is_err());

    faulty.fail_sums.store(false, Ordering::SeqCst);
    let outcome = loans.reconcile(loan.id).await.unwrap();
    assert_eq!(outcome, Reconciliation::MarkedPaid);
    let current = loans.get_loan(Scope::All, loan.id).await.unwrap();
    assert_eq!(current.loan.status, LoanStatus::Paid);
}

#[tokio::test]
async fn test_memory_store_enforces_money_column_limits() {
    let fx = Fixture::new();
    let client = fx.client("Ada", "ada@example.com").await;
    let loan = fx.loan(client, "1000", "10").await;

    for value in ["0.005", "12345678901234.56"] {
        let result = fx.store.insert_payment(&payment(loan, value)).await;
        assert!(matches!(result, Err(StoreError::Database(_))), "amount {value}");

        let result = fx
            .store
            .insert_loan(&CreateLoanRequest {
                client_id: client,
                amount: dec(value),
                interest_rate: dec("10"),
                term_months: 12,
                start_date: date(2024, 1, 1),
            })
            .await;
        assert!(matches!(result, Err(StoreError::Database(_))), "amount {value}");
    }
    assert_eq!(fx.payment_count(loan).await, 0);

    fx.store
        .insert_payment(&payment(loan, "0.01"))
        .await
        .unwrap();
    assert_eq!(fx.payment_count(loan).await, 1);
}
