//! PostgreSQL implementation of the persistence gateway

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ClientFilter, LoanFilter, PaymentFilter, Store, StoreResult};
use crate::client::{ClientRequest, SearchField};
use crate::loan::CreateLoanRequest;
use crate::models::{
    Client, Loan, LoanOwnership, LoanStatus, LoanSummary, LoanWithClient, NewUser, Payment,
    PaymentSummary, PaymentWithLoan, User,
};
use crate::payment::RecordPaymentRequest;

const LOAN_WITH_CLIENT: &str = r#"
    SELECT l.*, c.first_name, c.last_name, c.email
    FROM loans l
    JOIN clients c ON l.client_id = c.id
    WHERE 1=1"#;

const PAYMENT_WITH_LOAN: &str = r#"
    SELECT p.*, l.amount AS loan_amount, l.client_id, c.first_name, c.last_name
    FROM payments p
    JOIN loans l ON p.loan_id = l.id
    JOIN clients c ON l.client_id = c.id
    WHERE 1=1"#;

#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

fn push_client_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: ClientFilter) {
    if let Some(client_id) = filter.client_id {
        builder.push(" AND id = ");
        builder.push_bind(client_id);
    }
}

fn push_loan_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: LoanFilter, alias: &str) {
    if let Some(client_id) = filter.client_id {
        builder.push(format!(" AND {alias}client_id = "));
        builder.push_bind(client_id);
    }
    if let Some(status) = filter.status {
        builder.push(format!(" AND {alias}status = "));
        builder.push_bind(status);
    }
}

fn push_payment_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: PaymentFilter) {
    if let Some(client_id) = filter.client_id {
        builder.push(" AND l.client_id = ");
        builder.push_bind(client_id);
    }
    if let Some(loan_id) = filter.loan_id {
        builder.push(" AND p.loan_id = ");
        builder.push_bind(loan_id);
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(user)
    }

    async fn user_exists(&self, username: &str, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(exists)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, email, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.email)
        .bind(user.role)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(user)
    }

    async fn update_user_password(&self, id: i64, password_hash: &str) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ensure_client_for_user(&self, first_name: &str, email: &str) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO clients (first_name, last_name, email)
            VALUES ($1, '', $2)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(first_name)
        .bind(email)
        .execute(&self.db_pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_client_by_id(&self, id: i64) -> StoreResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(client)
    }

    async fn find_client_by_email(&self, email: &str) -> StoreResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(client)
    }

    async fn list_clients(&self, filter: ClientFilter) -> StoreResult<Vec<Client>> {
        let mut builder = QueryBuilder::new("SELECT * FROM clients WHERE 1=1");
        push_client_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        let clients = builder
            .build_query_as::<Client>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(clients)
    }

    async fn search_clients(
        &self,
        filter: ClientFilter,
        query: &str,
        field: SearchField,
    ) -> StoreResult<Vec<Client>> {
        let pattern = format!("%{}%", query.trim());
        let columns: &[&str] = match field {
            SearchField::Name => &["first_name", "last_name"],
            SearchField::Email => &["email"],
            SearchField::Phone => &["phone"],
            SearchField::Any => &["first_name", "last_name", "email", "phone"],
        };

        let mut builder = QueryBuilder::new("SELECT * FROM clients WHERE 1=1");
        push_client_filter(&mut builder, filter);
        builder.push(" AND (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(format!("{column} ILIKE "));
            builder.push_bind(pattern.clone());
        }
        builder.push(") ORDER BY created_at DESC, id DESC");

        let clients = builder
            .build_query_as::<Client>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(clients)
    }

    async fn insert_client(&self, client: &ClientRequest) -> StoreResult<Client> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(client)
    }

    async fn update_client(&self, id: i64, client: &ClientRequest) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET first_name = $1, last_name = $2, email = $3, phone = $4
            WHERE id = $5
            "#,
        )
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(id)
        .execute(&self.db_pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_client(&self, id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_loan_with_owner(&self, loan_id: i64) -> StoreResult<Option<LoanOwnership>> {
        let loan = sqlx::query_as::<_, LoanOwnership>(
            r#"
            SELECT l.id, l.client_id, l.status, c.email AS owner_email
            FROM loans l
            JOIN clients c ON l.client_id = c.id
            WHERE l.id = $1
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(loan)
    }

    async fn find_loan(&self, filter: LoanFilter, id: i64) -> StoreResult<Option<LoanWithClient>> {
        let mut builder = QueryBuilder::new(LOAN_WITH_CLIENT);
        builder.push(" AND l.id = ");
        builder.push_bind(id);
        push_loan_filter(&mut builder, filter, "l.");

        let loan = builder
            .build_query_as::<LoanWithClient>()
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(loan)
    }

    async fn list_loans(&self, filter: LoanFilter) -> StoreResult<Vec<LoanWithClient>> {
        let mut builder = QueryBuilder::new(LOAN_WITH_CLIENT);
        push_loan_filter(&mut builder, filter, "l.");
        builder.push(" ORDER BY l.created_at DESC, l.id DESC");

        let loans = builder
            .build_query_as::<LoanWithClient>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(loans)
    }

    async fn insert_loan(&self, loan: &CreateLoanRequest) -> StoreResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (client_id, amount, interest_rate, term_months, start_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(loan.client_id)
        .bind(loan.amount)
        .bind(loan.interest_rate)
        .bind(loan.term_months)
        .bind(loan.start_date)
        .bind(LoanStatus::Active)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(loan)
    }

    async fn update_loan_status(&self, id: i64, status: LoanStatus) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE loans SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn transition_loan_status(
        &self,
        id: i64,
        from: LoanStatus,
        to: LoanStatus,
    ) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE loans SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to)
            .bind(id)
            .bind(from)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn loan_summary(&self, filter: LoanFilter) -> StoreResult<LoanSummary> {
        let mut builder = QueryBuilder::new(
            r#"
            SELECT
                COUNT(*) AS total_loans,
                COALESCE(SUM(amount), 0) AS total_amount,
                AVG(interest_rate) AS avg_interest_rate,
                COUNT(*) FILTER (WHERE status = 'active') AS active_loans,
                COUNT(*) FILTER (WHERE status = 'paid') AS paid_loans,
                COUNT(*) FILTER (WHERE status = 'defaulted') AS defaulted_loans,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled_loans
            FROM loans
            WHERE 1=1"#,
        );
        push_loan_filter(&mut builder, filter, "");

        let summary = builder
            .build_query_as::<LoanSummary>()
            .fetch_one(&self.db_pool)
            .await?;
        Ok(summary)
    }

    async fn sum_payments_for_loan(&self, loan_id: i64) -> StoreResult<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE loan_id = $1",
        )
        .bind(loan_id)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(total)
    }

    async fn insert_payment(&self, payment: &RecordPaymentRequest) -> StoreResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (loan_id, amount, payment_date, payment_type, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(payment.loan_id)
        .bind(payment.amount)
        .bind(payment.payment_date)
        .bind(payment.payment_type)
        .bind(&payment.notes)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(payment)
    }

    async fn find_payment(
        &self,
        filter: PaymentFilter,
        id: i64,
    ) -> StoreResult<Option<PaymentWithLoan>> {
        let mut builder = QueryBuilder::new(PAYMENT_WITH_LOAN);
        builder.push(" AND p.id = ");
        builder.push_bind(id);
        push_payment_filter(&mut builder, filter);

        let payment = builder
            .build_query_as::<PaymentWithLoan>()
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(payment)
    }

    async fn list_payments(&self, filter: PaymentFilter) -> StoreResult<Vec<PaymentWithLoan>> {
        let mut builder = QueryBuilder::new(PAYMENT_WITH_LOAN);
        push_payment_filter(&mut builder, filter);
        builder.push(" ORDER BY p.payment_date DESC, p.id DESC");

        let payments = builder
            .build_query_as::<PaymentWithLoan>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(payments)
    }

    async fn payment_summary(&self, filter: PaymentFilter) -> StoreResult<PaymentSummary> {
        let mut builder = QueryBuilder::new(
            r#"
            SELECT
                COUNT(*) AS total_payments,
                COALESCE(SUM(p.amount), 0) AS total_amount,
                COUNT(*) FILTER (WHERE p.payment_type = 'principal') AS principal_payments,
                COUNT(*) FILTER (WHERE p.payment_type = 'interest') AS interest_payments,
                COUNT(*) FILTER (WHERE p.payment_type = 'both') AS combined_payments
            FROM payments p
            JOIN loans l ON p.loan_id = l.id
            WHERE 1=1"#,
        );
        push_payment_filter(&mut builder, filter);

        let summary = builder
            .build_query_as::<PaymentSummary>()
            .fetch_one(&self.db_pool)
            .await?;
        Ok(summary)
    }
}
