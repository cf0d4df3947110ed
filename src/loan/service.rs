//! Loan service layer - Business logic for loan management

use crate::error::{ServiceError, ServiceResult};
use crate::loan::reconciler::{self, Reconciliation};
use crate::loan::{CreateLoanRequest, Loan, LoanStatus, LoanSummary, LoanWithClient};
use crate::scope::Scope;
use crate::store::{SharedStore, StoreError};

/// Loan service for managing loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    store: SharedStore,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Loans visible in `scope`, newest first
    pub async fn list_loans(
        &self,
        scope: Scope,
        status: Option<LoanStatus>,
    ) -> ServiceResult<Vec<LoanWithClient>> {
        let Some(mut filter) = scope.loan_filter() else {
            return Ok(Vec::new());
        };
        filter.status = status;

        Ok(self.store.list_loans(filter).await?)
    }

    /// Loans of one client. Clients outside `scope` yield an empty list.
    pub async fn list_loans_for_client(
        &self,
        scope: Scope,
        client_id: i64,
    ) -> ServiceResult<Vec<LoanWithClient>> {
        self.list_loans(scope.restrict_to_client(client_id), None)
            .await
    }

    /// Get loan by ID. Loans outside `scope` are reported as not found.
    pub async fn get_loan(&self, scope: Scope, id: i64) -> ServiceResult<LoanWithClient> {
        let filter = scope.loan_filter().ok_or(ServiceError::NotFound("Loan"))?;

        self.store
            .find_loan(filter, id)
            .await?
            .ok_or(ServiceError::NotFound("Loan"))
    }

    /// Issue a new loan. The loan always starts out active.
    pub async fn create_loan(&self, request: CreateLoanRequest) -> ServiceResult<Loan> {
        if self.store.find_client_by_id(request.client_id).await?.is_none() {
            return Err(ServiceError::ClientNotFound);
        }

        let loan = self.store.insert_loan(&request).await.map_err(|e| match e {
            StoreError::ForeignKeyViolation(_) => ServiceError::ClientNotFound,
            other => ServiceError::Store(other),
        })?;

        tracing::info!(
            loan_id = loan.id,
            client_id = loan.client_id,
            amount = %loan.amount,
            "Loan created"
        );
        Ok(loan)
    }

    /// Administrative status override.
    ///
    /// Any status may be set from any status, including reopening a paid loan.
    pub async fn set_loan_status(&self, id: i64, status: LoanStatus) -> ServiceResult<()> {
        let updated = self.store.update_loan_status(id, status).await?;
        if updated == 0 {
            return Err(ServiceError::NotFound("Loan"));
        }

        tracing::info!(loan_id = id, status = %status, "Loan status overridden");
        Ok(())
    }

    /// Aggregate figures over the loans visible in `scope`
    pub async fn loan_summary(&self, scope: Scope) -> ServiceResult<LoanSummary> {
        match scope.loan_filter() {
            Some(filter) => Ok(self.store.loan_summary(filter).await?),
            None => Ok(LoanSummary::default()),
        }
    }

    /// Re-run status reconciliation for a loan, reporting what it did
    pub async fn reconcile(&self, id: i64) -> ServiceResult<Reconciliation> {
        match reconciler::reconcile(self.store.as_ref(), id).await? {
            Reconciliation::LoanMissing => Err(ServiceError::NotFound("Loan")),
            outcome => Ok(outcome),
        }
    }
}
