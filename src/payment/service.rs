//! Payment service layer - recording payments and scoped payment reads

use crate::error::{ServiceError, ServiceResult};
use crate::loan::{reconcile, LoanStatus, Reconciliation};
use crate::payment::{Payment, PaymentSummary, PaymentWithLoan, RecordPaymentRequest};
use crate::scope::{Identity, Scope};
use crate::store::{SharedStore, StoreError};

#[derive(Clone)]
pub struct PaymentService {
    store: SharedStore,
}

impl PaymentService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Record a payment on behalf of `identity`.
    ///
    /// Checks run in order: the loan must exist, must be active, and must
    /// belong to the caller unless the caller is an admin. Once the payment
    /// is stored the loan is reconciled; a reconciliation failure is logged
    /// and does not undo or fail the payment.
    pub async fn record_payment(
        &self,
        identity: &Identity,
        request: RecordPaymentRequest,
    ) -> ServiceResult<Payment> {
        let loan = self
            .store
            .get_loan_with_owner(request.loan_id)
            .await?
            .ok_or(ServiceError::NotFound("Loan"))?;

        if loan.status != LoanStatus::Active {
            return Err(ServiceError::InvalidState(
                "cannot pay inactive loan".to_string(),
            ));
        }

        if !identity.is_admin() && loan.owner_email != identity.email {
            tracing::warn!(
                user_id = identity.user_id,
                loan_id = loan.id,
                "Payment attempt on another client's loan"
            );
            return Err(ServiceError::Forbidden);
        }

        let payment = self
            .store
            .insert_payment(&request)
            .await
            .map_err(|e| match e {
                // Deleted between the lookup and the insert
                StoreError::ForeignKeyViolation(_) => ServiceError::NotFound("Loan"),
                other => ServiceError::Store(other),
            })?;

        tracing::info!(
            payment_id = payment.id,
            loan_id = payment.loan_id,
            amount = %payment.amount,
            payment_type = ?payment.payment_type,
            user_id = identity.user_id,
            "Payment recorded"
        );

        match reconcile(self.store.as_ref(), payment.loan_id).await {
            Ok(Reconciliation::LoanMissing) => {
                tracing::warn!(loan_id = payment.loan_id, "Loan vanished before reconciliation");
            }
            Ok(outcome) => {
                tracing::debug!(loan_id = payment.loan_id, ?outcome, "Loan reconciled");
            }
            Err(e) => {
                tracing::warn!(
                    loan_id = payment.loan_id,
                    error = %e,
                    "Loan reconciliation failed"
                );
            }
        }

        Ok(payment)
    }

    /// Payments visible in `scope`, latest payment date first
    pub async fn list_payments(&self, scope: Scope) -> ServiceResult<Vec<PaymentWithLoan>> {
        match scope.payment_filter() {
            Some(filter) => Ok(self.store.list_payments(filter).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Get payment by ID. Payments outside `scope` are reported as not found.
    pub async fn get_payment(&self, scope: Scope, id: i64) -> ServiceResult<PaymentWithLoan> {
        let filter = scope
            .payment_filter()
            .ok_or(ServiceError::NotFound("Payment"))?;

        self.store
            .find_payment(filter, id)
            .await?
            .ok_or(ServiceError::NotFound("Payment"))
    }

    /// Payments of one loan. Absent or out-of-scope loans yield an empty list.
    pub async fn list_payments_for_loan(
        &self,
        scope: Scope,
        loan_id: i64,
    ) -> ServiceResult<Vec<PaymentWithLoan>> {
        let Some(mut filter) = scope.payment_filter() else {
            return Ok(Vec::new());
        };
        filter.loan_id = Some(loan_id);

        Ok(self.store.list_payments(filter).await?)
    }

    pub async fn payment_summary(&self, scope: Scope) -> ServiceResult<PaymentSummary> {
        match scope.payment_filter() {
            Some(filter) => Ok(self.store.payment_summary(filter).await?),
            None => Ok(PaymentSummary::default()),
        }
    }
}
