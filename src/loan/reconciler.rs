//! Loan status reconciliation
//!
//! A loan is settled once its payments cover the principal plus one flat
//! interest charge (`amount * rate / 100`). The term plays no part in the
//! calculation. Reconciliation reads current data only, so it can be re-run
//! at any time; once a loan has left `active` it is a no-op.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::LoanStatus;
use crate::store::{LoanFilter, Store, StoreResult};

/// What a reconciliation pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reconciliation {
    /// The loan moved from active to paid
    MarkedPaid,
    /// Payments do not yet cover the amount due
    Outstanding { total_paid: Decimal, total_due: Decimal },
    /// The loan is not active, so its status is left alone
    NotActive { status: LoanStatus },
    /// Another writer changed the status between our read and our write
    Superseded,
    /// The loan no longer exists
    LoanMissing,
}

/// Principal plus flat interest
pub fn total_due(amount: Decimal, interest_rate: Decimal) -> Decimal {
    amount + amount * interest_rate / Decimal::ONE_HUNDRED
}

/// Recompute the status of `loan_id` from its payment history.
pub async fn reconcile(store: &dyn Store, loan_id: i64) -> StoreResult<Reconciliation> {
    let total_paid = store.sum_payments_for_loan(loan_id).await?;

    let Some(row) = store.find_loan(LoanFilter::default(), loan_id).await? else {
        return Ok(Reconciliation::LoanMissing);
    };
    let loan = row.loan;

    let due = total_due(loan.amount, loan.interest_rate);
    if total_paid < due {
        return Ok(Reconciliation::Outstanding {
            total_paid,
            total_due: due,
        });
    }
    if loan.status != LoanStatus::Active {
        return Ok(Reconciliation::NotActive {
            status: loan.status,
        });
    }

    let updated = store
        .transition_loan_status(loan_id, LoanStatus::Active, LoanStatus::Paid)
        .await?;
    if updated == 0 {
        return Ok(Reconciliation::Superseded);
    }

    tracing::info!(
        loan_id,
        total_paid = %total_paid,
        total_due = %due,
        "Loan marked paid"
    );
    Ok(Reconciliation::MarkedPaid)
}
