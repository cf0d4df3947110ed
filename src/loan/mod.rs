//! Loan domain module
//!
//! Contains request models, the loan service, and status reconciliation.

mod model;
pub mod reconciler;
mod service;

pub use model::*;
pub use reconciler::{reconcile, total_due, Reconciliation};
pub use service::LoanService;
