//! Caller identity and row visibility
//!
//! Admins see every client, loan and payment. A regular user sees only the
//! rows hanging off the client record that shares their email address; a user
//! without such a record sees nothing at all.

use crate::models::UserRole;
use crate::store::{ClientFilter, LoanFilter, PaymentFilter, Store};

/// Authenticated caller, threaded explicitly into every service call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: UserRole,
    pub email: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Subset of rows an identity may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Client(i64),
    Nothing,
}

impl Scope {
    /// Narrow to a single client, yielding `Nothing` if that client is outside
    /// the current scope.
    pub fn restrict_to_client(self, client_id: i64) -> Scope {
        match self {
            Scope::All => Scope::Client(client_id),
            Scope::Client(own) if own == client_id => Scope::Client(own),
            Scope::Client(_) | Scope::Nothing => Scope::Nothing,
        }
    }

    pub fn client_filter(&self) -> Option<ClientFilter> {
        match *self {
            Scope::All => Some(ClientFilter::default()),
            Scope::Client(id) => Some(ClientFilter { client_id: Some(id) }),
            Scope::Nothing => None,
        }
    }

    pub fn loan_filter(&self) -> Option<LoanFilter> {
        match *self {
            Scope::All => Some(LoanFilter::default()),
            Scope::Client(id) => Some(LoanFilter {
                client_id: Some(id),
                ..LoanFilter::default()
            }),
            Scope::Nothing => None,
        }
    }

    pub fn payment_filter(&self) -> Option<PaymentFilter> {
        match *self {
            Scope::All => Some(PaymentFilter::default()),
            Scope::Client(id) => Some(PaymentFilter {
                client_id: Some(id),
                ..PaymentFilter::default()
            }),
            Scope::Nothing => None,
        }
    }
}

/// Work out what `identity` may see.
///
/// Never fails: a lookup error is logged and treated like a missing client
/// record, so listings come back empty instead of erroring.
pub async fn resolve_scope(store: &dyn Store, identity: &Identity) -> Scope {
    if identity.is_admin() {
        return Scope::All;
    }

    match store.find_client_by_email(&identity.email).await {
        Ok(Some(client)) => Scope::Client(client.id),
        Ok(None) => Scope::Nothing,
        Err(e) => {
            tracing::warn!(
                user_id = identity.user_id,
                error = %e,
                "Client lookup failed while resolving scope"
            );
            Scope::Nothing
        }
    }
}
