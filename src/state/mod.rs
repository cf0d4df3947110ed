//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::client::ClientService;
use crate::loan::LoanService;
use crate::middleware::AuthenticatedUser;
use crate::payment::PaymentService;
use crate::scope::{resolve_scope, Scope};
use crate::store::SharedStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth_service: Arc<AuthService>,
    pub client_service: Arc<ClientService>,
    pub loan_service: Arc<LoanService>,
    pub payment_service: Arc<PaymentService>,
}

impl AppState {
    /// Wire the domain services to `store`
    pub fn new(store: SharedStore, auth_service: AuthService) -> Self {
        Self {
            client_service: Arc::new(ClientService::new(store.clone())),
            loan_service: Arc::new(LoanService::new(store.clone())),
            payment_service: Arc::new(PaymentService::new(store.clone())),
            auth_service: Arc::new(auth_service),
            store,
        }
    }

    /// Rows the caller may see
    pub async fn scope_for(&self, user: &AuthenticatedUser) -> Scope {
        resolve_scope(self.store.as_ref(), &user.identity()).await
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
