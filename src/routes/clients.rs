//! Client route definitions

use axum::{routing::get, Router};

use crate::handlers::clients::*;
use crate::state::AppState;

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route("/api/clients/search", get(search_clients))
        .route(
            "/api/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}
