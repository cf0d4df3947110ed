use crate::client::{Client, ClientRequest, SearchField};
use crate::error::{ServiceError, ServiceResult};
use crate::scope::Scope;
use crate::store::{SharedStore, StoreError};

/// Borrower records. Reads are scoped, writes are admin-only at the HTTP layer.
#[derive(Clone)]
pub struct ClientService {
    store: SharedStore,
}

fn email_conflict(err: StoreError) -> ServiceError {
    match err {
        StoreError::UniqueViolation(_) => {
            ServiceError::Conflict("client with this email already exists".to_string())
        }
        other => ServiceError::Store(other),
    }
}

impl ClientService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list_clients(&self, scope: Scope) -> ServiceResult<Vec<Client>> {
        match scope.client_filter() {
            Some(filter) => Ok(self.store.list_clients(filter).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Substring search restricted to the clients visible in `scope`.
    /// A blank query falls back to the plain listing.
    pub async fn search_clients(
        &self,
        scope: Scope,
        query: &str,
        field: SearchField,
    ) -> ServiceResult<Vec<Client>> {
        let Some(filter) = scope.client_filter() else {
            return Ok(Vec::new());
        };

        let query = query.trim();
        if query.is_empty() {
            return Ok(self.store.list_clients(filter).await?);
        }
        Ok(self.store.search_clients(filter, query, field).await?)
    }

    /// Get client by ID. Clients outside `scope` are reported as not found.
    pub async fn get_client(&self, scope: Scope, id: i64) -> ServiceResult<Client> {
        let Some(filter) = scope.restrict_to_client(id).client_filter() else {
            return Err(ServiceError::ClientNotFound);
        };

        let client = self
            .store
            .find_client_by_id(id)
            .await?
            .filter(|c| filter.client_id.map_or(true, |own| own == c.id));
        client.ok_or(ServiceError::ClientNotFound)
    }

    pub async fn create_client(&self, request: ClientRequest) -> ServiceResult<Client> {
        let client = self
            .store
            .insert_client(&request)
            .await
            .map_err(email_conflict)?;

        tracing::info!(client_id = client.id, "Client created");
        Ok(client)
    }

    pub async fn update_client(&self, id: i64, request: ClientRequest) -> ServiceResult<()> {
        let updated = self
            .store
            .update_client(id, &request)
            .await
            .map_err(email_conflict)?;
        if updated == 0 {
            return Err(ServiceError::ClientNotFound);
        }

        tracing::info!(client_id = id, "Client updated");
        Ok(())
    }

    /// Delete a client. Clients that still have loans are kept.
    pub async fn delete_client(&self, id: i64) -> ServiceResult<()> {
        let deleted = self.store.delete_client(id).await.map_err(|e| match e {
            StoreError::ForeignKeyViolation(_) => {
                ServiceError::Conflict("client has loans and cannot be deleted".to_string())
            }
            other => ServiceError::Store(other),
        })?;
        if deleted == 0 {
            return Err(ServiceError::ClientNotFound);
        }

        tracing::info!(client_id = id, "Client deleted");
        Ok(())
    }
}
