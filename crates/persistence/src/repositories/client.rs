//! Client contact lookups.
//!
//! Client CRUD lives outside this service; the billing core only reads the
//! contact fields needed for delivery.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ClientContactEntity;
use crate::metrics::QueryTimer;

/// Read-only repository over the clients table.
#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    /// Creates a new ClientRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the contact projection of a client.
    pub async fn find_contact(
        &self,
        id: Uuid,
    ) -> Result<Option<ClientContactEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_client_contact");
        let result = sqlx::query_as::<_, ClientContactEntity>(
            "SELECT id, name, email FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
