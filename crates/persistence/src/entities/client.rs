//! Client contact entity (database row mapping).

use sqlx::FromRow;
use uuid::Uuid;

use domain::models::client::ClientContact;

/// Contact projection of a clients row.
#[derive(Debug, Clone, FromRow)]
pub struct ClientContactEntity {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

impl From<ClientContactEntity> for ClientContact {
    fn from(entity: ClientContactEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
        }
    }
}
