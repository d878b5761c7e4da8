//! Client contact read model.
//!
//! Client management lives outside this service; the billing core only ever
//! reads the contact fields it needs for delivery and rendering.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact projection of a client row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientContact {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

impl ClientContact {
    /// True when the client can receive invoice emails.
    ///
    /// A missing or blank address is expected for some clients and means
    /// "skip delivery", not "delivery failed".
    pub fn has_usable_email(&self) -> bool {
        self.email
            .as_deref()
            .map(|e| !e.trim().is_empty() && e.contains('@'))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(email: Option<&str>) -> ClientContact {
        ClientContact {
            id: Uuid::new_v4(),
            name: "Acme Studio".to_string(),
            email: email.map(String::from),
        }
    }

    #[test]
    fn test_usable_email() {
        assert!(contact(Some("billing@acme.example")).has_usable_email());
    }

    #[test]
    fn test_missing_email_is_not_usable() {
        assert!(!contact(None).has_usable_email());
        assert!(!contact(Some("")).has_usable_email());
        assert!(!contact(Some("   ")).has_usable_email());
    }

    #[test]
    fn test_malformed_email_is_not_usable() {
        assert!(!contact(Some("not-an-address")).has_usable_email());
    }
}
