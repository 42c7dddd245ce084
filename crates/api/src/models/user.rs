//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{Email, UserId};

/// A registered user.
///
/// The password hash never leaves the `db` and `services::auth` layers;
/// this type is safe to hand to route handlers.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique).
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// Whether the user can access admin routes.
    pub is_admin: bool,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name used when attributing reviews.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let user = User {
            id: UserId::new(1),
            email: Email::parse("jane@example.com").expect("valid email"),
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            is_admin: false,
            created_at: Utc::now(),
        };
        assert_eq!(user.full_name(), "Jane Doe");
    }
}
