//! User domain types.

use serde::{Deserialize, Serialize};

use orchard_core::{Email, UserId};

/// A registered user, as loaded from the database.
///
/// Holds the password hash for credential checks during login; never
/// serialize this type directly - convert to [`UserView`] first.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique).
    pub email: Email,
    /// Argon2 password hash in PHC string format.
    pub password_hash: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Whether the user may use administrative routes.
    pub is_admin: bool,
    /// Street address.
    pub street: Option<String>,
    /// Apartment / unit.
    pub apartment: Option<String>,
    /// Postal code.
    pub zip: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Country.
    pub country: Option<String>,
}

/// The client-visible projection of a [`User`]. The password hash is omitted.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub street: Option<String>,
    pub apartment: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            is_admin: user.is_admin,
            street: user.street,
            apartment: user.apartment,
            zip: user.zip,
            city: user.city,
            country: user.country,
        }
    }
}

/// The authenticated caller, as decoded from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The user ID embedded in the token.
    pub user_id: UserId,
    /// The admin flag embedded in the token.
    pub is_admin: bool,
}

impl CurrentUser {
    /// Whether this caller may act on the given user's resources.
    ///
    /// Admins may act on anyone; everyone else only on themselves.
    #[must_use]
    pub fn can_access_user(&self, target: UserId) -> bool {
        self.is_admin || self.user_id == target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_omits_password_hash() {
        let user = User {
            id: UserId::new(1),
            name: "Ada".to_string(),
            email: Email::parse("ada@example.com").expect("valid email"),
            password_hash: "$argon2id$v=19$secret".to_string(),
            phone: None,
            is_admin: false,
            street: None,
            apartment: None,
            zip: None,
            city: None,
            country: None,
        };

        let view = UserView::from(user);
        let json = serde_json::to_string(&view).expect("serialize");
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_can_access_user() {
        let customer = CurrentUser {
            user_id: UserId::new(5),
            is_admin: false,
        };
        assert!(customer.can_access_user(UserId::new(5)));
        assert!(!customer.can_access_user(UserId::new(6)));

        let admin = CurrentUser {
            user_id: UserId::new(1),
            is_admin: true,
        };
        assert!(admin.can_access_user(UserId::new(6)));
    }
}
