//! User repository for database operations.

use sqlx::PgPool;

use orchard_core::{Email, UserId};

use super::{RepositoryError, map_constraint};
use crate::models::User;

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    password_hash: String,
    phone: Option<String>,
    is_admin: bool,
    street: Option<String>,
    apartment: Option<String>,
    zip: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            password_hash: row.password_hash,
            phone: row.phone,
            is_admin: row.is_admin,
            street: row.street,
            apartment: row.apartment,
            zip: row.zip,
            city: row.city,
            country: row.country,
        })
    }
}

const USER_COLUMNS: &str = r"
    id, name, email, password_hash, phone, is_admin,
    street, apartment, zip, city, country
";

/// Fields for creating a user. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub street: Option<String>,
    pub apartment: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Fields for updating a user.
///
/// `password_hash` is `None` when no new password was supplied, in which
/// case the stored hash is kept.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub email: Email,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub street: Option<String>,
    pub apartment: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken and
    /// `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO app_user
                (name, email, password_hash, phone, is_admin,
                 street, apartment, zip, city, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            ",
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.phone)
        .bind(new.is_admin)
        .bind(&new.street)
        .bind(&new.apartment)
        .bind(&new.zip)
        .bind(&new.city)
        .bind(&new.country)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            map_constraint(
                e,
                "an account with this email already exists",
                "unknown reference",
            )
        })?;

        row.try_into()
    }

    /// Update a user in place, returning the updated record.
    ///
    /// The stored password hash is kept unless the update carries a new one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID,
    /// `RepositoryError::Conflict` if the new email is already taken, and
    /// `RepositoryError::Database` if the update fails.
    pub async fn update(&self, id: UserId, update: &UserUpdate) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE app_user
            SET name = $2, email = $3,
                password_hash = COALESCE($4, password_hash),
                phone = $5, is_admin = $6, street = $7, apartment = $8,
                zip = $9, city = $10, country = $11
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            ",
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.password_hash)
        .bind(&update.phone)
        .bind(update.is_admin)
        .bind(&update.street)
        .bind(&update.apartment)
        .bind(&update.zip)
        .bind(&update.city)
        .bind(&update.country)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            map_constraint(
                e,
                "an account with this email already exists",
                "unknown reference",
            )
        })?;

        row.map(TryInto::try_into)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID and
    /// `RepositoryError::Conflict` if orders still reference them.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM app_user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                map_constraint(
                    e,
                    "an account with this email already exists",
                    "user has placed orders and cannot be deleted",
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
