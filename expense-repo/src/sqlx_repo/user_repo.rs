use crate::ids::UserId;
use crate::sqlx_repo::{is_unique_violation, SQLxRepo};
use crate::user_repo::{NewUser, User, UserRepo, UserRepoError};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct UserEntry {
    id: Uuid,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserEntry> for User {
    fn from(value: UserEntry) -> Self {
        User {
            id: value.id.into(),
            email: value.email,
            password_hash: value.password,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[async_trait]
impl UserRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &UserId) -> Result<User, UserRepoError> {
        let user: Option<UserEntry> = query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get user {}", user_id))?;
        user.map(|u| u.into())
            .ok_or_else(|| UserRepoError::UserNotFound(user_id.to_string()))
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<User, UserRepoError> {
        let user: Option<UserEntry> = query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get user {}", email))?;
        user.map(|u| u.into())
            .ok_or_else(|| UserRepoError::UserNotFound(email.to_owned()))
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError> {
        new_user.check_lengths()?;
        let result: Result<UserEntry, sqlx::Error> = query_as(
            "INSERT INTO users(id, email, password) VALUES($1, $2, $3) RETURNING *",
        )
        .bind(UserId::generate().as_uuid())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await;
        match result {
            Ok(entry) => Ok(entry.into()),
            Err(e) if is_unique_violation(&e) => {
                Err(UserRepoError::EmailAlreadyExists(new_user.email))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Unable to create user {}", new_user.email))
                .into()),
        }
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError> {
        let result = query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to update password for {}", user_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(UserRepoError::UserNotFound(user_id.to_string()))
        }
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &UserId) -> Result<(), UserRepoError> {
        let result = query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete user {}", user_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(UserRepoError::UserNotFound(user_id.to_string()))
        }
    }
}
