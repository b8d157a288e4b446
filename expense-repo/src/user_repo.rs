use crate::ids::UserId;
use crate::limits::{check_length, TooLong, MAX_TEXT_LENGTH};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[async_trait]
pub trait UserRepo: Sync + Send {
    async fn get_user(&self, user_id: &UserId) -> Result<User, UserRepoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, UserRepoError>;
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError>;
    async fn update_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError>;
    /// Deleting a user also deletes all of their expenses
    async fn delete_user(&self, user_id: &UserId) -> Result<(), UserRepoError>;
}

#[derive(Clone, PartialEq, Debug)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(email: String, password_hash: String) -> NewUser {
        NewUser {
            email,
            password_hash,
        }
    }

    pub fn check_lengths(&self) -> Result<(), TooLong> {
        check_length("email", &self.email, MAX_TEXT_LENGTH)
    }
}

#[derive(Error, Debug)]
pub enum UserRepoError {
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("User with email {0} already exists")]
    EmailAlreadyExists(String),
    #[error(transparent)]
    TooLong(#[from] TooLong),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
