use crate::ids::UserId;
use crate::mem_repo::MemRepo;
use crate::user_repo::UserRepoError::{EmailAlreadyExists, UserNotFound};
use crate::user_repo::{NewUser, User, UserRepo, UserRepoError};
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl UserRepo for MemRepo {
    async fn get_user(&self, user_id: &UserId) -> Result<User, UserRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| UserNotFound(user_id.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, UserRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| UserNotFound(email.to_owned()))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError> {
        new_user.check_lengths()?;
        let mut write_guard = self.write_lock()?;

        if write_guard.users.values().any(|u| u.email == new_user.email) {
            return Err(EmailAlreadyExists(new_user.email));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        write_guard.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError> {
        let mut write_guard = self.write_lock()?;

        let Some(user) = write_guard.users.get_mut(user_id) else {
            return Err(UserNotFound(user_id.to_string()));
        };
        user.password_hash = password_hash.to_owned();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<(), UserRepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.users.remove(user_id).is_none() {
            return Err(UserNotFound(user_id.to_string()));
        }
        write_guard.expenses.retain(|_, e| e.user_id != *user_id);
        Ok(())
    }
}
