use crate::auth::password;
use crate::error::HandlerError;
use actix_web::{delete, put, web, HttpResponse, Responder};
use expense_repo::ids::UserId;
use expense_repo::user_repo::UserRepo;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Serialize, Deserialize)]
pub struct PasswordUpdate {
    pub password: String,
}

#[put("/password")]
pub async fn update_password(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    user_id: web::ReqData<UserId>,
    update: web::Json<PasswordUpdate>,
) -> Result<impl Responder, HandlerError> {
    let update = update.into_inner();
    if update.password.is_empty() {
        return Err(HandlerError::BadRequest(
            "Password must not be empty".to_owned(),
        ));
    }
    let password_hash = password::encode_password(&update.password)?;
    user_repo
        .update_password_hash(&user_id.into_inner(), &password_hash)
        .await?;

    Ok(HttpResponse::Ok().finish())
}

#[delete("")]
pub async fn delete_user(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    user_id: web::ReqData<UserId>,
) -> Result<impl Responder, HandlerError> {
    let user_id = user_id.into_inner();
    user_repo.delete_user(&user_id).await?;
    info!(%user_id, "Deleted user");

    Ok(HttpResponse::Ok().finish())
}
