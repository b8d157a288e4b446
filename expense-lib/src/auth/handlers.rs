use crate::auth::jwt::JWTAuth;
use crate::auth::password;
use crate::dto::UserDto;
use crate::error::HandlerError;
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use anyhow::anyhow;
use expense_repo::user_repo::{NewUser, UserRepo, UserRepoError};
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

#[post("/signup")]
pub async fn signup(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    credentials: web::Json<UserCredentials>,
) -> Result<impl Responder, HandlerError> {
    let credentials = credentials.into_inner();
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(HandlerError::BadRequest(
            "Email and password must not be empty".to_owned(),
        ));
    }
    let password_hash = password::encode_password(&credentials.password)?;

    let user = user_repo
        .create_user(NewUser::new(credentials.email, password_hash))
        .await?;

    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

#[post("/get_token")]
pub async fn get_token(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    credentials: web::Json<UserCredentials>,
    req: HttpRequest,
) -> Result<impl Responder, HandlerError> {
    let credentials = credentials.into_inner();

    let user = match user_repo.get_user_by_email(&credentials.email).await {
        Ok(user) => user,
        Err(UserRepoError::UserNotFound(_)) => return Err(HandlerError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    let matched = password::verify_password(&credentials.password, &user.password_hash)?;
    if !matched {
        return Err(HandlerError::InvalidCredentials);
    }

    let jwt_auth = req
        .app_data::<JWTAuth>()
        .ok_or_else(|| anyhow!("JWTAuth is not registered"))?;
    Ok(HttpResponse::Ok().body(jwt_auth.create_token(user.id)?))
}
