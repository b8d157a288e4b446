use actix_web::dev::ServiceRequest;
use actix_web::error::ErrorInternalServerError;
use actix_web::{web, Error, HttpMessage, Scope};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use actix_web_httpauth::extractors::{bearer, AuthenticationError};
use actix_web_httpauth::headers::www_authenticate::bearer::Bearer;
use expense_repo::ids::UserId;
use jwt::JWTAuth;
use tracing::{debug, error};
use tracing_actix_web::RootSpan;

pub mod handlers;
pub mod jwt;
pub mod password;

pub fn auth_service(signups_enabled: bool) -> Scope {
    let scope = web::scope("/auth").service(handlers::get_token);
    if signups_enabled {
        scope.service(handlers::signup)
    } else {
        scope
    }
}

/// Validates credentials using [JWTAuth]. If valid, injects the user id into request and into the
/// [RootSpan]
pub async fn credentials_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let validation = match req.app_data::<JWTAuth>() {
        Some(jwt_auth) => jwt_auth.validate_token(credentials.token()),
        None => {
            error!("JWTAuth is not registered");
            return Err((ErrorInternalServerError("Authentication unavailable"), req));
        }
    };

    match validation {
        Ok(user) => {
            if let Some(root_span) = req.extensions().get::<RootSpan>() {
                root_span.record("user_id", &tracing::field::display(user));
            }
            req.extensions_mut().insert::<UserId>(user);
            Ok(req)
        }
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            let challenge = Bearer::build().error(bearer::Error::InvalidToken).finish();
            Err((AuthenticationError::new(challenge).into(), req))
        }
    }
}
