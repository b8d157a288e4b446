use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use expense_repo::category_repo::CategoryRepoError;
use expense_repo::expense_repo::ExpenseRepoError;
use expense_repo::product_repo::ProductRepoError;
use expense_repo::promotion_repo::PromotionRepoError;
use expense_repo::user_repo::UserRepoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    User(#[from] UserRepoError),
    #[error(transparent)]
    Expense(#[from] ExpenseRepoError),
    #[error(transparent)]
    Category(#[from] CategoryRepoError),
    #[error(transparent)]
    Product(#[from] ProductRepoError),
    #[error(transparent)]
    Promotion(#[from] PromotionRepoError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    BadRequest(String),
    #[error("Unable to hash password")]
    Password(#[from] argon2::Error),
    #[error("Unable to create token")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::User(e) => match e {
                UserRepoError::UserNotFound(_) => StatusCode::NOT_FOUND,
                UserRepoError::EmailAlreadyExists(_) => StatusCode::CONFLICT,
                UserRepoError::TooLong(_) => StatusCode::BAD_REQUEST,
                UserRepoError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            HandlerError::Expense(e) => match e {
                ExpenseRepoError::ExpenseNotFound(_) => StatusCode::NOT_FOUND,
                ExpenseRepoError::TooLong(_) => StatusCode::BAD_REQUEST,
                ExpenseRepoError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            HandlerError::Category(e) => match e {
                CategoryRepoError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
                CategoryRepoError::ParentNotFound(_)
                | CategoryRepoError::InvalidTree(_)
                | CategoryRepoError::TooLong(_) => StatusCode::BAD_REQUEST,
                CategoryRepoError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            HandlerError::Product(e) => match e {
                ProductRepoError::ProductNotFound(_)
                | ProductRepoError::CategoryNotFound(_)
                | ProductRepoError::NotInCategory { .. } => StatusCode::NOT_FOUND,
                ProductRepoError::CodeAlreadyExists(_)
                | ProductRepoError::AlreadyInCategory { .. } => StatusCode::CONFLICT,
                ProductRepoError::TooLong(_) => StatusCode::BAD_REQUEST,
                ProductRepoError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            HandlerError::Promotion(e) => match e {
                PromotionRepoError::PromotionNotFound(_)
                | PromotionRepoError::RuleNotFound(_)
                | PromotionRepoError::ProductNotFound(_)
                | PromotionRepoError::CategoryNotFound(_)
                | PromotionRepoError::ProductNotApplicable { .. }
                | PromotionRepoError::CategoryNotApplicable { .. } => StatusCode::NOT_FOUND,
                PromotionRepoError::ProductAlreadyApplicable { .. }
                | PromotionRepoError::CategoryAlreadyApplicable { .. } => StatusCode::CONFLICT,
                PromotionRepoError::InvalidSchedule { .. } | PromotionRepoError::TooLong(_) => {
                    StatusCode::BAD_REQUEST
                }
                PromotionRepoError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            HandlerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::Password(_) | HandlerError::Token(_) | HandlerError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(serde_json::json!({ "error": message }))
    }
}
