
pub mod auth;
pub mod category;
pub mod config;
pub mod dto;
mod error;
pub mod expense;
pub mod health;
pub mod product;
pub mod promotion;
pub mod readiness;
pub mod tracing;
pub mod user;

pub use error::HandlerError;
