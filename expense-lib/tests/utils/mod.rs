#![allow(dead_code)]

use expense_repo::ids::UserId;
use expense_repo::user_repo::{NewUser, UserRepo};
use expense_repo::Repos;
use rstest::*;
use std::sync::Arc;
use tracing::info;
use tracing::Level;
use uuid::Uuid;

pub mod mock;

/// Registers every repository and service of `Repos`, authenticated as `$user_id`
macro_rules! build_app {
    ($repos:ident, $user_id:expr) => {{
        let app = App::new()
            .app_data(Data::new($repos.user_repo.clone()))
            .app_data(Data::new($repos.expense_repo.clone()))
            .app_data(Data::new($repos.category_repo.clone()))
            .app_data(Data::new($repos.product_repo.clone()))
            .app_data(Data::new($repos.promotion_repo.clone()))
            .app_data(Data::new($repos.health_check.clone()))
            .app_data(Data::new(expense_lib::health::StartTime::now()))
            .wrap(expense_lib::tracing::create_middleware())
            .service(expense_lib::health::health_service())
            .service(
                expense_lib::expense::expense_service()
                    .wrap(MockAuthentication { user_id: $user_id }),
            )
            .service(
                expense_lib::category::category_service()
                    .wrap(MockAuthentication { user_id: $user_id }),
            )
            .service(
                expense_lib::product::product_service()
                    .wrap(MockAuthentication { user_id: $user_id }),
            )
            .service(
                expense_lib::promotion::promotion_service()
                    .wrap(MockAuthentication { user_id: $user_id }),
            )
            .service(
                expense_lib::user::user_service().wrap(MockAuthentication { user_id: $user_id }),
            );
        tracing::info!("Built app");
        app
    }};
}

/// Sends `$body` as JSON and returns the deserialized response, asserting success
macro_rules! send_json {
    (&$service:ident, $request:expr, $body:expr) => {{
        let request = $request.set_json(&$body).to_request();
        let response = test::call_service(&$service, request).await;
        assert!(
            response.status().is_success(),
            "Got {} response",
            response.status()
        );
        test::read_body_json(response).await
    }};
}

/// Sends a bodyless request and returns the deserialized response, asserting success
macro_rules! call_json {
    (&$service:ident, $request:expr) => {{
        let response = test::call_service(&$service, $request.to_request()).await;
        assert!(
            response.status().is_success(),
            "Got {} response",
            response.status()
        );
        test::read_body_json(response).await
    }};
}

pub struct TestUser {
    pub user_id: UserId,
    pub email: String,
    repo: Arc<dyn UserRepo>,
}

impl TestUser {
    pub async fn new(user_repo: Arc<dyn UserRepo>) -> TestUser {
        let email = format!("test-user-{}@example.com", Uuid::new_v4());
        let user = NewUser::new(
            email.clone(),
            expense_lib::auth::password::encode_password("pass").unwrap(),
        );
        let user = user_repo.create_user(user).await.unwrap();
        info!(user_id = %user.id, "Created user");
        TestUser {
            user_id: user.id,
            email,
            repo: user_repo,
        }
    }

    pub async fn delete(&self) {
        self.repo.delete_user(&self.user_id).await.unwrap()
    }
}

#[fixture]
#[once]
pub fn tracing_setup() -> () {
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(Level::DEBUG)
        .init();
    info!("tracing initialized");
}

#[fixture]
pub fn repos() -> Repos {
    expense_repo::mem_repo::create_repos()
}
