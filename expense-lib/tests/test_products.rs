use std::str::FromStr;

use actix_web::http::StatusCode;
use actix_web::test;
use actix_web::test::TestRequest;
use actix_web::web::Data;
use actix_web::App;
use rstest::rstest;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::utils::mock::MockAuthentication;
use expense_lib::dto::{CategoryDto, ProductCategoryDto, ProductDto};
use expense_lib::product::ProductCategoryLink;
use expense_repo::category_repo::NewCategory;
use expense_repo::ids::{CategoryId, Money};
use expense_repo::product_repo::NewProduct;
use expense_repo::status::RecordStatus;
use expense_repo::Repos;
use utils::repos;
use utils::tracing_setup;
use utils::TestUser;

#[macro_use]
mod utils;

fn new_product(code: &str, price: &str) -> NewProduct {
    NewProduct {
        code: code.to_owned(),
        name: format!("Product {}", code),
        description: None,
        price: Money::new(Decimal::from_str(price).unwrap()).unwrap(),
        status: RecordStatus::Active,
    }
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_product_crud(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let service = test::init_service(build_app!(repos, test_user.user_id)).await;

    let created: ProductDto = send_json!(
        &service,
        TestRequest::post().uri("/products"),
        new_product("B-200", "19.99")
    );
    assert_eq!(created.code, "B-200");
    assert_eq!(created.price, Decimal::from_str("19.99").unwrap());

    let _: ProductDto = send_json!(
        &service,
        TestRequest::post().uri("/products"),
        new_product("A-100", "5")
    );
    let all: Vec<ProductDto> = call_json!(&service, TestRequest::get().uri("/products"));
    assert_eq!(
        all.iter().map(|p| p.code.as_str()).collect::<Vec<_>>(),
        vec!["A-100", "B-200"]
    );

    let mut update = new_product("B-201", "17.50");
    update.description = Some("Discounted".to_owned());
    let updated: ProductDto = send_json!(
        &service,
        TestRequest::put().uri(&format!("/products/{}", created.id)),
        update
    );
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.code, "B-201");
    assert_eq!(updated.description.as_deref(), Some("Discounted"));

    let deleted: ProductDto = call_json!(
        &service,
        TestRequest::delete().uri(&format!("/products/{}", created.id))
    );
    assert_eq!(deleted, updated);

    let request = TestRequest::get()
        .uri(&format!("/products/{}", created.id))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_user.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_duplicate_code(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let service = test::init_service(build_app!(repos, test_user.user_id)).await;

    let _: ProductDto = send_json!(
        &service,
        TestRequest::post().uri("/products"),
        new_product("DUP-1", "1")
    );
    let request = TestRequest::post()
        .uri("/products")
        .set_json(&new_product("DUP-1", "2"))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    test_user.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_overlong_code(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let service = test::init_service(build_app!(repos, test_user.user_id)).await;

    let request = TestRequest::post()
        .uri("/products")
        .set_json(&new_product(&"X".repeat(65), "1"))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "code is longer than 64 characters");

    test_user.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_product_categories(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let service = test::init_service(build_app!(repos, test_user.user_id)).await;

    let product: ProductDto = send_json!(
        &service,
        TestRequest::post().uri("/products"),
        new_product("CAT-1", "9.90")
    );
    let category: CategoryDto = send_json!(
        &service,
        TestRequest::post().uri("/categories"),
        NewCategory::root("Stationery")
    );
    let link = ProductCategoryLink {
        category_id: CategoryId::from_uuid(category.id),
        status: RecordStatus::Active,
    };

    let added: ProductCategoryDto = send_json!(
        &service,
        TestRequest::post().uri(&format!("/products/{}/categories", product.id)),
        link
    );
    assert_eq!(added.product_id, product.id);
    assert_eq!(added.category_id, category.id);

    let request = TestRequest::post()
        .uri(&format!("/products/{}/categories", product.id))
        .set_json(&link)
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let links: Vec<ProductCategoryDto> = call_json!(
        &service,
        TestRequest::get().uri(&format!("/products/{}/categories", product.id))
    );
    assert_eq!(links, vec![added.clone()]);

    let removed: ProductCategoryDto = call_json!(
        &service,
        TestRequest::delete().uri(&format!(
            "/products/{}/categories/{}",
            product.id, category.id
        ))
    );
    assert_eq!(removed, added);

    let request = TestRequest::delete()
        .uri(&format!(
            "/products/{}/categories/{}",
            product.id, category.id
        ))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_user.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_link_to_missing_category(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let service = test::init_service(build_app!(repos, test_user.user_id)).await;

    let product: ProductDto = send_json!(
        &service,
        TestRequest::post().uri("/products"),
        new_product("MISS-1", "3")
    );
    let request = TestRequest::post()
        .uri(&format!("/products/{}/categories", product.id))
        .set_json(&ProductCategoryLink {
            category_id: CategoryId::generate(),
            status: RecordStatus::Active,
        })
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_user.delete().await
}
