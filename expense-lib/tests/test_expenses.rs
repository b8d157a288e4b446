use std::str::FromStr;

use actix_web::http::StatusCode;
use actix_web::test;
use actix_web::test::TestRequest;
use actix_web::web::Data;
use actix_web::App;
use chrono::NaiveDate;
use rstest::rstest;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::utils::mock::MockAuthentication;
use expense_lib::dto::ExpenseDto;
use expense_repo::expense_repo::NewExpense;
use expense_repo::ids::{ExpenseId, Money};
use expense_repo::Repos;
use utils::repos;
use utils::tracing_setup;
use utils::TestUser;

#[macro_use]
mod utils;

fn new_expense(title: &str, date: &str, amount: &str, category: Option<&str>) -> NewExpense {
    NewExpense::new(
        title.to_owned(),
        Money::new(Decimal::from_str(amount).unwrap()).unwrap(),
        NaiveDate::from_str(date).unwrap(),
        category.map(str::to_owned),
        None,
    )
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_create_and_get_expense(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let app = build_app!(repos, test_user.user_id);
    let service = test::init_service(app).await;

    let new_expense = new_expense("Coffee", "2023-09-01", "3.50", Some("Food"));
    let created: ExpenseDto = send_json!(&service, TestRequest::post().uri("/expenses"), new_expense);
    assert_eq!(created.title, "Coffee");
    assert_eq!(created.amount, Decimal::from_str("3.50").unwrap());
    assert_eq!(created.user_id, test_user.user_id.as_uuid());

    let fetched: ExpenseDto = call_json!(
        &service,
        TestRequest::get().uri(&format!("/expenses/{}", created.id))
    );
    assert_eq!(created, fetched);

    test_user.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_update_and_delete_expense(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let app = build_app!(repos, test_user.user_id);
    let service = test::init_service(app).await;

    let created: ExpenseDto = send_json!(
        &service,
        TestRequest::post().uri("/expenses"),
        new_expense("Train", "2023-09-02", "12", None)
    );

    let update = new_expense("Train ticket", "2023-09-02", "12.40", Some("Travel"));
    let updated: ExpenseDto = send_json!(
        &service,
        TestRequest::put().uri(&format!("/expenses/{}", created.id)),
        update
    );
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Train ticket");
    assert_eq!(updated.category.as_deref(), Some("Travel"));

    let deleted: ExpenseDto = call_json!(
        &service,
        TestRequest::delete().uri(&format!("/expenses/{}", created.id))
    );
    assert_eq!(deleted, updated);

    let request = TestRequest::get()
        .uri(&format!("/expenses/{}", created.id))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_user.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_list_filters_and_pages(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let app = build_app!(repos, test_user.user_id);
    let service = test::init_service(app).await;

    for (title, date, category) in [
        ("Rent", "2023-08-01", "Housing"),
        ("Lunch", "2023-08-15", "Food"),
        ("Dinner", "2023-09-03", "Food"),
        ("Books", "2023-09-10", "Education"),
    ] {
        let _: ExpenseDto = send_json!(
            &service,
            TestRequest::post().uri("/expenses"),
            new_expense(title, date, "10", Some(category))
        );
    }

    let all: Vec<ExpenseDto> = call_json!(&service, TestRequest::get().uri("/expenses"));
    assert_eq!(
        all.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
        vec!["Books", "Dinner", "Lunch", "Rent"]
    );

    let food: Vec<ExpenseDto> =
        call_json!(&service, TestRequest::get().uri("/expenses?category=Food"));
    assert_eq!(food.len(), 2);

    let september: Vec<ExpenseDto> = call_json!(
        &service,
        TestRequest::get().uri("/expenses?from=2023-09-01&until=2023-09-30")
    );
    assert_eq!(
        september.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
        vec!["Books", "Dinner"]
    );

    let page: Vec<ExpenseDto> =
        call_json!(&service, TestRequest::get().uri("/expenses?offset=1&limit=2"));
    assert_eq!(
        page.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
        vec!["Dinner", "Lunch"]
    );

    let mut categories: Vec<String> =
        call_json!(&service, TestRequest::get().uri("/expenses/categories"));
    categories.sort();
    assert_eq!(categories, vec!["Education", "Food", "Housing"]);

    let request = TestRequest::get()
        .uri("/expenses?limit=-1")
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    test_user.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_expenses_are_private(_tracing_setup: &(), repos: Repos) {
    let owner = TestUser::new(repos.user_repo.clone()).await;
    let other = TestUser::new(repos.user_repo.clone()).await;

    let owner_service = test::init_service(build_app!(repos, owner.user_id)).await;
    let other_service = test::init_service(build_app!(repos, other.user_id)).await;

    let created: ExpenseDto = send_json!(
        &owner_service,
        TestRequest::post().uri("/expenses"),
        new_expense("Gift", "2023-09-05", "25", None)
    );

    let request = TestRequest::get()
        .uri(&format!("/expenses/{}", created.id))
        .to_request();
    let response = test::call_service(&other_service, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let listed: Vec<ExpenseDto> = call_json!(&other_service, TestRequest::get().uri("/expenses"));
    assert!(listed.is_empty());

    owner.delete().await;
    other.delete().await
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_update_missing_expense(_tracing_setup: &(), repos: Repos) {
    let test_user = TestUser::new(repos.user_repo.clone()).await;
    let app = build_app!(repos, test_user.user_id);
    let service = test::init_service(app).await;

    let request = TestRequest::put()
        .uri(&format!("/expenses/{}", ExpenseId::generate()))
        .set_json(&new_expense("Nothing", "2023-09-05", "1", None))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_user.delete().await
}
