use crate::dto::{to_dtos, ExpenseDto};
use crate::error::HandlerError;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::NaiveDate;
use expense_repo::expense_repo::{Expense, ExpenseRepo, Filter, NewExpense, PageOptions};
use expense_repo::ids::{ExpenseId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query string of `GET /expenses`
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct ExpenseQuery {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub category: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ExpenseQuery {
    fn into_parts(self) -> Result<(Filter, Option<PageOptions>), HandlerError> {
        if self.offset.map_or(false, |o| o < 0) || self.limit.map_or(false, |l| l < 0) {
            return Err(HandlerError::BadRequest(
                "offset and limit must not be negative".to_owned(),
            ));
        }
        let page_options = match (self.offset, self.limit) {
            (None, None) => None,
            (offset, limit) => Some(PageOptions {
                offset: offset.unwrap_or(0),
                limit: limit.unwrap_or(i64::MAX),
            }),
        };
        let filter = Filter {
            from: self.from,
            until: self.until,
            category: self.category,
        };
        Ok((filter, page_options))
    }
}

#[get("")]
pub async fn get_all_expenses(
    expense_repo: web::Data<Arc<dyn ExpenseRepo>>,
    user_id: web::ReqData<UserId>,
    query: web::Query<ExpenseQuery>,
) -> Result<impl Responder, HandlerError> {
    let (filter, page_options) = query.into_inner().into_parts()?;
    let expenses = expense_repo
        .get_all_expenses(&user_id.into_inner(), filter, page_options)
        .await?;
    Ok(HttpResponse::Ok().json(to_dtos::<Expense, ExpenseDto>(expenses)))
}

#[get("/categories")]
pub async fn get_all_categories(
    expense_repo: web::Data<Arc<dyn ExpenseRepo>>,
    user_id: web::ReqData<UserId>,
) -> Result<impl Responder, HandlerError> {
    let categories = expense_repo
        .get_all_categories(&user_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[get("/{expense_id}")]
pub async fn get_expense(
    expense_repo: web::Data<Arc<dyn ExpenseRepo>>,
    user_id: web::ReqData<UserId>,
    expense_id: web::Path<ExpenseId>,
) -> Result<impl Responder, HandlerError> {
    let expense = expense_repo
        .get_expense(&user_id.into_inner(), expense_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ExpenseDto::from(expense)))
}

#[post("")]
pub async fn create_expense(
    expense_repo: web::Data<Arc<dyn ExpenseRepo>>,
    user_id: web::ReqData<UserId>,
    new_expense: web::Json<NewExpense>,
) -> Result<impl Responder, HandlerError> {
    let expense = expense_repo
        .create_expense(&user_id.into_inner(), new_expense.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ExpenseDto::from(expense)))
}

#[put("/{expense_id}")]
pub async fn update_expense(
    expense_repo: web::Data<Arc<dyn ExpenseRepo>>,
    user_id: web::ReqData<UserId>,
    expense_id: web::Path<ExpenseId>,
    updated_expense: web::Json<NewExpense>,
) -> Result<impl Responder, HandlerError> {
    let expense = expense_repo
        .update_expense(
            &user_id.into_inner(),
            expense_id.into_inner(),
            updated_expense.into_inner(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ExpenseDto::from(expense)))
}

#[delete("/{expense_id}")]
pub async fn delete_expense(
    expense_repo: web::Data<Arc<dyn ExpenseRepo>>,
    user_id: web::ReqData<UserId>,
    expense_id: web::Path<ExpenseId>,
) -> Result<impl Responder, HandlerError> {
    let expense = expense_repo
        .delete_expense(&user_id.into_inner(), expense_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ExpenseDto::from(expense)))
}

#[cfg(test)]
mod tests {
    use super::ExpenseQuery;

    #[test]
    fn no_paging_without_offset_or_limit() {
        let (filter, page_options) = ExpenseQuery {
            category: Some("Food".to_owned()),
            ..ExpenseQuery::default()
        }
        .into_parts()
        .unwrap();
        assert!(page_options.is_none());
        assert_eq!(filter.category.as_deref(), Some("Food"));
    }

    #[test]
    fn limit_alone_starts_at_zero() {
        let (_, page_options) = ExpenseQuery {
            limit: Some(5),
            ..ExpenseQuery::default()
        }
        .into_parts()
        .unwrap();
        let page_options = page_options.unwrap();
        assert_eq!(page_options.offset, 0);
        assert_eq!(page_options.limit, 5);
    }

    #[test]
    fn negative_paging_is_rejected() {
        let result = ExpenseQuery {
            offset: Some(-1),
            ..ExpenseQuery::default()
        }
        .into_parts();
        assert!(result.is_err());
    }
}
