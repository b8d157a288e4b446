use crate::dto::{to_dtos, CategoryDto};
use crate::error::HandlerError;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use expense_repo::category_repo::{Category, CategoryRepo, CategoryUpdate, NewCategory};
use expense_repo::ids::CategoryId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Body of `PUT /categories/{id}/parent`. A missing parent turns the category into a root.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CategoryMove {
    pub parent_id: Option<CategoryId>,
}

#[get("")]
pub async fn get_roots(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
) -> Result<impl Responder, HandlerError> {
    let roots = category_repo.get_roots().await?;
    Ok(HttpResponse::Ok().json(to_dtos::<Category, CategoryDto>(roots)))
}

#[post("")]
pub async fn create_category(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    new_category: web::Json<NewCategory>,
) -> Result<impl Responder, HandlerError> {
    let category = category_repo
        .create_category(new_category.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}

#[get("/trees/{tree_id}")]
pub async fn get_tree(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    tree_id: web::Path<CategoryId>,
) -> Result<impl Responder, HandlerError> {
    let tree = category_repo.get_tree(tree_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(to_dtos::<Category, CategoryDto>(tree)))
}

#[get("/{category_id}")]
pub async fn get_category(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    category_id: web::Path<CategoryId>,
) -> Result<impl Responder, HandlerError> {
    let category = category_repo
        .get_category(category_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}

#[put("/{category_id}")]
pub async fn update_category(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    category_id: web::Path<CategoryId>,
    update: web::Json<CategoryUpdate>,
) -> Result<impl Responder, HandlerError> {
    let category = category_repo
        .update_category(category_id.into_inner(), update.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}

#[delete("/{category_id}")]
pub async fn delete_category(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    category_id: web::Path<CategoryId>,
) -> Result<impl Responder, HandlerError> {
    let category = category_repo
        .delete_category(category_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}

#[get("/{category_id}/children")]
pub async fn get_children(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    category_id: web::Path<CategoryId>,
) -> Result<impl Responder, HandlerError> {
    let children = category_repo
        .get_children(category_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_dtos::<Category, CategoryDto>(children)))
}

#[get("/{category_id}/descendants")]
pub async fn get_descendants(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    category_id: web::Path<CategoryId>,
) -> Result<impl Responder, HandlerError> {
    let descendants = category_repo
        .get_descendants(category_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_dtos::<Category, CategoryDto>(descendants)))
}

#[put("/{category_id}/parent")]
pub async fn move_category(
    category_repo: web::Data<Arc<dyn CategoryRepo>>,
    category_id: web::Path<CategoryId>,
    category_move: web::Json<CategoryMove>,
) -> Result<impl Responder, HandlerError> {
    let category_id = category_id.into_inner();
    let new_parent = category_move.into_inner().parent_id;
    let category = category_repo
        .move_category(category_id, new_parent)
        .await?;
    info!(%category_id, ?new_parent, "Moved category");
    Ok(HttpResponse::Ok().json(CategoryDto::from(category)))
}
