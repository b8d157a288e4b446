use crate::dto::{to_dtos, ProductCategoryDto, ProductDto};
use crate::error::HandlerError;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use expense_repo::ids::{CategoryId, ProductId};
use expense_repo::product_repo::{NewProduct, Product, ProductCategory, ProductRepo};
use expense_repo::status::RecordStatus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /products/{id}/categories`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProductCategoryLink {
    pub category_id: CategoryId,
    #[serde(default)]
    pub status: RecordStatus,
}

#[get("")]
pub async fn get_all_products(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
) -> Result<impl Responder, HandlerError> {
    let products = product_repo.get_all_products().await?;
    Ok(HttpResponse::Ok().json(to_dtos::<Product, ProductDto>(products)))
}

#[post("")]
pub async fn create_product(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
    new_product: web::Json<NewProduct>,
) -> Result<impl Responder, HandlerError> {
    let product = product_repo
        .create_product(new_product.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ProductDto::from(product)))
}

#[get("/{product_id}")]
pub async fn get_product(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
    product_id: web::Path<ProductId>,
) -> Result<impl Responder, HandlerError> {
    let product = product_repo.get_product(product_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProductDto::from(product)))
}

#[put("/{product_id}")]
pub async fn update_product(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
    product_id: web::Path<ProductId>,
    updated_product: web::Json<NewProduct>,
) -> Result<impl Responder, HandlerError> {
    let product = product_repo
        .update_product(product_id.into_inner(), updated_product.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ProductDto::from(product)))
}

#[delete("/{product_id}")]
pub async fn delete_product(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
    product_id: web::Path<ProductId>,
) -> Result<impl Responder, HandlerError> {
    let product = product_repo
        .delete_product(product_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ProductDto::from(product)))
}

#[get("/{product_id}/categories")]
pub async fn get_product_categories(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
    product_id: web::Path<ProductId>,
) -> Result<impl Responder, HandlerError> {
    let links = product_repo
        .get_product_categories(product_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_dtos::<ProductCategory, ProductCategoryDto>(links)))
}

#[post("/{product_id}/categories")]
pub async fn add_category(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
    product_id: web::Path<ProductId>,
    link: web::Json<ProductCategoryLink>,
) -> Result<impl Responder, HandlerError> {
    let link = link.into_inner();
    let link = product_repo
        .add_category(product_id.into_inner(), link.category_id, link.status)
        .await?;
    Ok(HttpResponse::Ok().json(ProductCategoryDto::from(link)))
}

#[delete("/{product_id}/categories/{category_id}")]
pub async fn remove_category(
    product_repo: web::Data<Arc<dyn ProductRepo>>,
    path: web::Path<(ProductId, CategoryId)>,
) -> Result<impl Responder, HandlerError> {
    let (product_id, category_id) = path.into_inner();
    let link = product_repo
        .remove_category(product_id, category_id)
        .await?;
    Ok(HttpResponse::Ok().json(ProductCategoryDto::from(link)))
}
