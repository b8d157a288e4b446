use crate::dto::{
    to_dtos, PromotionApplicableCategoryDto, PromotionApplicableProductDto, PromotionDto,
    PromotionRuleDto,
};
use crate::error::HandlerError;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use expense_repo::ids::{CategoryId, ProductId, PromotionId, PromotionRuleId};
use expense_repo::promotion_repo::{
    NewPromotion, NewPromotionRule, Promotion, PromotionApplicableCategory,
    PromotionApplicableProduct, PromotionRepo, PromotionRule,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Body of `POST /promotions/{id}/products`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApplicableProduct {
    pub product_id: ProductId,
}

/// Body of `POST /promotions/{id}/categories`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApplicableCategory {
    pub category_id: CategoryId,
    #[serde(default)]
    pub include_children: bool,
}

#[get("")]
pub async fn get_all_promotions(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
) -> Result<impl Responder, HandlerError> {
    let promotions = promotion_repo.get_all_promotions().await?;
    Ok(HttpResponse::Ok().json(to_dtos::<Promotion, PromotionDto>(promotions)))
}

#[post("")]
pub async fn create_promotion(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    new_promotion: web::Json<NewPromotion>,
) -> Result<impl Responder, HandlerError> {
    let promotion = promotion_repo
        .create_promotion(new_promotion.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PromotionDto::from(promotion)))
}

#[get("/{promotion_id}")]
pub async fn get_promotion(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
) -> Result<impl Responder, HandlerError> {
    let promotion = promotion_repo
        .get_promotion(promotion_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PromotionDto::from(promotion)))
}

#[put("/{promotion_id}")]
pub async fn update_promotion(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
    updated_promotion: web::Json<NewPromotion>,
) -> Result<impl Responder, HandlerError> {
    let promotion = promotion_repo
        .update_promotion(promotion_id.into_inner(), updated_promotion.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PromotionDto::from(promotion)))
}

#[delete("/{promotion_id}")]
pub async fn delete_promotion(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
) -> Result<impl Responder, HandlerError> {
    let promotion = promotion_repo
        .delete_promotion(promotion_id.into_inner())
        .await?;
    info!(promotion_id = %promotion.id, "Deleted promotion");
    Ok(HttpResponse::Ok().json(PromotionDto::from(promotion)))
}

#[get("/{promotion_id}/rules")]
pub async fn get_rules(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
) -> Result<impl Responder, HandlerError> {
    let rules = promotion_repo.get_rules(promotion_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(to_dtos::<PromotionRule, PromotionRuleDto>(rules)))
}

#[post("/{promotion_id}/rules")]
pub async fn add_rule(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
    new_rule: web::Json<NewPromotionRule>,
) -> Result<impl Responder, HandlerError> {
    let rule = promotion_repo
        .add_rule(promotion_id.into_inner(), new_rule.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PromotionRuleDto::from(rule)))
}

#[delete("/{promotion_id}/rules/{rule_id}")]
pub async fn delete_rule(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    path: web::Path<(PromotionId, PromotionRuleId)>,
) -> Result<impl Responder, HandlerError> {
    let (promotion_id, rule_id) = path.into_inner();
    let rule = promotion_repo.delete_rule(promotion_id, rule_id).await?;
    Ok(HttpResponse::Ok().json(PromotionRuleDto::from(rule)))
}

#[get("/{promotion_id}/products")]
pub async fn get_applicable_products(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
) -> Result<impl Responder, HandlerError> {
    let products = promotion_repo
        .get_applicable_products(promotion_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_dtos::<
        PromotionApplicableProduct,
        PromotionApplicableProductDto,
    >(products)))
}

#[post("/{promotion_id}/products")]
pub async fn add_applicable_product(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
    applicable: web::Json<ApplicableProduct>,
) -> Result<impl Responder, HandlerError> {
    let applicable = promotion_repo
        .add_applicable_product(promotion_id.into_inner(), applicable.product_id)
        .await?;
    Ok(HttpResponse::Ok().json(PromotionApplicableProductDto::from(applicable)))
}

#[delete("/{promotion_id}/products/{product_id}")]
pub async fn remove_applicable_product(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    path: web::Path<(PromotionId, ProductId)>,
) -> Result<impl Responder, HandlerError> {
    let (promotion_id, product_id) = path.into_inner();
    let applicable = promotion_repo
        .remove_applicable_product(promotion_id, product_id)
        .await?;
    Ok(HttpResponse::Ok().json(PromotionApplicableProductDto::from(applicable)))
}

#[get("/{promotion_id}/categories")]
pub async fn get_applicable_categories(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
) -> Result<impl Responder, HandlerError> {
    let categories = promotion_repo
        .get_applicable_categories(promotion_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_dtos::<
        PromotionApplicableCategory,
        PromotionApplicableCategoryDto,
    >(categories)))
}

#[post("/{promotion_id}/categories")]
pub async fn add_applicable_category(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    promotion_id: web::Path<PromotionId>,
    applicable: web::Json<ApplicableCategory>,
) -> Result<impl Responder, HandlerError> {
    let applicable = applicable.into_inner();
    let applicable = promotion_repo
        .add_applicable_category(
            promotion_id.into_inner(),
            applicable.category_id,
            applicable.include_children,
        )
        .await?;
    Ok(HttpResponse::Ok().json(PromotionApplicableCategoryDto::from(applicable)))
}

#[delete("/{promotion_id}/categories/{category_id}")]
pub async fn remove_applicable_category(
    promotion_repo: web::Data<Arc<dyn PromotionRepo>>,
    path: web::Path<(PromotionId, CategoryId)>,
) -> Result<impl Responder, HandlerError> {
    let (promotion_id, category_id) = path.into_inner();
    let applicable = promotion_repo
        .remove_applicable_category(promotion_id, category_id)
        .await?;
    Ok(HttpResponse::Ok().json(PromotionApplicableCategoryDto::from(applicable)))
}
