use actix_web::{web, Scope};

mod handlers;

pub use handlers::{ApplicableCategory, ApplicableProduct};

pub fn promotion_service() -> Scope {
    web::scope("/promotions")
        .service(handlers::get_all_promotions)
        .service(handlers::create_promotion)
        .service(handlers::get_promotion)
        .service(handlers::update_promotion)
        .service(handlers::delete_promotion)
        .service(handlers::get_rules)
        .service(handlers::add_rule)
        .service(handlers::delete_rule)
        .service(handlers::get_applicable_products)
        .service(handlers::add_applicable_product)
        .service(handlers::remove_applicable_product)
        .service(handlers::get_applicable_categories)
        .service(handlers::add_applicable_category)
        .service(handlers::remove_applicable_category)
}
