use actix_web::{web, Scope};

mod handlers;

pub use handlers::ProductCategoryLink;

pub fn product_service() -> Scope {
    web::scope("/products")
        .service(handlers::get_all_products)
        .service(handlers::create_product)
        .service(handlers::get_product)
        .service(handlers::update_product)
        .service(handlers::delete_product)
        .service(handlers::get_product_categories)
        .service(handlers::add_category)
        .service(handlers::remove_category)
}
