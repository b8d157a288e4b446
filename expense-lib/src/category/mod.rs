use actix_web::{web, Scope};

mod handlers;

pub use handlers::CategoryMove;

pub fn category_service() -> Scope {
    web::scope("/categories")
        .service(handlers::get_roots)
        .service(handlers::create_category)
        .service(handlers::get_tree)
        .service(handlers::get_category)
        .service(handlers::update_category)
        .service(handlers::delete_category)
        .service(handlers::get_children)
        .service(handlers::get_descendants)
        .service(handlers::move_category)
}
