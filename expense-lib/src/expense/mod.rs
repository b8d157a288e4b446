use actix_web::{web, Scope};

mod handlers;

pub use handlers::ExpenseQuery;

pub fn expense_service() -> Scope {
    web::scope("/expenses")
        .service(handlers::get_all_expenses)
        .service(handlers::get_all_categories)
        .service(handlers::get_expense)
        .service(handlers::create_expense)
        .service(handlers::update_expense)
        .service(handlers::delete_expense)
}
