//! Response bodies of the REST API.
//!
//! Each DTO mirrors one domain type field for field, with the id newtypes and
//! [`Money`](expense_repo::ids::Money) unwrapped into their `Uuid` and `Decimal` representation.

use chrono::{DateTime, NaiveDate, Utc};
use expense_repo::category_repo::Category;
use expense_repo::expense_repo::Expense;
use expense_repo::product_repo::{Product, ProductCategory};
use expense_repo::promotion_repo::{
    DiscountType, Promotion, PromotionApplicableCategory, PromotionApplicableProduct,
    PromotionRule, PromotionStatus, RuleScope,
};
use expense_repo::status::RecordStatus;
use expense_repo::user_repo::User;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id.into(),
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ExpenseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseDto {
    fn from(expense: Expense) -> Self {
        ExpenseDto {
            id: expense.id.into(),
            user_id: expense.user_id.into(),
            title: expense.title,
            amount: expense.amount.into(),
            date: expense.date,
            category: expense.category,
            notes: expense.notes,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub ancestors: Vec<Uuid>,
    pub tree_id: Uuid,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        CategoryDto {
            id: category.id.into(),
            name: category.name,
            parent_id: category.parent_id.map(Uuid::from),
            ancestors: category.ancestors.into_iter().map(Uuid::from).collect(),
            tree_id: category.tree_id.into(),
            status: category.status,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ProductDto {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        ProductDto {
            id: product.id.into(),
            code: product.code,
            name: product.name,
            description: product.description,
            price: product.price.into(),
            status: product.status,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ProductCategoryDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub category_id: Uuid,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductCategory> for ProductCategoryDto {
    fn from(link: ProductCategory) -> Self {
        ProductCategoryDto {
            id: link.id.into(),
            product_id: link.product_id.into(),
            category_id: link.category_id.into(),
            status: link.status,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PromotionDto {
    pub id: Uuid,
    pub name: String,
    pub status: PromotionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Promotion> for PromotionDto {
    fn from(promotion: Promotion) -> Self {
        PromotionDto {
            id: promotion.id.into(),
            name: promotion.name,
            status: promotion.status,
            starts_at: promotion.starts_at,
            ends_at: promotion.ends_at,
            discount_type: promotion.discount_type,
            discount_value: promotion.discount_value.into(),
            max_discount_amount: promotion.max_discount_amount.map(Decimal::from),
            priority: promotion.priority,
            created_at: promotion.created_at,
            updated_at: promotion.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PromotionRuleDto {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub scope: RuleScope,
    pub min_qty: Option<i32>,
    pub min_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromotionRule> for PromotionRuleDto {
    fn from(rule: PromotionRule) -> Self {
        PromotionRuleDto {
            id: rule.id.into(),
            promotion_id: rule.promotion_id.into(),
            scope: rule.scope,
            min_qty: rule.min_qty,
            min_amount: rule.min_amount.map(Decimal::from),
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PromotionApplicableProductDto {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromotionApplicableProduct> for PromotionApplicableProductDto {
    fn from(applicable: PromotionApplicableProduct) -> Self {
        PromotionApplicableProductDto {
            id: applicable.id.into(),
            promotion_id: applicable.promotion_id.into(),
            product_id: applicable.product_id.into(),
            created_at: applicable.created_at,
            updated_at: applicable.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PromotionApplicableCategoryDto {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub category_id: Uuid,
    pub include_children: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromotionApplicableCategory> for PromotionApplicableCategoryDto {
    fn from(applicable: PromotionApplicableCategory) -> Self {
        PromotionApplicableCategoryDto {
            id: applicable.id.into(),
            promotion_id: applicable.promotion_id.into(),
            category_id: applicable.category_id.into(),
            include_children: applicable.include_children,
            created_at: applicable.created_at,
            updated_at: applicable.updated_at,
        }
    }
}

/// Converts a list of domain values into their DTOs
pub fn to_dtos<T, D: From<T>>(values: Vec<T>) -> Vec<D> {
    values.into_iter().map(D::from).collect()
}
