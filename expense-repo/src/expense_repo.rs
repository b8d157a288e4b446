use crate::ids::{ExpenseId, Money, UserId};
use crate::limits::{check_length, TooLong, MAX_TEXT_LENGTH};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Deserialize, Clone, Copy, Debug)]
pub struct PageOptions {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Deserialize, Default, Clone, Debug)]
pub struct Filter {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub category: Option<String>,
}

impl Filter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(from) = self.from {
            if expense.date < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if expense.date > until {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if expense.category.as_ref() != Some(category) {
                return false;
            }
        }
        true
    }
}

/// All operations are scoped to the owning user. Expenses of other users behave as if they do
/// not exist.
#[async_trait]
pub trait ExpenseRepo: Sync + Send {
    async fn get_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
    ) -> Result<Expense, ExpenseRepoError>;

    /// Newest first, ties broken by creation time
    async fn get_all_expenses(
        &self,
        user: &UserId,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Expense>, ExpenseRepoError>;

    async fn create_expense(
        &self,
        user: &UserId,
        new_expense: NewExpense,
    ) -> Result<Expense, ExpenseRepoError>;

    async fn update_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
        updated_expense: NewExpense,
    ) -> Result<Expense, ExpenseRepoError>;

    async fn delete_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
    ) -> Result<Expense, ExpenseRepoError>;

    /// Distinct free text categories used by the user's expenses
    async fn get_all_categories(&self, user: &UserId) -> Result<Vec<String>, ExpenseRepoError>;
}

#[derive(Error, Debug)]
pub enum ExpenseRepoError {
    #[error("Expense with id {0} not found")]
    ExpenseNotFound(ExpenseId),
    #[error(transparent)]
    TooLong(#[from] TooLong),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone, PartialEq, Debug)]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: UserId,
    pub title: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Ordering used when listing expenses: newest date first.
    pub fn listing_order(a: &Expense, b: &Expense) -> Ordering {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewExpense {
    pub title: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl NewExpense {
    pub const fn new(
        title: String,
        amount: Money,
        date: NaiveDate,
        category: Option<String>,
        notes: Option<String>,
    ) -> NewExpense {
        NewExpense {
            title,
            amount,
            date,
            category,
            notes,
        }
    }

    pub fn check_lengths(&self) -> Result<(), TooLong> {
        check_length("title", &self.title, MAX_TEXT_LENGTH)?;
        match &self.category {
            Some(category) => check_length("category", category, MAX_TEXT_LENGTH),
            None => Ok(()),
        }
    }
}
