use crate::expense_repo::ExpenseRepoError::ExpenseNotFound;
use crate::expense_repo::{
    Expense, ExpenseRepo, ExpenseRepoError, Filter, NewExpense, PageOptions,
};
use crate::ids::{ExpenseId, Money, UserId};
use crate::sqlx_repo::SQLxRepo;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{query_as, query_scalar, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct ExpenseEntry {
    id: Uuid,
    title: String,
    amount: Decimal,
    date: NaiveDate,
    category: Option<String>,
    notes: Option<String>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseEntry> for Expense {
    type Error = anyhow::Error;

    fn try_from(value: ExpenseEntry) -> Result<Self, Self::Error> {
        Ok(Expense {
            id: value.id.into(),
            user_id: value.user_id.into(),
            title: value.title,
            amount: Money::new(value.amount)?,
            date: value.date,
            category: value.category,
            notes: value.notes,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[async_trait]
impl ExpenseRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
    ) -> Result<Expense, ExpenseRepoError> {
        let entry: Option<ExpenseEntry> =
            query_as("SELECT * FROM expenses WHERE id = $1 AND user_id = $2")
                .bind(expense_id.as_uuid())
                .bind(user.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to get expense {}", expense_id))?;
        let entry = entry.ok_or(ExpenseNotFound(expense_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_all_expenses(
        &self,
        user: &UserId,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Expense>, ExpenseRepoError> {
        let mut query_builder = QueryBuilder::new("SELECT * FROM expenses WHERE user_id = ");
        query_builder.push_bind(user.as_uuid());
        if let Some(from) = filter.from {
            query_builder.push(" AND date >= ").push_bind(from);
        }
        if let Some(until) = filter.until {
            query_builder.push(" AND date <= ").push_bind(until);
        }
        if let Some(category) = filter.category {
            query_builder.push(" AND category = ").push_bind(category);
        }
        query_builder.push(" ORDER BY date DESC, created_at DESC, id DESC");
        if let Some(po) = page_options {
            query_builder
                .push(" OFFSET ")
                .push_bind(po.offset)
                .push(" LIMIT ")
                .push_bind(po.limit);
        }
        let entries: Vec<ExpenseEntry> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Unable to get expenses for user {}", user))?;

        let expenses = entries
            .into_iter()
            .map(Expense::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    #[instrument(skip(self, new_expense))]
    async fn create_expense(
        &self,
        user: &UserId,
        new_expense: NewExpense,
    ) -> Result<Expense, ExpenseRepoError> {
        new_expense.check_lengths()?;
        let entry: ExpenseEntry = query_as(
            "INSERT INTO expenses(id, title, amount, date, category, notes, user_id) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(ExpenseId::generate().as_uuid())
        .bind(&new_expense.title)
        .bind(new_expense.amount.amount())
        .bind(new_expense.date)
        .bind(&new_expense.category)
        .bind(&new_expense.notes)
        .bind(user.as_uuid())
        .fetch_one(&self.pool)
        .await
        .context("Unable to insert expense")?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self, updated_expense))]
    async fn update_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
        updated_expense: NewExpense,
    ) -> Result<Expense, ExpenseRepoError> {
        updated_expense.check_lengths()?;
        let entry: Option<ExpenseEntry> = query_as(
            "UPDATE expenses SET title = $1, amount = $2, date = $3, category = $4, notes = $5, updated_at = NOW() WHERE user_id = $6 AND id = $7 RETURNING *",
        )
        .bind(&updated_expense.title)
        .bind(updated_expense.amount.amount())
        .bind(updated_expense.date)
        .bind(&updated_expense.category)
        .bind(&updated_expense.notes)
        .bind(user.as_uuid())
        .bind(expense_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to update expense {}", expense_id))?;
        let entry = entry.ok_or(ExpenseNotFound(expense_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn delete_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
    ) -> Result<Expense, ExpenseRepoError> {
        let entry: Option<ExpenseEntry> =
            query_as("DELETE FROM expenses WHERE user_id = $1 AND id = $2 RETURNING *")
                .bind(user.as_uuid())
                .bind(expense_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to delete expense {}", expense_id))?;
        let entry = entry.ok_or(ExpenseNotFound(expense_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_all_categories(&self, user: &UserId) -> Result<Vec<String>, ExpenseRepoError> {
        let categories: Vec<String> = query_scalar(
            "SELECT DISTINCT category FROM expenses WHERE user_id = $1 AND category IS NOT NULL ORDER BY category",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get categories for user {}", user))?;
        Ok(categories)
    }
}
