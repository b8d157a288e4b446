use crate::expense_repo::ExpenseRepoError::ExpenseNotFound;
use crate::expense_repo::{
    Expense, ExpenseRepo, ExpenseRepoError, Filter, NewExpense, PageOptions,
};
use crate::ids::{ExpenseId, UserId};
use crate::mem_repo::MemRepo;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;

#[async_trait]
impl ExpenseRepo for MemRepo {
    async fn get_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
    ) -> Result<Expense, ExpenseRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .expenses
            .get(&expense_id)
            .filter(|e| e.user_id == *user)
            .cloned()
            .ok_or(ExpenseNotFound(expense_id))
    }

    async fn get_all_expenses(
        &self,
        user: &UserId,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Expense>, ExpenseRepoError> {
        let read_guard = self.read_lock()?;

        let mut expenses: Vec<Expense> = read_guard
            .expenses
            .values()
            .filter(|e| e.user_id == *user && filter.matches(e))
            .cloned()
            .collect();
        expenses.sort_by(Expense::listing_order);

        if let Some(page_options) = page_options {
            let offset = usize::try_from(page_options.offset.max(0)).unwrap_or(usize::MAX);
            let limit = usize::try_from(page_options.limit.max(0)).unwrap_or(usize::MAX);
            expenses = expenses.into_iter().skip(offset).take(limit).collect();
        }
        Ok(expenses)
    }

    async fn create_expense(
        &self,
        user: &UserId,
        new_expense: NewExpense,
    ) -> Result<Expense, ExpenseRepoError> {
        new_expense.check_lengths()?;
        let mut write_guard = self.write_lock()?;

        if !write_guard.users.contains_key(user) {
            return Err(anyhow!("User {} does not exist", user).into());
        }

        let now = Utc::now();
        let expense = Expense {
            id: ExpenseId::generate(),
            user_id: *user,
            title: new_expense.title,
            amount: new_expense.amount,
            date: new_expense.date,
            category: new_expense.category,
            notes: new_expense.notes,
            created_at: now,
            updated_at: now,
        };
        write_guard.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn update_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
        updated_expense: NewExpense,
    ) -> Result<Expense, ExpenseRepoError> {
        updated_expense.check_lengths()?;
        let mut write_guard = self.write_lock()?;

        let Some(expense) = write_guard
            .expenses
            .get_mut(&expense_id)
            .filter(|e| e.user_id == *user)
        else {
            return Err(ExpenseNotFound(expense_id));
        };
        expense.title = updated_expense.title;
        expense.amount = updated_expense.amount;
        expense.date = updated_expense.date;
        expense.category = updated_expense.category;
        expense.notes = updated_expense.notes;
        expense.updated_at = Utc::now();
        Ok(expense.clone())
    }

    async fn delete_expense(
        &self,
        user: &UserId,
        expense_id: ExpenseId,
    ) -> Result<Expense, ExpenseRepoError> {
        let mut write_guard = self.write_lock()?;

        match write_guard.expenses.get(&expense_id) {
            Some(e) if e.user_id == *user => {}
            _ => return Err(ExpenseNotFound(expense_id)),
        }
        write_guard
            .expenses
            .remove(&expense_id)
            .ok_or(ExpenseNotFound(expense_id))
    }

    async fn get_all_categories(&self, user: &UserId) -> Result<Vec<String>, ExpenseRepoError> {
        let read_guard = self.read_lock()?;

        let categories: BTreeSet<String> = read_guard
            .expenses
            .values()
            .filter(|e| e.user_id == *user)
            .filter_map(|e| e.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }
}
