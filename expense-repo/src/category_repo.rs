use crate::category_tree::TreeError;
use crate::ids::CategoryId;
use crate::limits::{check_length, TooLong, MAX_TEXT_LENGTH};
use crate::status::RecordStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A node in a category forest.
///
/// `ancestors` holds every ancestor id from the root down to the parent, so `ancestors[0]` is the
/// root of the tree and `ancestors.last()` is `parent_id`. `tree_id` is the id of the root. Roots
/// have no parent, no ancestors and `tree_id == id`.
#[derive(Clone, PartialEq, Debug)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub ancestors: Vec<CategoryId>,
    pub tree_id: CategoryId,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn is_descendant_of(&self, other: CategoryId) -> bool {
        self.ancestors.contains(&other)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl NewCategory {
    pub fn root(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_owned(),
            parent_id: None,
            status: RecordStatus::Active,
        }
    }

    pub fn child(name: &str, parent_id: CategoryId) -> NewCategory {
        NewCategory {
            name: name.to_owned(),
            parent_id: Some(parent_id),
            status: RecordStatus::Active,
        }
    }

    pub fn check_lengths(&self) -> Result<(), TooLong> {
        check_length("name", &self.name, MAX_TEXT_LENGTH)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CategoryUpdate {
    pub name: String,
    pub status: RecordStatus,
}

impl CategoryUpdate {
    pub fn check_lengths(&self) -> Result<(), TooLong> {
        check_length("name", &self.name, MAX_TEXT_LENGTH)
    }
}

#[derive(Error, Debug)]
pub enum CategoryRepoError {
    #[error("Category with id {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("Parent category with id {0} not found")]
    ParentNotFound(CategoryId),
    #[error(transparent)]
    InvalidTree(#[from] TreeError),
    #[error(transparent)]
    TooLong(#[from] TooLong),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait CategoryRepo: Sync + Send {
    async fn create_category(&self, new_category: NewCategory)
        -> Result<Category, CategoryRepoError>;

    async fn get_category(&self, category_id: CategoryId) -> Result<Category, CategoryRepoError>;

    /// Roots of every tree, ordered by name
    async fn get_roots(&self) -> Result<Vec<Category>, CategoryRepoError>;

    /// Every node of the tree, root first, then by depth and name
    async fn get_tree(&self, tree_id: CategoryId) -> Result<Vec<Category>, CategoryRepoError>;

    async fn get_children(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Category>, CategoryRepoError>;

    /// The whole subtree below the category, ordered by depth and name
    async fn get_descendants(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Category>, CategoryRepoError>;

    async fn update_category(
        &self,
        category_id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, CategoryRepoError>;

    /// Moves the category, with its subtree, under `new_parent`. `None` makes it the root of a new
    /// tree. Ancestors and tree ids of the whole subtree are rewritten.
    async fn move_category(
        &self,
        category_id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> Result<Category, CategoryRepoError>;

    /// Deletes the category and its whole subtree. Returns the deleted category.
    async fn delete_category(&self, category_id: CategoryId)
        -> Result<Category, CategoryRepoError>;
}
