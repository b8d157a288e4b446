use crate::category_repo::CategoryRepoError::{CategoryNotFound, ParentNotFound};
use crate::category_repo::{
    Category, CategoryRepo, CategoryRepoError, CategoryUpdate, NewCategory,
};
use crate::category_tree::{
    child_placement, move_placement, rebase_ancestors, root_placement, tree_order,
};
use crate::ids::CategoryId;
use crate::mem_repo::{MemRepo, State};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;

fn sorted(mut categories: Vec<Category>) -> Vec<Category> {
    categories.sort_by(tree_order);
    categories
}

fn find(state: &State, category_id: CategoryId) -> Result<&Category, CategoryRepoError> {
    state
        .categories
        .get(&category_id)
        .ok_or(CategoryNotFound(category_id))
}

#[async_trait]
impl CategoryRepo for MemRepo {
    async fn create_category(
        &self,
        new_category: NewCategory,
    ) -> Result<Category, CategoryRepoError> {
        new_category.check_lengths()?;
        let mut write_guard = self.write_lock()?;

        let id = CategoryId::generate();
        let placement = match new_category.parent_id {
            None => root_placement(id),
            Some(parent_id) => {
                let parent = write_guard
                    .categories
                    .get(&parent_id)
                    .ok_or(ParentNotFound(parent_id))?;
                child_placement(parent)
            }
        };

        let now = Utc::now();
        let category = Category {
            id,
            name: new_category.name,
            parent_id: placement.parent_id,
            ancestors: placement.ancestors,
            tree_id: placement.tree_id,
            status: new_category.status,
            created_at: now,
            updated_at: now,
        };
        write_guard.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, category_id: CategoryId) -> Result<Category, CategoryRepoError> {
        let read_guard = self.read_lock()?;
        find(&read_guard, category_id).cloned()
    }

    async fn get_roots(&self) -> Result<Vec<Category>, CategoryRepoError> {
        let read_guard = self.read_lock()?;

        let roots = read_guard
            .categories
            .values()
            .filter(|c| c.is_root())
            .cloned()
            .collect();
        Ok(sorted(roots))
    }

    async fn get_tree(&self, tree_id: CategoryId) -> Result<Vec<Category>, CategoryRepoError> {
        let read_guard = self.read_lock()?;

        let tree: Vec<Category> = read_guard
            .categories
            .values()
            .filter(|c| c.tree_id == tree_id)
            .cloned()
            .collect();
        if tree.is_empty() {
            return Err(CategoryNotFound(tree_id));
        }
        Ok(sorted(tree))
    }

    async fn get_children(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Category>, CategoryRepoError> {
        let read_guard = self.read_lock()?;
        find(&read_guard, category_id)?;

        let children = read_guard
            .categories
            .values()
            .filter(|c| c.parent_id == Some(category_id))
            .cloned()
            .collect();
        Ok(sorted(children))
    }

    async fn get_descendants(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Category>, CategoryRepoError> {
        let read_guard = self.read_lock()?;
        find(&read_guard, category_id)?;

        let descendants = read_guard
            .categories
            .values()
            .filter(|c| c.is_descendant_of(category_id))
            .cloned()
            .collect();
        Ok(sorted(descendants))
    }

    async fn update_category(
        &self,
        category_id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, CategoryRepoError> {
        update.check_lengths()?;
        let mut write_guard = self.write_lock()?;

        let category = write_guard
            .categories
            .get_mut(&category_id)
            .ok_or(CategoryNotFound(category_id))?;
        category.name = update.name;
        category.status = update.status;
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn move_category(
        &self,
        category_id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> Result<Category, CategoryRepoError> {
        let mut write_guard = self.write_lock()?;

        let node = find(&write_guard, category_id)?;
        let parent = match new_parent {
            Some(parent_id) => Some(
                write_guard
                    .categories
                    .get(&parent_id)
                    .ok_or(ParentNotFound(parent_id))?,
            ),
            None => None,
        };
        let placement = move_placement(node, parent)?;

        let now = Utc::now();
        for category in write_guard.categories.values_mut() {
            if category.is_descendant_of(category_id) {
                category.ancestors =
                    rebase_ancestors(&category.ancestors, category_id, &placement.ancestors);
                category.tree_id = placement.tree_id;
                category.updated_at = now;
            }
        }

        let node = write_guard
            .categories
            .get_mut(&category_id)
            .ok_or(CategoryNotFound(category_id))?;
        node.parent_id = placement.parent_id;
        node.ancestors = placement.ancestors;
        node.tree_id = placement.tree_id;
        node.updated_at = now;
        Ok(node.clone())
    }

    async fn delete_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Category, CategoryRepoError> {
        let mut write_guard = self.write_lock()?;

        let deleted = write_guard
            .categories
            .remove(&category_id)
            .ok_or(CategoryNotFound(category_id))?;

        let mut removed: HashSet<CategoryId> = write_guard
            .categories
            .values()
            .filter(|c| c.is_descendant_of(category_id))
            .map(|c| c.id)
            .collect();
        write_guard
            .categories
            .retain(|id, _| !removed.contains(id));

        removed.insert(category_id);
        write_guard
            .product_categories
            .retain(|_, link| !removed.contains(&link.category_id));
        write_guard
            .applicable_categories
            .retain(|_, link| !removed.contains(&link.category_id));
        Ok(deleted)
    }
}
