//! Maintenance rules for the `ancestors` / `tree_id` columns of the category forest.
//!
//! Both repository implementations place and move nodes through these functions so that the
//! in-memory and PostgreSQL forests evolve identically.

use crate::category_repo::Category;
use crate::ids::CategoryId;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Category {0} cannot be moved under itself")]
    MoveUnderSelf(CategoryId),
    #[error("Category {category} cannot be moved under its descendant {new_parent}")]
    MoveUnderDescendant {
        category: CategoryId,
        new_parent: CategoryId,
    },
}

/// Where a node sits in the forest.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Placement {
    pub parent_id: Option<CategoryId>,
    pub ancestors: Vec<CategoryId>,
    pub tree_id: CategoryId,
}

pub fn root_placement(id: CategoryId) -> Placement {
    Placement {
        parent_id: None,
        ancestors: Vec::new(),
        tree_id: id,
    }
}

pub fn child_placement(parent: &Category) -> Placement {
    let mut ancestors = Vec::with_capacity(parent.ancestors.len() + 1);
    ancestors.extend_from_slice(&parent.ancestors);
    ancestors.push(parent.id);
    Placement {
        parent_id: Some(parent.id),
        ancestors,
        tree_id: parent.tree_id,
    }
}

/// New placement of `node` once moved under `new_parent` (or to the top level).
pub fn move_placement(
    node: &Category,
    new_parent: Option<&Category>,
) -> Result<Placement, TreeError> {
    match new_parent {
        None => Ok(root_placement(node.id)),
        Some(parent) if parent.id == node.id => Err(TreeError::MoveUnderSelf(node.id)),
        Some(parent) if parent.is_descendant_of(node.id) => Err(TreeError::MoveUnderDescendant {
            category: node.id,
            new_parent: parent.id,
        }),
        Some(parent) => Ok(child_placement(parent)),
    }
}

/// Rewrites the ancestors of a descendant of `moved` after `moved` received `moved_ancestors`.
///
/// The part of the chain from `moved` downwards is kept; everything above it is replaced.
pub fn rebase_ancestors(
    descendant_ancestors: &[CategoryId],
    moved: CategoryId,
    moved_ancestors: &[CategoryId],
) -> Vec<CategoryId> {
    let position = descendant_ancestors
        .iter()
        .position(|id| *id == moved)
        .unwrap_or(descendant_ancestors.len());
    let mut rebased = Vec::with_capacity(moved_ancestors.len() + descendant_ancestors.len());
    rebased.extend_from_slice(moved_ancestors);
    rebased.extend_from_slice(&descendant_ancestors[position..]);
    rebased
}

/// Orders nodes the way trees are listed: shallowest first, then by name.
pub fn tree_order(a: &Category, b: &Category) -> std::cmp::Ordering {
    a.depth()
        .cmp(&b.depth())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ForestViolation {
    #[error("Tree {0} has no root")]
    MissingRoot(CategoryId),
    #[error("Tree {tree_id} has {count} roots")]
    MultipleRoots { tree_id: CategoryId, count: usize },
    #[error("Root {0} does not identify its own tree")]
    RootNotTreeId(CategoryId),
    #[error("Root {0} has ancestors")]
    RootWithAncestors(CategoryId),
    #[error("Category {category} starts its ancestors with {found:?} instead of root {expected}")]
    WrongRoot {
        category: CategoryId,
        expected: CategoryId,
        found: Option<CategoryId>,
    },
    #[error("Category {0} does not end its ancestors with its parent")]
    ParentMismatch(CategoryId),
    #[error("Parent of category {0} is missing")]
    MissingParent(CategoryId),
    #[error("Category {0} is not in the same tree as its parent")]
    TreeMismatch(CategoryId),
    #[error("Ancestors of category {0} differ from its parent's chain")]
    BrokenChain(CategoryId),
}

/// Checks every forest invariant over a complete set of categories.
pub fn check_forest(categories: &[Category]) -> Result<(), ForestViolation> {
    let by_id: HashMap<CategoryId, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut roots: HashMap<CategoryId, Vec<&Category>> = HashMap::new();
    for category in categories {
        roots.entry(category.tree_id).or_default();
        if category.is_root() {
            roots.entry(category.tree_id).or_default().push(category);
        }
    }

    let mut tree_roots: HashMap<CategoryId, CategoryId> = HashMap::new();
    for (tree_id, tree_roots_found) in &roots {
        match tree_roots_found.as_slice() {
            [] => return Err(ForestViolation::MissingRoot(*tree_id)),
            [root] => {
                if root.id != *tree_id {
                    return Err(ForestViolation::RootNotTreeId(root.id));
                }
                if !root.ancestors.is_empty() {
                    return Err(ForestViolation::RootWithAncestors(root.id));
                }
                tree_roots.insert(*tree_id, root.id);
            }
            many => {
                return Err(ForestViolation::MultipleRoots {
                    tree_id: *tree_id,
                    count: many.len(),
                })
            }
        }
    }

    for category in categories.iter().filter(|c| !c.is_root()) {
        let expected_root = tree_roots[&category.tree_id];
        let found_root = category.ancestors.first().copied();
        if found_root != Some(expected_root) {
            return Err(ForestViolation::WrongRoot {
                category: category.id,
                expected: expected_root,
                found: found_root,
            });
        }
        if category.ancestors.last().copied() != category.parent_id {
            return Err(ForestViolation::ParentMismatch(category.id));
        }
        let parent_id = category
            .parent_id
            .ok_or(ForestViolation::ParentMismatch(category.id))?;
        let parent = by_id
            .get(&parent_id)
            .ok_or(ForestViolation::MissingParent(category.id))?;
        if parent.tree_id != category.tree_id {
            return Err(ForestViolation::TreeMismatch(category.id));
        }
        if child_placement(parent).ancestors != category.ancestors {
            return Err(ForestViolation::BrokenChain(category.id));
        }
    }

    Ok(())
}
