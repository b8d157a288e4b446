use crate::category_repo::CategoryRepoError::{CategoryNotFound, ParentNotFound};
use crate::category_repo::{
    Category, CategoryRepo, CategoryRepoError, CategoryUpdate, NewCategory,
};
use crate::category_tree::{child_placement, move_placement, root_placement};
use crate::ids::CategoryId;
use crate::sqlx_repo::SQLxRepo;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, Executor, PgConnection, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct CategoryEntry {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    ancestors: Vec<Uuid>,
    tree_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryEntry> for Category {
    type Error = anyhow::Error;

    fn try_from(value: CategoryEntry) -> Result<Self, Self::Error> {
        Ok(Category {
            id: value.id.into(),
            name: value.name,
            parent_id: value.parent_id.map(CategoryId::from),
            ancestors: value.ancestors.into_iter().map(CategoryId::from).collect(),
            tree_id: value.tree_id.into(),
            status: value.status.parse()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

fn to_categories(entries: Vec<CategoryEntry>) -> Result<Vec<Category>, CategoryRepoError> {
    let categories = entries
        .into_iter()
        .map(Category::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

fn uuids(ids: &[CategoryId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.as_uuid()).collect()
}

const SELECT_CATEGORIES: &str = "SELECT id, name, parent_id, ancestors, tree_id, status, created_at, updated_at FROM categories";

impl SQLxRepo {
    #[instrument(skip(db_executor))]
    async fn find_category<'e, E>(
        db_executor: E,
        category_id: CategoryId,
        lock: bool,
    ) -> Result<Option<Category>, CategoryRepoError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if lock {
            format!("{} WHERE id = $1 FOR UPDATE", SELECT_CATEGORIES)
        } else {
            format!("{} WHERE id = $1", SELECT_CATEGORIES)
        };
        let entry: Option<CategoryEntry> = query_as(&sql)
            .bind(category_id.as_uuid())
            .fetch_optional(db_executor)
            .await
            .with_context(|| format!("Unable to get category {}", category_id))?;
        entry.map(Category::try_from).transpose().map_err(Into::into)
    }

    /// Takes the transaction scoped lock of every given tree. Creating under a tree and moving
    /// into or out of it hold this lock, so the ancestors a transaction reads stay valid until it
    /// commits.
    #[instrument(skip(conn))]
    async fn lock_trees(
        conn: &mut PgConnection,
        mut tree_ids: Vec<CategoryId>,
    ) -> Result<(), CategoryRepoError> {
        // a fixed order keeps two movers from waiting on each other
        tree_ids.sort();
        tree_ids.dedup();
        for tree_id in tree_ids {
            query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT, 0))")
                .bind(tree_id.as_uuid())
                .execute(&mut *conn)
                .await
                .with_context(|| format!("Unable to lock tree {}", tree_id))?;
        }
        Ok(())
    }

    /// Locks the tree of `category_id` and returns the category as seen under that lock. `None`
    /// when the category moved to another tree while waiting, in which case the transaction has
    /// to be restarted.
    async fn find_in_locked_tree(
        tx: &mut Transaction<'_, Postgres>,
        category_id: CategoryId,
        expected_tree: CategoryId,
    ) -> Result<Option<Category>, CategoryRepoError> {
        let category = Self::find_category(&mut **tx, category_id, true)
            .await?
            .ok_or(CategoryNotFound(category_id))?;
        Ok((category.tree_id == expected_tree).then_some(category))
    }
}

#[async_trait]
impl CategoryRepo for SQLxRepo {
    #[instrument(skip(self, new_category), fields(name = %new_category.name))]
    async fn create_category(
        &self,
        new_category: NewCategory,
    ) -> Result<Category, CategoryRepoError> {
        new_category.check_lengths()?;
        let id = CategoryId::generate();

        let (mut tx, placement) = loop {
            let mut tx = self.pool.begin().await.context("Unable to start transaction")?;
            let Some(parent_id) = new_category.parent_id else {
                break (tx, root_placement(id));
            };

            let seen = Self::find_category(&mut *tx, parent_id, false)
                .await?
                .ok_or(ParentNotFound(parent_id))?;
            Self::lock_trees(&mut *tx, vec![seen.tree_id]).await?;
            match Self::find_in_locked_tree(&mut tx, parent_id, seen.tree_id).await {
                Ok(Some(parent)) => break (tx, child_placement(&parent)),
                Ok(None) => info!(%parent_id, "Parent moved to another tree, retrying"),
                Err(CategoryNotFound(_)) => return Err(ParentNotFound(parent_id)),
                Err(e) => return Err(e),
            }
        };

        let entry: CategoryEntry = query_as(
            "INSERT INTO categories(id, name, parent_id, ancestors, tree_id, status) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id, name, parent_id, ancestors, tree_id, status, created_at, updated_at",
        )
        .bind(id.as_uuid())
        .bind(&new_category.name)
        .bind(placement.parent_id.map(|p| p.as_uuid()))
        .bind(uuids(&placement.ancestors))
        .bind(placement.tree_id.as_uuid())
        .bind(new_category.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("Unable to insert category")?;

        tx.commit().await.context("Unable to commit category")?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_category(&self, category_id: CategoryId) -> Result<Category, CategoryRepoError> {
        Self::find_category(&self.pool, category_id, false)
            .await?
            .ok_or(CategoryNotFound(category_id))
    }

    #[instrument(skip(self))]
    async fn get_roots(&self) -> Result<Vec<Category>, CategoryRepoError> {
        let entries: Vec<CategoryEntry> = query_as(&format!(
            "{} WHERE parent_id IS NULL ORDER BY name, id",
            SELECT_CATEGORIES
        ))
        .fetch_all(&self.pool)
        .await
        .context("Unable to get root categories")?;
        to_categories(entries)
    }

    #[instrument(skip(self))]
    async fn get_tree(&self, tree_id: CategoryId) -> Result<Vec<Category>, CategoryRepoError> {
        let entries: Vec<CategoryEntry> = query_as(&format!(
            "{} WHERE tree_id = $1 ORDER BY CARDINALITY(ancestors), name, id",
            SELECT_CATEGORIES
        ))
        .bind(tree_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get tree {}", tree_id))?;
        if entries.is_empty() {
            return Err(CategoryNotFound(tree_id));
        }
        to_categories(entries)
    }

    #[instrument(skip(self))]
    async fn get_children(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Category>, CategoryRepoError> {
        self.get_category(category_id).await?;
        let entries: Vec<CategoryEntry> = query_as(&format!(
            "{} WHERE parent_id = $1 ORDER BY name, id",
            SELECT_CATEGORIES
        ))
        .bind(category_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get children of {}", category_id))?;
        to_categories(entries)
    }

    #[instrument(skip(self))]
    async fn get_descendants(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Category>, CategoryRepoError> {
        self.get_category(category_id).await?;
        let entries: Vec<CategoryEntry> = query_as(&format!(
            "{} WHERE ancestors @> ARRAY[$1]::UUID[] ORDER BY CARDINALITY(ancestors), name, id",
            SELECT_CATEGORIES
        ))
        .bind(category_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get descendants of {}", category_id))?;
        to_categories(entries)
    }

    #[instrument(skip(self))]
    async fn update_category(
        &self,
        category_id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, CategoryRepoError> {
        update.check_lengths()?;
        let entry: Option<CategoryEntry> = query_as(
            "UPDATE categories SET name = $1, status = $2, updated_at = NOW() WHERE id = $3 RETURNING id, name, parent_id, ancestors, tree_id, status, created_at, updated_at",
        )
        .bind(&update.name)
        .bind(update.status.as_str())
        .bind(category_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to update category {}", category_id))?;
        let entry = entry.ok_or(CategoryNotFound(category_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn move_category(
        &self,
        category_id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> Result<Category, CategoryRepoError> {
        let (mut tx, node, parent) = loop {
            let mut tx = self.pool.begin().await.context("Unable to start transaction")?;

            let seen_node = Self::find_category(&mut *tx, category_id, false)
                .await?
                .ok_or(CategoryNotFound(category_id))?;
            let seen_parent = match new_parent {
                Some(parent_id) => Some(
                    Self::find_category(&mut *tx, parent_id, false)
                        .await?
                        .ok_or(ParentNotFound(parent_id))?,
                ),
                None => None,
            };

            let mut tree_ids = vec![seen_node.tree_id];
            tree_ids.extend(seen_parent.iter().map(|p| p.tree_id));
            Self::lock_trees(&mut *tx, tree_ids).await?;

            let Some(node) =
                Self::find_in_locked_tree(&mut tx, category_id, seen_node.tree_id).await?
            else {
                info!("Category moved to another tree, retrying");
                continue;
            };
            let parent = match &seen_parent {
                Some(seen) => {
                    match Self::find_in_locked_tree(&mut tx, seen.id, seen.tree_id).await {
                        Ok(Some(parent)) => Some(parent),
                        Ok(None) => {
                            info!(parent_id = %seen.id, "Parent moved to another tree, retrying");
                            continue;
                        }
                        Err(CategoryNotFound(id)) => return Err(ParentNotFound(id)),
                        Err(e) => return Err(e),
                    }
                }
                None => None,
            };
            break (tx, node, parent);
        };
        let placement = move_placement(&node, parent.as_ref())?;

        // The subtree keeps everything from the moved node downwards and takes the new prefix.
        let result = query(
            "UPDATE categories SET ancestors = $1 || ancestors[ARRAY_POSITION(ancestors, $2):], tree_id = $3, updated_at = NOW() WHERE ancestors @> ARRAY[$2]::UUID[]",
        )
        .bind(uuids(&placement.ancestors))
        .bind(category_id.as_uuid())
        .bind(placement.tree_id.as_uuid())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Unable to move descendants of {}", category_id))?;
        info!(
            descendants = result.rows_affected(),
            "Rewrote ancestors of subtree"
        );

        let entry: CategoryEntry = query_as(
            "UPDATE categories SET parent_id = $1, ancestors = $2, tree_id = $3, updated_at = NOW() WHERE id = $4 RETURNING id, name, parent_id, ancestors, tree_id, status, created_at, updated_at",
        )
        .bind(placement.parent_id.map(|p| p.as_uuid()))
        .bind(uuids(&placement.ancestors))
        .bind(placement.tree_id.as_uuid())
        .bind(category_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Unable to move category {}", category_id))?;

        tx.commit().await.context("Unable to commit move")?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn delete_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Category, CategoryRepoError> {
        // descendants go with it through the parent_id foreign key
        let entry: Option<CategoryEntry> = query_as(
            "DELETE FROM categories WHERE id = $1 RETURNING id, name, parent_id, ancestors, tree_id, status, created_at, updated_at",
        )
        .bind(category_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to delete category {}", category_id))?;
        let entry = entry.ok_or(CategoryNotFound(category_id))?;
        Ok(entry.try_into()?)
    }
}
