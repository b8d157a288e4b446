mod utils;

use expense_repo::migration::migrations;
use expense_repo::sqlx_repo::{create_pool, SQLxMigrator};
use sqlx::{Pool, Postgres};
use std::sync::{Mutex, MutexGuard};

static SCRATCH_DATABASE: Mutex<()> = Mutex::new(());

/// Tests in this file rebuild the scratch database from nothing, so they take turns.
fn scratch_database() -> MutexGuard<'static, ()> {
    SCRATCH_DATABASE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Columns, column order, constraints and indexes of every table in the public schema,
/// migrations_history excluded
async fn schema(pool: &Pool<Postgres>) -> Vec<String> {
    let mut columns: Vec<(String, String, String, String, Option<String>)> = sqlx::query_as(
        "SELECT table_name::TEXT, column_name::TEXT, data_type::TEXT, is_nullable::TEXT, column_default::TEXT \
         FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name <> 'migrations_history'",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    columns.sort();

    // relative order, since dropped columns leave gaps in ordinal_position
    let mut column_orders: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name::TEXT, STRING_AGG(column_name::TEXT, ',' ORDER BY ordinal_position) \
         FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name <> 'migrations_history' \
         GROUP BY table_name",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    column_orders.sort();

    let mut constraints: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT conrelid::REGCLASS::TEXT, conname::TEXT, pg_get_constraintdef(oid) \
         FROM pg_constraint \
         WHERE connamespace = 'public'::REGNAMESPACE AND conrelid::REGCLASS::TEXT <> 'migrations_history'",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    constraints.sort();

    let mut indexes: Vec<(String, String)> = sqlx::query_as(
        "SELECT tablename::TEXT, indexdef::TEXT FROM pg_indexes \
         WHERE schemaname = 'public' AND tablename <> 'migrations_history'",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    indexes.sort();

    columns
        .into_iter()
        .map(|(t, c, d, n, default)| format!("{t}.{c} {d} nullable={n} default={default:?}"))
        .chain(
            column_orders
                .into_iter()
                .map(|(t, order)| format!("{t} columns: {order}")),
        )
        .chain(
            constraints
                .into_iter()
                .map(|(t, name, def)| format!("{t} constraint {name}: {def}")),
        )
        .chain(indexes.into_iter().map(|(t, i)| format!("{t}: {i}")))
        .collect()
}

fn without_column_order(schema: &[String], table: &str) -> Vec<String> {
    let order = format!("{table} columns: ");
    schema
        .iter()
        .filter(|line| !line.starts_with(&order))
        .cloned()
        .collect()
}

#[actix_rt::test]
async fn test_migrations_round_trip() {
    let Some(config) = utils::test_config() else {
        return;
    };
    let Some(database_url) = config.migration_database_url else {
        return;
    };
    let _guard = scratch_database();
    let pool = create_pool(&database_url, 5).await.unwrap();
    let migrator = SQLxMigrator::new(pool.clone());
    let count = migrations().len();

    // start from an empty schema
    let applied = migrator.status().await.unwrap();
    let applied = applied.iter().filter(|s| s.applied.is_some()).count();
    migrator.revert(applied).await.unwrap();
    assert!(schema(&pool).await.is_empty());

    let done = migrator.run_pending(Some(count - 1)).await.unwrap();
    assert_eq!(done.len(), count - 1);
    let created_nested = schema(&pool).await;
    let parent_fkey = created_nested
        .iter()
        .find(|c| c.starts_with("categories constraint categories_parent_id_fkey: "))
        .unwrap();
    assert!(parent_fkey.contains("ON DELETE CASCADE"));
    assert!(parent_fkey.contains("ON UPDATE CASCADE"));
    assert!(created_nested
        .iter()
        .any(|c| c.starts_with("promotions constraint promotions_schedule_check: ")));

    let done = migrator.run_pending(None).await.unwrap();
    assert_eq!(done.len(), 1);
    assert!(migrator
        .status()
        .await
        .unwrap()
        .iter()
        .all(|s| s.applied.as_ref().is_some_and(|r| r.success)));
    let full = schema(&pool).await;
    assert!(full.iter().any(|c| c.starts_with("categories.ancestors ")));
    assert!(!full.iter().any(|c| c.starts_with("categories.lft ")));

    // nothing left to do
    assert!(migrator.run_pending(None).await.unwrap().is_empty());

    // every single step can be undone and redone
    for steps in 1..=count {
        let reverted = migrator.revert(steps).await.unwrap();
        assert_eq!(reverted.len(), steps);
        let redone = migrator.run_pending(None).await.unwrap();
        assert_eq!(redone.len(), steps);
        assert_eq!(schema(&pool).await, full, "{} steps", steps);
    }

    // the nested set layout comes back when the tree conversion is reverted
    migrator.revert(1).await.unwrap();
    let nested = schema(&pool).await;
    assert!(nested.iter().any(|c| c.starts_with("categories.lft ")));
    assert!(!nested.iter().any(|c| c.starts_with("categories.ancestors ")));
    // columns cannot be added in place, so only the position of lft and rgt differs
    assert_eq!(
        without_column_order(&nested, "categories"),
        without_column_order(&created_nested, "categories")
    );
    assert!(nested
        .iter()
        .any(|c| c == "categories columns: id,name,parent_id,status,created_at,updated_at,lft,rgt"));

    migrator.revert(count - 1).await.unwrap();
    assert!(schema(&pool).await.is_empty());
}

#[actix_rt::test]
async fn test_tree_conversion_keeps_hierarchy() {
    let Some(config) = utils::test_config() else {
        return;
    };
    let Some(database_url) = config.migration_database_url else {
        return;
    };
    let _guard = scratch_database();
    let pool = create_pool(&database_url, 5).await.unwrap();
    let migrator = SQLxMigrator::new(pool.clone());
    let count = migrations().len();

    let applied = migrator.status().await.unwrap();
    let applied = applied.iter().filter(|s| s.applied.is_some()).count();
    migrator.revert(applied).await.unwrap();
    migrator.run_pending(Some(count - 1)).await.unwrap();

    // root(1,6) > child(2,5) > grandchild(3,4)
    sqlx::query(
        "INSERT INTO categories(id, name, parent_id, lft, rgt) VALUES \
         ('00000000-0000-0000-0000-000000000001', 'root', NULL, 1, 6), \
         ('00000000-0000-0000-0000-000000000002', 'child', '00000000-0000-0000-0000-000000000001', 2, 5), \
         ('00000000-0000-0000-0000-000000000003', 'grandchild', '00000000-0000-0000-0000-000000000002', 3, 4)",
    )
    .execute(&pool)
    .await
    .unwrap();

    migrator.run_pending(None).await.unwrap();
    let rows: Vec<(String, i32, uuid::Uuid)> = sqlx::query_as(
        "SELECT name, CARDINALITY(ancestors), tree_id FROM categories ORDER BY CARDINALITY(ancestors)",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let root = uuid::Uuid::from_u128(1);
    assert_eq!(
        rows,
        vec![
            ("root".to_owned(), 0, root),
            ("child".to_owned(), 1, root),
            ("grandchild".to_owned(), 2, root),
        ]
    );

    migrator.revert(1).await.unwrap();
    let rows: Vec<(String, i32, i32)> =
        sqlx::query_as("SELECT name, lft, rgt FROM categories ORDER BY lft")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![
            ("root".to_owned(), 1, 6),
            ("child".to_owned(), 2, 5),
            ("grandchild".to_owned(), 3, 4),
        ]
    );

    migrator.revert(count - 1).await.unwrap();
}

#[actix_rt::test]
async fn test_migrations_on_single_connection() {
    let Some(config) = utils::test_config() else {
        return;
    };
    let Some(database_url) = config.migration_database_url else {
        return;
    };
    let _guard = scratch_database();
    let pool = create_pool(&database_url, 1).await.unwrap();
    let migrator = SQLxMigrator::new(pool);
    let count = migrations().len();

    let applied = migrator.status().await.unwrap();
    let applied = applied.iter().filter(|s| s.applied.is_some()).count();
    migrator.revert(applied).await.unwrap();

    assert_eq!(migrator.run_pending(None).await.unwrap().len(), count);
    assert!(migrator
        .status()
        .await
        .unwrap()
        .iter()
        .all(|s| s.applied.is_some()));
    assert_eq!(migrator.revert(count).await.unwrap().len(), count);
}
