mod utils;

use expense_repo::category_repo::{
    Category, CategoryRepo, CategoryRepoError, CategoryUpdate, NewCategory,
};
use expense_repo::category_tree::{check_forest, TreeError};
use expense_repo::ids::CategoryId;
use expense_repo::status::RecordStatus;
use rstest::rstest;
use std::sync::Arc;
use utils::RepoType;
use uuid::Uuid;

/// Root name unique to one test run, so trees from other runs never get in the way
fn root_name(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

async fn create(repo: &Arc<dyn CategoryRepo>, name: &str, parent: Option<&Category>) -> Category {
    let new_category = match parent {
        Some(p) => NewCategory::child(name, p.id),
        None => NewCategory::root(name),
    };
    repo.create_category(new_category).await.unwrap()
}

/// Every node reachable from the given roots
async fn forest(repo: &Arc<dyn CategoryRepo>, roots: &[CategoryId]) -> Vec<Category> {
    let mut categories = Vec::new();
    for root in roots {
        categories.extend(repo.get_tree(*root).await.unwrap());
    }
    categories
}

fn names(categories: &[Category]) -> Vec<&str> {
    categories.iter().map(|c| c.name.as_str()).collect()
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_create_tree(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let root = create(&repo, &root_name("Food"), None).await;
    assert!(root.is_root());
    assert_eq!(root.tree_id, root.id);
    assert!(root.ancestors.is_empty());
    assert_eq!(root.status, RecordStatus::Active);

    let fruit = create(&repo, "Fruit", Some(&root)).await;
    let apples = create(&repo, "Apples", Some(&fruit)).await;
    assert_eq!(fruit.parent_id, Some(root.id));
    assert_eq!(fruit.ancestors, vec![root.id]);
    assert_eq!(apples.ancestors, vec![root.id, fruit.id]);
    assert_eq!(apples.tree_id, root.id);

    let stored = repo.get_category(apples.id).await.unwrap();
    assert_eq!(stored, apples);

    let tree = repo.get_tree(root.id).await.unwrap();
    assert_eq!(names(&tree), vec![root.name.as_str(), "Fruit", "Apples"]);
    check_forest(&tree).unwrap();

    let roots = repo.get_roots().await.unwrap();
    assert!(roots.iter().any(|c| c.id == root.id));
    assert!(roots.iter().all(|c| c.is_root()));

    repo.delete_category(root.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_unknown_parent(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };

    let parent_id = CategoryId::generate();
    let result = repos
        .category_repo
        .create_category(NewCategory::child("Orphan", parent_id))
        .await;
    assert!(matches!(result, Err(CategoryRepoError::ParentNotFound(id)) if id == parent_id));
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_children_and_descendants(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let root = create(&repo, &root_name("Home"), None).await;
    let kitchen = create(&repo, "Kitchen", Some(&root)).await;
    let garden = create(&repo, "Garden", Some(&root)).await;
    create(&repo, "Pans", Some(&kitchen)).await;
    create(&repo, "Knives", Some(&kitchen)).await;

    let children = repo.get_children(root.id).await.unwrap();
    assert_eq!(names(&children), vec!["Garden", "Kitchen"]);

    let descendants = repo.get_descendants(root.id).await.unwrap();
    assert_eq!(
        names(&descendants),
        vec!["Garden", "Kitchen", "Knives", "Pans"]
    );

    assert!(repo.get_children(garden.id).await.unwrap().is_empty());
    assert!(matches!(
        repo.get_descendants(CategoryId::generate()).await,
        Err(CategoryRepoError::CategoryNotFound(_))
    ));

    repo.delete_category(root.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_update_category(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let root = create(&repo, &root_name("Books"), None).await;
    let child = create(&repo, "Fiction", Some(&root)).await;

    let updated = repo
        .update_category(
            child.id,
            CategoryUpdate {
                name: "Novels".to_owned(),
                status: RecordStatus::Inactive,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Novels");
    assert_eq!(updated.status, RecordStatus::Inactive);
    assert_eq!(updated.ancestors, child.ancestors);
    assert_eq!(updated.parent_id, child.parent_id);

    let result = repo
        .update_category(
            CategoryId::generate(),
            CategoryUpdate {
                name: "Nothing".to_owned(),
                status: RecordStatus::Active,
            },
        )
        .await;
    assert!(matches!(result, Err(CategoryRepoError::CategoryNotFound(_))));

    repo.delete_category(root.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_move_subtree_within_tree(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let root = create(&repo, &root_name("Vehicles"), None).await;
    let cars = create(&repo, "Cars", Some(&root)).await;
    let bikes = create(&repo, "Bikes", Some(&root)).await;
    let electric = create(&repo, "Electric", Some(&cars)).await;
    let batteries = create(&repo, "Batteries", Some(&electric)).await;

    let moved = repo.move_category(electric.id, Some(bikes.id)).await.unwrap();
    assert_eq!(moved.parent_id, Some(bikes.id));
    assert_eq!(moved.ancestors, vec![root.id, bikes.id]);
    assert_eq!(moved.tree_id, root.id);

    let batteries = repo.get_category(batteries.id).await.unwrap();
    assert_eq!(batteries.ancestors, vec![root.id, bikes.id, electric.id]);

    assert!(repo.get_children(cars.id).await.unwrap().is_empty());
    check_forest(&forest(&repo, &[root.id]).await).unwrap();

    repo.delete_category(root.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_move_between_trees(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let first = create(&repo, &root_name("First"), None).await;
    let second = create(&repo, &root_name("Second"), None).await;
    let branch = create(&repo, "Branch", Some(&first)).await;
    let leaf = create(&repo, "Leaf", Some(&branch)).await;

    repo.move_category(branch.id, Some(second.id)).await.unwrap();

    let leaf = repo.get_category(leaf.id).await.unwrap();
    assert_eq!(leaf.tree_id, second.id);
    assert_eq!(leaf.ancestors, vec![second.id, branch.id]);
    assert_eq!(repo.get_tree(first.id).await.unwrap().len(), 1);
    assert_eq!(repo.get_tree(second.id).await.unwrap().len(), 3);
    check_forest(&forest(&repo, &[first.id, second.id]).await).unwrap();

    // a whole tree can be grafted under another one
    repo.move_category(second.id, Some(first.id)).await.unwrap();
    let tree = repo.get_tree(first.id).await.unwrap();
    assert_eq!(tree.len(), 4);
    let leaf = repo.get_category(leaf.id).await.unwrap();
    assert_eq!(leaf.ancestors, vec![first.id, second.id, branch.id]);
    assert!(matches!(
        repo.get_tree(second.id).await,
        Err(CategoryRepoError::CategoryNotFound(_))
    ));
    check_forest(&tree).unwrap();

    repo.delete_category(first.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_create_while_moving(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let first = create(&repo, &root_name("First"), None).await;
    let second = create(&repo, &root_name("Second"), None).await;
    let branch = create(&repo, "Branch", Some(&first)).await;
    let twig = create(&repo, "Twig", Some(&branch)).await;

    let creates: Vec<_> = (0..12)
        .map(|i| {
            let repo = repo.clone();
            actix_rt::spawn(async move {
                repo.create_category(NewCategory::child(&format!("Leaf {}", i), twig.id))
                    .await
            })
        })
        .collect();
    let moves: Vec<_> = (0..6)
        .map(|i| {
            let repo = repo.clone();
            let target = if i % 2 == 0 { second.id } else { first.id };
            actix_rt::spawn(async move { repo.move_category(branch.id, Some(target)).await })
        })
        .collect();

    for handle in creates {
        handle.await.unwrap().unwrap();
    }
    for handle in moves {
        handle.await.unwrap().unwrap();
    }

    let twig = repo.get_category(twig.id).await.unwrap();
    let leaves = repo.get_children(twig.id).await.unwrap();
    assert_eq!(leaves.len(), 12);
    let mut leaf_ancestors = twig.ancestors.clone();
    leaf_ancestors.push(twig.id);
    for leaf in &leaves {
        assert_eq!(leaf.tree_id, twig.tree_id);
        assert_eq!(leaf.ancestors, leaf_ancestors);
    }
    check_forest(&forest(&repo, &[first.id, second.id]).await).unwrap();

    repo.delete_category(first.id).await.unwrap();
    repo.delete_category(second.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_move_to_top_level(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let root = create(&repo, &root_name("Music"), None).await;
    let jazz = create(&repo, "Jazz", Some(&root)).await;
    let bebop = create(&repo, "Bebop", Some(&jazz)).await;

    let moved = repo.move_category(jazz.id, None).await.unwrap();
    assert!(moved.is_root());
    assert_eq!(moved.tree_id, jazz.id);
    assert!(moved.ancestors.is_empty());

    let bebop = repo.get_category(bebop.id).await.unwrap();
    assert_eq!(bebop.tree_id, jazz.id);
    assert_eq!(bebop.ancestors, vec![jazz.id]);
    check_forest(&forest(&repo, &[root.id, jazz.id]).await).unwrap();

    repo.delete_category(root.id).await.unwrap();
    repo.delete_category(jazz.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_invalid_moves(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let root = create(&repo, &root_name("Tools"), None).await;
    let child = create(&repo, "Saws", Some(&root)).await;
    let grandchild = create(&repo, "Hand saws", Some(&child)).await;

    let result = repo.move_category(child.id, Some(child.id)).await;
    assert!(matches!(
        result,
        Err(CategoryRepoError::InvalidTree(TreeError::MoveUnderSelf(_)))
    ));

    let result = repo.move_category(root.id, Some(grandchild.id)).await;
    assert!(matches!(
        result,
        Err(CategoryRepoError::InvalidTree(
            TreeError::MoveUnderDescendant { .. }
        ))
    ));

    let result = repo.move_category(child.id, Some(CategoryId::generate())).await;
    assert!(matches!(result, Err(CategoryRepoError::ParentNotFound(_))));

    // nothing changed
    let tree = repo.get_tree(root.id).await.unwrap();
    assert_eq!(tree.len(), 3);
    check_forest(&tree).unwrap();

    repo.delete_category(root.id).await.unwrap();
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_delete_subtree(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let repo = repos.category_repo;

    let root = create(&repo, &root_name("Clothes"), None).await;
    let shoes = create(&repo, "Shoes", Some(&root)).await;
    let boots = create(&repo, "Boots", Some(&shoes)).await;
    let hats = create(&repo, "Hats", Some(&root)).await;

    let deleted = repo.delete_category(shoes.id).await.unwrap();
    assert_eq!(deleted.id, shoes.id);
    assert!(matches!(
        repo.get_category(boots.id).await,
        Err(CategoryRepoError::CategoryNotFound(_))
    ));

    let tree = repo.get_tree(root.id).await.unwrap();
    assert_eq!(
        tree.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![root.id, hats.id]
    );
    check_forest(&tree).unwrap();

    repo.delete_category(root.id).await.unwrap();
    assert!(matches!(
        repo.delete_category(root.id).await,
        Err(CategoryRepoError::CategoryNotFound(_))
    ));
}
