use blogstore::{Article, Config, Database, DbError, SortField, TimeMs};
use tempfile::TempDir;

async fn setup_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let mut db = Database::new(&Config::new(db_path, 1));
    db.open().await.expect("open failed");
    (db, temp_dir)
}

#[tokio::test]
async fn test_list_page_on_fresh_database_is_empty() {
    let (mut db, _temp) = setup_test_db().await;

    let page = db
        .articles()
        .unwrap()
        .list_page(SortField::Date, true, 0, 10)
        .await
        .expect("list_page failed");
    assert!(page.is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_insert_then_get_by_id() {
    let (mut db, _temp) = setup_test_db().await;
    let repo = db.articles().unwrap();

    let draft = Article::new("Hello", "<h1>Hello</h1><p>world</p>", TimeMs::new(1_400_000_000_000));
    let saved = repo.save(&draft).await.unwrap().expect("insert returns article");

    let id = saved.id().expect("saved article has an id");
    assert_eq!(saved, draft.clone().with_id(id));

    let loaded = repo.get_by_id(id).await.unwrap().expect("article exists");
    assert_eq!(loaded.title(), draft.title());
    assert_eq!(loaded.content(), draft.content());
    assert_eq!(loaded.date(), draft.date());

    db.close().await;
}

#[tokio::test]
async fn test_inserts_get_distinct_ids() {
    let (mut db, _temp) = setup_test_db().await;
    let repo = db.articles().unwrap();

    let a = repo.save(&Article::new("a", "", TimeMs::new(1))).await.unwrap().unwrap();
    let b = repo.save(&Article::new("b", "", TimeMs::new(2))).await.unwrap().unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(repo.count().await.unwrap(), 2);

    db.close().await;
}

#[tokio::test]
async fn test_update_existing_article() {
    let (mut db, _temp) = setup_test_db().await;
    let repo = db.articles().unwrap();

    let saved = repo
        .save(&Article::new("Draft", "tbd", TimeMs::new(10)))
        .await
        .unwrap()
        .unwrap();
    let id = saved.id().unwrap();

    let edited = Article::new("Final", "done", TimeMs::new(20)).with_id(id);
    let result = repo.save(&edited).await.unwrap();
    assert_eq!(result, Some(edited.clone()));

    let loaded = repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(loaded, edited);
    assert_eq!(repo.count().await.unwrap(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_update_missing_id_is_noop() {
    let (mut db, _temp) = setup_test_db().await;
    let repo = db.articles().unwrap();

    let existing = repo
        .save(&Article::new("Keep", "me", TimeMs::new(1)))
        .await
        .unwrap()
        .unwrap();

    let ghost = Article::new("Ghost", "boo", TimeMs::new(2)).with_id(9999);
    let result = repo.save(&ghost).await.expect("save should not error");
    assert_eq!(result, None);

    assert_eq!(repo.get_by_id(9999).await.unwrap(), None);
    let all = repo.list_page(SortField::Id, true, 0, 10).await.unwrap();
    assert_eq!(all, vec![existing]);

    db.close().await;
}

#[tokio::test]
async fn test_get_by_unknown_id_is_none() {
    let (mut db, _temp) = setup_test_db().await;

    let result = db.articles().unwrap().get_by_id(42).await;
    assert!(matches!(result, Ok(None)));

    db.close().await;
}

#[tokio::test]
async fn test_list_page_orders_by_date() {
    let (mut db, _temp) = setup_test_db().await;
    let repo = db.articles().unwrap();

    // Inserted out of order so id order differs from date order.
    for (title, date) in [("middle", 2_000), ("oldest", 1_000), ("newest", 3_000)] {
        repo.save(&Article::new(title, "", TimeMs::new(date)))
            .await
            .unwrap();
    }

    let sort: SortField = "date".parse().unwrap();

    let asc = repo.list_page(sort, true, 0, 2).await.unwrap();
    let titles: Vec<_> = asc.iter().map(|a| a.title()).collect();
    assert_eq!(titles, vec!["oldest", "middle"]);

    let desc = repo.list_page(sort, false, 0, 2).await.unwrap();
    let titles: Vec<_> = desc.iter().map(|a| a.title()).collect();
    assert_eq!(titles, vec!["newest", "middle"]);

    db.close().await;
}

#[tokio::test]
async fn test_concurrent_saves_all_persist() {
    let (mut db, _temp) = setup_test_db().await;
    let repo = db.articles().unwrap();

    let drafts: Vec<_> = (0..8)
        .map(|i| Article::new(format!("post {}", i), "", TimeMs::new(i)))
        .collect();
    let saved = futures::future::try_join_all(drafts.iter().map(|a| repo.save(a)))
        .await
        .unwrap();

    assert!(saved.iter().all(|a| a.as_ref().and_then(|a| a.id()).is_some()));
    assert_eq!(repo.count().await.unwrap(), 8);

    db.close().await;
}

#[tokio::test]
async fn test_operations_after_close_fail_with_not_open() {
    let (mut db, _temp) = setup_test_db().await;
    db.close().await;

    assert!(matches!(db.articles(), Err(DbError::NotOpen)));
}
