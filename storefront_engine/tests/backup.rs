use storefront_engine::{
    db_types::{OrderLineRequest, UserRole},
    BackupApi,
    BackupApiError,
    CatalogApi,
    OrderProcessor,
};
use support::{add_buyer, add_product, new_store, snapshot, stock_of};

mod support;

#[tokio::test]
async fn backup_and_restore() {
    let db = new_store().await;
    let buyer = add_buyer(&db, "alice").await;
    let p = add_product(&db, "Widget", "Tools", 1000, 5).await;
    let catalog = CatalogApi::new(db.clone());
    catalog.assign_role(buyer, UserRole::Admin).await.unwrap();
    let orders = OrderProcessor::new(db.clone());
    orders.process_order(buyer, &[OrderLineRequest::new(p, 1)]).await.unwrap();
    let saved = snapshot(&db).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.bak");
    let api = BackupApi::new(db.clone());
    api.backup_to(&path).await.unwrap();
    assert!(path.exists());

    orders.process_order(buyer, &[OrderLineRequest::new(p, 3)]).await.unwrap();
    catalog.assign_role(buyer, UserRole::Guest).await.unwrap();
    assert_eq!(stock_of(&db, p).await, 1);

    // users, user_roles, products, orders, order_items and one audit entry
    let rows = api.restore_from(&path).await.unwrap();
    assert_eq!(rows, 6);
    assert_eq!(catalog.roles_for(buyer).await.unwrap(), vec![UserRole::Admin]);
    assert_eq!(snapshot(&db).await, saved);
    assert_eq!(stock_of(&db, p).await, 4);

    // The restored store keeps working
    orders.process_order(buyer, &[OrderLineRequest::new(p, 4)]).await.unwrap();
    assert_eq!(stock_of(&db, p).await, 0);
}

#[tokio::test]
async fn backups_never_overwrite() {
    let db = new_store().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.bak");
    std::fs::write(&path, b"precious").unwrap();
    let err = BackupApi::new(db).backup_to(&path).await.unwrap_err();
    assert!(matches!(err, BackupApiError::BackupExists(_)));
    assert_eq!(std::fs::read(&path).unwrap(), b"precious");
}

#[tokio::test]
async fn restoring_a_missing_backup() {
    let db = new_store().await;
    let dir = tempfile::tempdir().unwrap();
    let before = snapshot(&db).await;
    let err = BackupApi::new(db.clone()).restore_from(dir.path().join("nope.bak")).await.unwrap_err();
    assert!(matches!(err, BackupApiError::BackupNotFound(_)));
    assert_eq!(snapshot(&db).await, before);
}

#[tokio::test]
async fn optimizing_keeps_every_row() {
    let db = new_store().await;
    let buyer = add_buyer(&db, "alice").await;
    let p = add_product(&db, "Widget", "Tools", 1000, 5).await;
    OrderProcessor::new(db.clone()).process_order(buyer, &[OrderLineRequest::new(p, 2)]).await.unwrap();
    let before = snapshot(&db).await;

    let report = BackupApi::new(db.clone()).optimize().await.unwrap();
    assert!(!report.query_plan.is_empty());
    assert!(report.page_count_before > 0);
    assert!(report.page_count_after > 0);
    assert_eq!(snapshot(&db).await, before);
}
