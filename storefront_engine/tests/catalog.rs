use sqlx::{Connection, SqliteConnection};
use storefront_engine::{
    db_types::{Cents, NewProduct, NewUser, ProductId, Secret, UserId, UserRole, UserStatus},
    CatalogApi,
    CatalogApiError,
    CatalogManagement,
    Reporting,
    SqliteDatabaseError,
};
use support::{add_buyer, add_product, new_store, stock_of};

mod support;

#[tokio::test]
async fn users_store_a_password_digest() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let id = api.create_user(NewUser::new("carol", "carol@example.com", Secret::from("password"))).await.unwrap();
    let user = api.user_by_id(id).await.unwrap().expect("user exists");
    assert_eq!(user.username, "carol");
    assert_eq!(user.status, UserStatus::Active);
    assert_eq!(user.password_hash, "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8");
    assert!(api.user_by_id(UserId(77)).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    add_buyer(&db, "dave").await;
    let err = api.create_user(NewUser::new("dave", "other@example.com", Secret::from("pw"))).await.unwrap_err();
    assert!(matches!(err, CatalogApiError::DatabaseError(_)));
}

#[tokio::test]
async fn status_changes_are_audited() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let id = add_buyer(&db, "erin").await;
    api.set_user_status(id, UserStatus::Suspended).await.unwrap();
    // Setting the same status again is not a change
    api.set_user_status(id, UserStatus::Suspended).await.unwrap();

    let log = db.audit_log(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].table_name, "users");
    assert_eq!(log[0].action, "UPDATE");
    assert_eq!(log[0].user_id, Some(id.value()));
    let details: serde_json::Value = serde_json::from_str(log[0].details.as_deref().unwrap()).unwrap();
    assert_eq!(details["old_status"], "active");
    assert_eq!(details["new_status"], "suspended");

    let err = api.set_user_status(UserId(999), UserStatus::Inactive).await.unwrap_err();
    assert!(matches!(err, CatalogApiError::UserNotFound(UserId(999))));
}

#[tokio::test]
async fn restocking() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let p = add_product(&db, "Widget", "Tools", 1000, 2).await;
    assert_eq!(api.restock(p, 5).await.unwrap(), 7);
    assert!(matches!(api.restock(p, 0).await.unwrap_err(), CatalogApiError::InvalidQuantity(0)));
    assert!(matches!(api.restock(p, -1).await.unwrap_err(), CatalogApiError::InvalidQuantity(-1)));
    assert!(matches!(api.restock(ProductId(404), 1).await.unwrap_err(), CatalogApiError::ProductNotFound(_)));
    assert_eq!(api.product_by_id(p).await.unwrap().unwrap().stock, 7);
}

#[tokio::test]
async fn pricing() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let p = add_product(&db, "Widget", "Tools", 1000, 2).await;
    api.update_price(p, Cents::from(1250)).await.unwrap();
    assert_eq!(api.product_by_id(p).await.unwrap().unwrap().price, Cents::from(1250));
    assert!(matches!(api.update_price(p, Cents::from(-1)).await.unwrap_err(), CatalogApiError::InvalidPrice(_)));
    assert!(matches!(
        api.update_price(ProductId(404), Cents::from(1)).await.unwrap_err(),
        CatalogApiError::ProductNotFound(_)
    ));
    let bad = NewProduct::new("Freebie", "Toys", Cents::from(-5), 1);
    assert!(matches!(api.add_product(bad).await.unwrap_err(), CatalogApiError::InvalidPrice(_)));
    let bad = NewProduct::new(" ", "Toys", Cents::from(5), 1);
    assert!(matches!(api.add_product(bad).await.unwrap_err(), CatalogApiError::InvalidProduct(_)));
}

#[tokio::test]
async fn product_queries() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let hammer = add_product(&db, "Hammer", "Tools", 1500, 10).await;
    let _ = add_product(&db, "Teddy", "Toys", 900, 0).await;
    let saw = add_product(&db, "Saw", "Tools", 2500, 3).await;

    let tools = api.products_in_category("Tools").await.unwrap();
    assert_eq!(tools.iter().map(|p| p.id).collect::<Vec<_>>(), vec![hammer, saw]);
    let in_stock = api.products_in_stock(5, 10).await.unwrap();
    assert_eq!(in_stock.iter().map(|p| p.id).collect::<Vec<_>>(), vec![hammer]);
    assert_eq!(api.products_in_stock(0, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn restock_cannot_overflow_the_stock_count() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let p = add_product(&db, "Widget", "Tools", 1000, 5).await;

    let err = api.restock(p, i64::MAX).await.unwrap_err();
    assert!(matches!(err, CatalogApiError::StockOverflow { quantity: i64::MAX, .. }), "{err:?}");
    // The storage layer refuses the update on its own as well
    let err = db.restock(p, i64::MAX).await.unwrap_err();
    assert!(matches!(err, SqliteDatabaseError::StockOverflow { .. }), "{err:?}");
    assert_eq!(db.restock(ProductId(404), i64::MAX).await.unwrap(), None);

    let product = api.product_by_id(p).await.unwrap().expect("product is still readable");
    assert_eq!(product.stock, 5);
    let kind = sqlx::query_scalar::<_, String>("SELECT typeof(stock) FROM products WHERE id = $1")
        .bind(p)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(kind, "integer");

    assert_eq!(api.restock(p, i64::MAX - 5).await.unwrap(), i64::MAX);
    assert!(matches!(api.restock(p, 1).await.unwrap_err(), CatalogApiError::StockOverflow { .. }));
    assert_eq!(stock_of(&db, p).await, i64::MAX);
}

async fn stock(id: ProductId, conn: &mut SqliteConnection) -> Option<i64> {
    sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
        .expect("Error reading stock")
}

#[tokio::test]
async fn catalogue_writes_are_visible_to_other_connections() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let mut other = SqliteConnection::connect(db.url()).await.unwrap();

    let p = add_product(&db, "Widget", "Tools", 1000, 5).await;
    assert_eq!(stock(p, &mut other).await, Some(5));
    assert_eq!(api.restock(p, 10).await.unwrap(), 15);
    assert_eq!(stock(p, &mut other).await, Some(15));

    let id = add_buyer(&db, "frank").await;
    let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(id)
        .fetch_one(&mut other)
        .await
        .unwrap();
    assert_eq!(users, 1);
    other.close().await.unwrap();
}

#[tokio::test]
async fn roles_and_logins() {
    let db = new_store().await;
    let api = CatalogApi::new(db.clone());
    let id = add_buyer(&db, "grace").await;
    assert_eq!(api.user_by_id(id).await.unwrap().unwrap().last_login, None);
    api.record_login(id).await.unwrap();
    assert!(api.user_by_id(id).await.unwrap().unwrap().last_login.is_some());
    assert!(matches!(api.record_login(UserId(999)).await.unwrap_err(), CatalogApiError::UserNotFound(_)));

    assert!(api.roles_for(id).await.unwrap().is_empty());
    api.assign_role(id, UserRole::User).await.unwrap();
    api.assign_role(id, UserRole::Admin).await.unwrap();
    api.assign_role(id, UserRole::Admin).await.unwrap();
    assert_eq!(api.roles_for(id).await.unwrap(), vec![UserRole::Admin, UserRole::User]);
    let err = api.assign_role(UserId(999), UserRole::Guest).await.unwrap_err();
    assert!(matches!(err, CatalogApiError::UserNotFound(UserId(999))));

    // The CHECK constraint rejects roles outside admin, user and guest
    let bad = sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, 'root')")
        .bind(id)
        .execute(db.pool())
        .await;
    assert!(bad.is_err());
}
