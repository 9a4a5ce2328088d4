//! Walks through everything the store can do, against the configured database.
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use futures::future::join;
use log::*;
use storefront_engine::{
    db_types::{Cents, OrderLineRequest, Product, ProductId, UserRole, UserStatus},
    BackupApi,
    CatalogApi,
    OrderProcessor,
    ReportsApi,
    SqliteDatabase,
};

use crate::{config::StorefrontConfig, formatting::*, seed::seed_store};

fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "-".repeat(80));
}

async fn product_named(catalog: &CatalogApi<SqliteDatabase>, category: &str, name: &str) -> Result<Product> {
    catalog
        .products_in_category(category)
        .await?
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| anyhow!("The demo product {name} is missing. Run the showcase against a seeded store."))
}

pub async fn run_showcase(db: &SqliteDatabase, config: &StorefrontConfig, backup: Option<PathBuf>) -> Result<()> {
    let catalog = CatalogApi::new(db.clone());
    let reports = ReportsApi::new(db.clone());
    let orders = OrderProcessor::new(db.clone()).with_retry_policy(config.retry_policy());

    println!("{}", "=".repeat(80));
    println!("STOREFRONT SHOWCASE ({})", db.url());
    println!("{}", "=".repeat(80));

    if db.count_orders().await? == 0 {
        section("[0] Seeding the demo catalogue");
        let seeded = seed_store(db).await?;
        let (users, products) = (seeded.users.len(), seeded.products.len());
        println!("Created {users} users, {products} products and {} orders", seeded.orders);
    }

    section("[1] Selecting data");
    let active = reports.active_users(5).await?;
    println!("{}", format_users(&active));
    println!("{}", format_products(&catalog.products_in_stock(10, 5).await?));

    section("[2] Grouping data by category");
    println!("{}", format_category_stats(&reports.category_stats().await?));

    section("[3] Aggregates");
    println!("{}", format_sales_statistics(&reports.sales_statistics().await?));
    println!("{}", format_top_customers(&reports.top_customers(5).await?));
    let buyer = active.first().map(|u| u.id).ok_or_else(|| anyhow!("There are no active users"))?;
    if let Some(summary) = reports.user_order_summary(buyer).await? {
        println!("{}", format_user_summary(&summary));
    }

    section("[4] Atomic orders");
    let cable = product_named(&catalog, "Electronics", "USB-C Cable").await?;
    let pillow = product_named(&catalog, "Home", "Throw Pillow").await?;
    let receipt = orders.process_order(buyer, &[OrderLineRequest::new(cable.id, 2)]).await?;
    println!("✓ Order {} placed. Total {}", receipt.order_id, receipt.total);
    if let Some(details) = orders.order_details(receipt.order_id).await? {
        println!("{}", format_order_details(&details));
    }
    let before = catalog.product_by_id(cable.id).await?.map(|p| p.stock);
    let lines = [OrderLineRequest::new(cable.id, 1), OrderLineRequest::new(pillow.id, pillow.stock + 1)];
    match orders.process_order(buyer, &lines).await {
        Ok(receipt) => println!("✗ Order {} should have failed", receipt.order_id),
        Err(e) => println!("✓ Rejected: {e}"),
    }
    let after = catalog.product_by_id(cable.id).await?.map(|p| p.stock);
    println!("✓ {} stock before: {before:?}, after the rejected order: {after:?}", cable.name);
    if let Err(e) = orders.process_order(buyer, &[OrderLineRequest::new(ProductId(i64::MAX), 1)]).await {
        println!("✓ Rejected: {e}");
    }
    if let Err(e) = orders.process_order(buyer, &[]).await {
        println!("✓ Rejected: {e}");
    }

    section("[5] Two buyers, one unit");
    let balls = product_named(&catalog, "Sports", "Tennis Balls").await?;
    // Both buyers ask for the whole remaining stock
    let remaining = if balls.stock == 0 { catalog.restock(balls.id, 1).await? } else { balls.stock };
    debug!("🛍️ {} has {remaining} units left", balls.name);
    let rival = active.iter().map(|u| u.id).find(|id| *id != buyer).unwrap_or(buyer);
    let lines = [OrderLineRequest::new(balls.id, remaining)];
    let (a, b) = join(orders.process_order(buyer, &lines), orders.process_order(rival, &lines)).await;
    for (who, result) in [(buyer, a), (rival, b)] {
        match result {
            Ok(receipt) => println!("User {who}: order {} placed", receipt.order_id),
            Err(e) => println!("User {who}: {e}"),
        }
    }

    section("[6] Prices are captured at purchase time");
    let old_price = cable.price;
    let new_price = old_price.checked_mul(2).ok_or_else(|| anyhow!("{} is too expensive to double", cable.name))?;
    catalog.update_price(cable.id, new_price).await?;
    if let Some(details) = orders.order_details(receipt.order_id).await? {
        let paid = details.items.first().map(|i| i.price).unwrap_or(Cents::default());
        println!("✓ {} now costs {new_price}, order {} still shows {paid}", cable.name, receipt.order_id);
    }
    catalog.update_price(cable.id, old_price).await?;

    section("[7] Triggers and the audit log");
    catalog.set_user_status(rival, UserStatus::Suspended).await?;
    catalog.set_user_status(rival, UserStatus::Active).await?;
    println!("{}", format_audit_log(&reports.audit_log(6).await?));

    section("[8] Backups");
    let path = backup.unwrap_or_else(|| {
        PathBuf::from(format!("data/storefront_backup_{}.db", chrono::Utc::now().format("%Y%m%d%H%M%S")))
    });
    BackupApi::new(db.clone())
        .backup_to(&path)
        .await
        .with_context(|| format!("Could not back up to {}", path.display()))?;
    println!("✓ Backup written to {}", path.display());

    section("[9] Schema");
    println!("{}", format_schema(&reports.schema_objects().await?));

    section("[10] Roles and logins");
    catalog.assign_role(buyer, UserRole::Admin).await?;
    catalog.assign_role(rival, UserRole::User).await?;
    catalog.record_login(buyer).await?;
    for id in [buyer, rival] {
        let roles = catalog.roles_for(id).await?.iter().map(UserRole::to_string).collect::<Vec<_>>().join(", ");
        let last_login = catalog.user_by_id(id).await?.and_then(|u| u.last_login).map(|t| t.to_rfc2822());
        println!("User {id}: roles [{roles}], last login {}", last_login.as_deref().unwrap_or("never"));
    }

    section("[11] Optimisation");
    let report = BackupApi::new(db.clone()).optimize().await?;
    println!("{}", format_maintenance(&report));

    section("[12] Documentation");
    println!("{}", format_table_docs(&reports.table_documentation().await?));

    println!("{}", "=".repeat(80));
    Ok(())
}
