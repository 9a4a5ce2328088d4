use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::*;
use serde_json::Value;
use storefront_engine::{
    db_types::{Cents, OrderId, OrderLineRequest, ProductId, UserId, UserRole},
    BackupApi,
    CatalogApi,
    OrderProcessor,
    ReportsApi,
    SqliteDatabase,
};

mod config;
mod formatting;
mod seed;
mod showcase;

use crate::{config::StorefrontConfig, formatting::*, seed::seed_store, showcase::run_showcase};

#[derive(Parser, Debug)]
#[command(version, about = "Place orders and query an embedded storefront database")]
pub struct Arguments {
    /// The database url. Overrides STOREFRONT_DATABASE_URL
    #[arg(short = 'd', long = "database")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "init", about = "Create the database and bring its schema up to date")]
    Init,
    #[clap(name = "seed", about = "Fill an empty store with the demo catalogue")]
    Seed,
    #[clap(name = "order", about = "Place an order. All lines succeed together or the order is rejected")]
    Order(OrderParams),
    #[clap(name = "restock", about = "Add stock to a product")]
    Restock(RestockParams),
    #[clap(name = "price", about = "Change the list price of a product")]
    Price(PriceParams),
    #[clap(name = "role", about = "Grant a role (admin, user or guest) to a user")]
    Role {
        #[arg(short = 'u', long = "user")]
        user: UserId,
        #[arg(short = 'r', long = "role")]
        role: UserRole,
    },
    #[clap(name = "report")]
    Report(ReportParams),
    #[clap(name = "optimize", about = "Refresh planner statistics and compact the database file")]
    Optimize,
    #[clap(name = "backup", about = "Write a copy of the database to a new file")]
    Backup { path: PathBuf },
    #[clap(name = "restore", about = "Replace the store's contents with those of a backup")]
    Restore { path: PathBuf },
    #[clap(name = "showcase", about = "Run through every feature against the configured database")]
    Showcase {
        /// Where to write the showcase backup. Defaults to a timestamped file under data/
        #[arg(short = 'b', long = "backup")]
        backup: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct OrderParams {
    /// The buyer's user id
    #[arg(short = 'u', long = "user")]
    user: UserId,
    /// An order line as product:quantity, e.g. 3:2. Repeat for more lines
    #[arg(short = 'i', long = "item", required = true)]
    items: Vec<OrderLineRequest>,
}

#[derive(Debug, Args)]
pub struct RestockParams {
    #[arg(short = 'p', long = "product")]
    product: ProductId,
    #[arg(short = 'q', long = "quantity")]
    quantity: i64,
}

#[derive(Debug, Args)]
pub struct PriceParams {
    #[arg(short = 'p', long = "product")]
    product: ProductId,
    /// The new price, e.g. 12.99
    #[arg(short = 'a', long = "amount")]
    price: Cents,
}

#[derive(Debug, Args)]
pub struct ReportParams {
    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    kind: ReportKind,
}

#[derive(Debug, Subcommand)]
pub enum ReportKind {
    /// Active users
    Users {
        #[arg(short = 'l', long = "limit", default_value = "20")]
        limit: i64,
    },
    /// Products in a category, or all products holding more than `min-stock` units
    Products {
        #[arg(short = 'c', long = "category")]
        category: Option<String>,
        #[arg(short = 'm', long = "min-stock", default_value = "0")]
        min_stock: i64,
        #[arg(short = 'l', long = "limit", default_value = "50")]
        limit: i64,
    },
    /// Price and stock statistics per category
    Categories,
    /// Order totals across the whole store
    Sales,
    /// Active users ranked by completed spend
    TopCustomers {
        #[arg(short = 'l', long = "limit", default_value = "10")]
        limit: i64,
    },
    /// One user's order history
    User { id: UserId },
    /// One order and its lines
    Order { id: OrderId },
    /// The most recent audit entries
    Audit {
        #[arg(short = 'l', long = "limit", default_value = "20")]
        limit: i64,
    },
    /// Tables, indexes, views and triggers
    Schema,
    /// Columns and row counts of every table
    Docs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let config = StorefrontConfig::from_env_or_default().with_database_url(cli.database_url);
    let db = connect(&config).await?;
    match cli.command {
        Command::Init => {
            let objects = ReportsApi::new(db.clone()).schema_objects().await?;
            println!("Database {} is ready. {} schema objects.", db.url(), objects.len());
        },
        Command::Seed => {
            let seeded = seed_store(&db).await?;
            let (users, products) = (seeded.users.len(), seeded.products.len());
            println!("Seeded {users} users, {products} products and {} orders", seeded.orders);
        },
        Command::Order(params) => place_order(&db, &config, params).await?,
        Command::Restock(params) => {
            let stock = CatalogApi::new(db.clone()).restock(params.product, params.quantity).await?;
            println!("Product {} now has {stock} units in stock", params.product);
        },
        Command::Price(params) => {
            CatalogApi::new(db.clone()).update_price(params.product, params.price).await?;
            println!("Product {} now costs {}", params.product, params.price);
        },
        Command::Role { user, role } => {
            let catalog = CatalogApi::new(db.clone());
            catalog.assign_role(user, role).await?;
            let roles = catalog.roles_for(user).await?.iter().map(UserRole::to_string).collect::<Vec<_>>();
            println!("User {user} now has roles: {}", roles.join(", "));
        },
        Command::Report(params) => print_report(&db, params).await?,
        Command::Optimize => {
            let report = BackupApi::new(db.clone()).optimize().await?;
            println!("{}", format_maintenance(&report));
        },
        Command::Backup { path } => {
            BackupApi::new(db.clone()).backup_to(&path).await?;
            println!("Backup written to {}", path.display());
        },
        Command::Restore { path } => {
            let rows = BackupApi::new(db.clone()).restore_from(&path).await?;
            println!("Restored {rows} rows from {}", path.display());
        },
        Command::Showcase { backup } => run_showcase(&db, &config, backup).await?,
    }
    Ok(())
}

/// Opens the pool and brings the schema up to date. The parent directory of a file database is created if needed.
async fn connect(config: &StorefrontConfig) -> Result<SqliteDatabase> {
    if config.create_db {
        if let Some(parent) = database_dir(&config.database_url) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create the database directory {}", parent.display()))?;
        }
    }
    let db = SqliteDatabase::new_with_url(&config.database_url, config.pool_settings())
        .await
        .with_context(|| format!("Could not open the database at {}", config.database_url))?;
    db.migrate().await.context("Could not migrate the database")?;
    Ok(db)
}

fn database_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

async fn place_order(db: &SqliteDatabase, config: &StorefrontConfig, params: OrderParams) -> Result<()> {
    let api = OrderProcessor::new(db.clone()).with_retry_policy(config.retry_policy());
    let receipt = api
        .process_order(params.user, &params.items)
        .await
        .with_context(|| format!("The order for user {} was not placed", params.user))?;
    match api.order_details(receipt.order_id).await? {
        Some(details) => println!("{}", format_order_details(&details)),
        None => warn!("🛍️ Order {} was placed but could not be read back", receipt.order_id),
    }
    Ok(())
}

async fn print_report(db: &SqliteDatabase, params: ReportParams) -> Result<()> {
    let api = ReportsApi::new(db.clone());
    let (table, json): (String, Value) = match params.kind {
        ReportKind::Users { limit } => {
            let users = api.active_users(limit).await?;
            (format_users(&users), serde_json::to_value(&users)?)
        },
        ReportKind::Products { category, min_stock, limit } => {
            let catalog = CatalogApi::new(db.clone());
            let products = match category {
                Some(category) => catalog.products_in_category(&category).await?,
                None => catalog.products_in_stock(min_stock, limit).await?,
            };
            (format_products(&products), serde_json::to_value(&products)?)
        },
        ReportKind::Categories => {
            let stats = api.category_stats().await?;
            (format_category_stats(&stats), serde_json::to_value(&stats)?)
        },
        ReportKind::Sales => {
            let stats = api.sales_statistics().await?;
            (format_sales_statistics(&stats), serde_json::to_value(&stats)?)
        },
        ReportKind::TopCustomers { limit } => {
            let customers = api.top_customers(limit).await?;
            (format_top_customers(&customers), serde_json::to_value(&customers)?)
        },
        ReportKind::User { id } => {
            let summary = api.user_order_summary(id).await?.with_context(|| format!("User {id} does not exist"))?;
            (format_user_summary(&summary), serde_json::to_value(&summary)?)
        },
        ReportKind::Order { id } => {
            let details = OrderProcessor::new(db.clone())
                .order_details(id)
                .await?
                .with_context(|| format!("Order {id} does not exist"))?;
            (format_order_details(&details), serde_json::to_value(&details)?)
        },
        ReportKind::Audit { limit } => {
            let entries = api.audit_log(limit).await?;
            (format_audit_log(&entries), serde_json::to_value(&entries)?)
        },
        ReportKind::Schema => {
            let objects = api.schema_objects().await?;
            (format_schema(&objects), serde_json::to_value(&objects)?)
        },
        ReportKind::Docs => {
            let tables = api.table_documentation().await?;
            (format_table_docs(&tables), serde_json::to_value(&tables)?)
        },
    };
    if params.json {
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{table}");
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn database_directories() {
        assert_eq!(database_dir("sqlite://data/storefront.db"), Some(Path::new("data")));
        assert_eq!(database_dir("sqlite:///tmp/x/store.db?mode=rwc"), Some(Path::new("/tmp/x")));
        assert_eq!(database_dir("sqlite://store.db"), None);
        assert_eq!(database_dir("sqlite::memory:"), None);
        assert_eq!(database_dir("postgres://localhost/db"), None);
    }

    #[test]
    fn order_arguments() {
        let args = Arguments::try_parse_from(["storefront", "order", "-u", "1", "-i", "3:2", "--item", "4:1"]).unwrap();
        match args.command {
            Command::Order(params) => {
                assert_eq!(params.user, UserId(1));
                let expected = vec![OrderLineRequest::new(ProductId(3), 2), OrderLineRequest::new(ProductId(4), 1)];
                assert_eq!(params.items, expected);
            },
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Arguments::try_parse_from(["storefront", "order", "-u", "1"]).is_err());
    }

    #[test]
    fn report_arguments() {
        let argv = ["storefront", "-d", "sqlite://x.db", "report", "top-customers", "--json"];
        let args = Arguments::try_parse_from(argv).unwrap();
        assert_eq!(args.database_url.as_deref(), Some("sqlite://x.db"));
        match args.command {
            Command::Report(ReportParams { json, kind: ReportKind::TopCustomers { limit } }) => {
                assert!(json);
                assert_eq!(limit, 10);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn role_arguments() {
        let args = Arguments::try_parse_from(["storefront", "role", "-u", "2", "--role", "Admin"]).unwrap();
        match args.command {
            Command::Role { user, role } => {
                assert_eq!(user, UserId(2));
                assert_eq!(role, UserRole::Admin);
            },
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Arguments::try_parse_from(["storefront", "role", "-u", "2", "-r", "root"]).is_err());
        let args = Arguments::try_parse_from(["storefront", "report", "docs", "--json"]).unwrap();
        assert!(matches!(args.command, Command::Report(ReportParams { json: true, kind: ReportKind::Docs })));
    }
}
