//! # Storefront public API
//!
//! The `store_api` module exposes the programmatic API for the storefront. Each API is a thin struct over a database
//! backend, so clients pick only the functionality they need.
//!
//! * [`order_processor`] places orders atomically and retries lock conflicts.
//! * [`catalog_api`] manages users, products, stock levels and prices.
//! * [`reports_api`] provides read-only aggregate queries.
//! * [`backup_api`] writes and restores full copies of the store.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits that API needs.
//! [`SqliteDatabase`](crate::SqliteDatabase) implements all of them and is cheap to clone.
//!
//! ```rust,ignore
//! use storefront_engine::{db_types::*, OrderProcessor, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", PoolSettings::default()).await?;
//! let api = OrderProcessor::new(db);
//! let receipt = api.process_order(UserId(1), &[OrderLineRequest::new(ProductId(1), 3)]).await?;
//! ```

pub mod backup_api;
pub mod catalog_api;
pub mod errors;
pub mod order_objects;
pub mod order_processor;
pub mod reports_api;
