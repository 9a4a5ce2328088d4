//! Storefront Engine
//!
//! The storefront engine keeps a small e-commerce store (users, products, orders, order items and an audit log) in an
//! embedded SQLite database, and places orders in a single atomic transaction.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). You should never need to access the database directly. Instead,
//!    use the public API. The exception is the data types used in the database. These are defined in the `db_types`
//!    module and are public.
//! 2. The storefront public API ([`mod@store_api`]). Backends implement the traits in [`mod@db::traits`] in order to
//!    act as a store for these APIs.
//!
//! An order either commits completely (order row, every line item, every stock decrement and its audit entry) or
//! leaves the store untouched. Stock never goes negative, even with many buyers racing for the last unit.
pub mod db;

pub mod db_types;
pub mod store_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{PoolSettings, SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{BackupManagement, CatalogManagement, OrderManagement, OrderReceipt, Reporting};
pub use store_api::{
    backup_api::BackupApi,
    catalog_api::CatalogApi,
    errors::{BackupApiError, CatalogApiError, OrderProcessorError, ReportsApiError},
    order_objects::{OrderDetails, RetryPolicy},
    order_processor::OrderProcessor,
    reports_api::ReportsApi,
};
