//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the storefront database *backends*.
//!
//! ## Orders
//! An order is created in a single atomic unit of work together with its line items and the stock movements it causes.
//! The [`OrderManagement`] trait exposes that unit of work, plus queries over committed orders.
//!
//! ## Traits
//! * [`OrderManagement`] defines atomic order placement and order queries.
//! * [`CatalogManagement`] manages users and the product catalogue (restocking, re-pricing).
//! * [`Reporting`] provides the read-only aggregate queries.
//! * [`BackupManagement`] writes and restores full copies of the store, and runs housekeeping.
mod backup_management;
mod catalog_management;
mod order_management;
mod reporting;

mod data_objects;

pub use backup_management::BackupManagement;
pub use catalog_management::CatalogManagement;
pub use data_objects::OrderReceipt;
pub use order_management::OrderManagement;
pub use reporting::Reporting;
