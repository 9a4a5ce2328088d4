//! Users and the product catalogue.

use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::CatalogManagement,
    db_types::{Cents, NewProduct, NewUser, Product, ProductId, User, UserId, UserRole, UserStatus},
    store_api::errors::CatalogApiError,
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

fn db_error<E: std::error::Error>(e: E) -> CatalogApiError {
    CatalogApiError::DatabaseError(e.to_string())
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new user. The password is stored as a SHA-256 digest.
    pub async fn create_user(&self, user: NewUser) -> Result<UserId, CatalogApiError> {
        let username = user.username.clone();
        let id = self.db.create_user(user).await.map_err(db_error)?;
        debug!("👤️ Created user {username} with id {id}");
        Ok(id)
    }

    pub async fn user_by_id(&self, user_id: UserId) -> Result<Option<User>, CatalogApiError> {
        self.db.fetch_user(user_id).await.map_err(db_error)
    }

    pub async fn set_user_status(&self, user_id: UserId, status: UserStatus) -> Result<(), CatalogApiError> {
        if self.db.set_user_status(user_id, status).await.map_err(db_error)? {
            info!("👤️ User {user_id} is now {status}");
            Ok(())
        } else {
            Err(CatalogApiError::UserNotFound(user_id))
        }
    }

    pub async fn record_login(&self, user_id: UserId) -> Result<(), CatalogApiError> {
        if self.db.record_login(user_id).await.map_err(db_error)? {
            trace!("👤️ User {user_id} logged in");
            Ok(())
        } else {
            Err(CatalogApiError::UserNotFound(user_id))
        }
    }

    /// Grants `role` to an existing user. Granting a role twice has no further effect.
    pub async fn assign_role(&self, user_id: UserId, role: UserRole) -> Result<(), CatalogApiError> {
        if self.db.fetch_user(user_id).await.map_err(db_error)?.is_none() {
            return Err(CatalogApiError::UserNotFound(user_id));
        }
        self.db.assign_role(user_id, role).await.map_err(db_error)?;
        info!("👤️ User {user_id} granted role {role}");
        Ok(())
    }

    pub async fn roles_for(&self, user_id: UserId) -> Result<Vec<UserRole>, CatalogApiError> {
        self.db.fetch_roles(user_id).await.map_err(db_error)
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<ProductId, CatalogApiError> {
        if product.name.trim().is_empty() {
            return Err(CatalogApiError::InvalidProduct("the product name is empty".to_string()));
        }
        if product.price.is_negative() {
            return Err(CatalogApiError::InvalidPrice(product.price));
        }
        if product.stock < 0 {
            let reason = format!("initial stock cannot be negative, got {}", product.stock);
            return Err(CatalogApiError::InvalidProduct(reason));
        }
        let name = product.name.clone();
        let id = self.db.add_product(product).await.map_err(db_error)?;
        debug!("🛒️ Added product {name} with id {id}");
        Ok(id)
    }

    pub async fn product_by_id(&self, product_id: ProductId) -> Result<Option<Product>, CatalogApiError> {
        self.db.fetch_product(product_id).await.map_err(db_error)
    }

    pub async fn products_in_category(&self, category: &str) -> Result<Vec<Product>, CatalogApiError> {
        self.db.products_in_category(category).await.map_err(db_error)
    }

    pub async fn products_in_stock(&self, min_stock: i64, limit: i64) -> Result<Vec<Product>, CatalogApiError> {
        self.db.products_in_stock(min_stock, limit).await.map_err(db_error)
    }

    /// Adds `quantity` units to a product's stock and returns the new stock level.
    ///
    /// The stock count is an `i64`. A restock that would push it past `i64::MAX` fails and leaves the stock unchanged.
    pub async fn restock(&self, product_id: ProductId, quantity: i64) -> Result<i64, CatalogApiError> {
        if quantity <= 0 {
            return Err(CatalogApiError::InvalidQuantity(quantity));
        }
        let product = self
            .db
            .fetch_product(product_id)
            .await
            .map_err(db_error)?
            .ok_or(CatalogApiError::ProductNotFound(product_id))?;
        if product.stock.checked_add(quantity).is_none() {
            return Err(CatalogApiError::StockOverflow { product_id, quantity });
        }
        let stock = self
            .db
            .restock(product_id, quantity)
            .await
            .map_err(db_error)?
            .ok_or(CatalogApiError::ProductNotFound(product_id))?;
        info!("🛒️ Restocked product {product_id} with {quantity} units. Stock is now {stock}");
        Ok(stock)
    }

    /// Changes the list price of a product. Order items already placed keep the price they were bought at.
    pub async fn update_price(&self, product_id: ProductId, price: Cents) -> Result<(), CatalogApiError> {
        if price.is_negative() {
            return Err(CatalogApiError::InvalidPrice(price));
        }
        if self.db.update_price(product_id, price).await.map_err(db_error)? {
            info!("🛒️ Product {product_id} now costs {price}");
            Ok(())
        } else {
            Err(CatalogApiError::ProductNotFound(product_id))
        }
    }
}
