use crate::db_types::{Cents, NewProduct, NewUser, Product, ProductId, User, UserId, UserRole, UserStatus};

/// Users and the product catalogue.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    type Error: std::error::Error;

    /// Creates a user. Only a digest of the password is stored.
    async fn create_user(&self, user: NewUser) -> Result<UserId, Self::Error>;

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, Self::Error>;

    /// Returns `false` if the user does not exist.
    async fn set_user_status(&self, user_id: UserId, status: UserStatus) -> Result<bool, Self::Error>;

    /// Stamps the user's last login time. Returns `false` if the user does not exist.
    async fn record_login(&self, user_id: UserId) -> Result<bool, Self::Error>;

    async fn assign_role(&self, user_id: UserId, role: UserRole) -> Result<(), Self::Error>;

    async fn fetch_roles(&self, user_id: UserId) -> Result<Vec<UserRole>, Self::Error>;

    async fn add_product(&self, product: NewProduct) -> Result<ProductId, Self::Error>;

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, Self::Error>;

    async fn products_in_category(&self, category: &str) -> Result<Vec<Product>, Self::Error>;

    /// Up to `limit` products holding more than `min_stock` units.
    async fn products_in_stock(&self, min_stock: i64, limit: i64) -> Result<Vec<Product>, Self::Error>;

    /// Adds stock and returns the new level, or `None` if the product does not exist.
    async fn restock(&self, product_id: ProductId, quantity: i64) -> Result<Option<i64>, Self::Error>;

    /// Returns `false` if the product does not exist.
    async fn update_price(&self, product_id: ProductId, price: Cents) -> Result<bool, Self::Error>;
}
