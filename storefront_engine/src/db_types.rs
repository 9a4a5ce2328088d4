use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
pub use storefront_common::{Cents, Secret};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

macro_rules! id_type {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                s.strip_prefix('#')
                    .unwrap_or(s)
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| ConversionError(format!("Invalid {} id '{s}': {e}", $label)))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

id_type!(UserId, "user");
id_type!(ProductId, "product");
id_type!(OrderId, "order");

//--------------------------------------      UserStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
            UserStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            s => Err(ConversionError(format!("Invalid user status: {s}"))),
        }
    }
}

//--------------------------------------       UserRole        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
            UserRole::Guest => write!(f, "guest"),
        }
    }
}

impl FromStr for UserRole {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            s => Err(ConversionError(format!("Invalid user role: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order row exists but its transaction has not yet committed. Never visible to other readers.
    Pending,
    /// The order, its lines and the stock movements have been committed.
    Completed,
    /// The order was cancelled. Only present in imported or seeded history.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub status: UserStatus,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
    pub status: UserStatus,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, email: S, password: Secret<String>) -> Self {
        Self { username: username.into(), email: email.into(), password, status: UserStatus::Active }
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Cents,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Cents,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, category: S, price: Cents, stock: i64) -> Self {
        Self { name: name.into(), category: category.into(), price, stock }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Cents,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatusType,
}

/// A line item of a committed order. `price` is the unit price captured when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Cents,
}

impl OrderItem {
    pub fn line_total(&self) -> Cents {
        self.price * self.quantity
    }
}

/// One `{product, quantity}` pair of an order request, as supplied by the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl OrderLineRequest {
    pub fn new<P: Into<ProductId>>(product_id: P, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

/// Parses `product:quantity`, e.g. `12:3`.
impl FromStr for OrderLineRequest {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product, quantity) =
            s.split_once(':').ok_or_else(|| ConversionError(format!("Expected product:quantity, got '{s}'")))?;
        let product_id = product.parse::<ProductId>()?;
        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|e| ConversionError(format!("Invalid quantity '{quantity}': {e}")))?;
        Ok(Self { product_id, quantity })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid order request: {0}")]
pub struct InvalidOrderRequest(pub String);

/// Checks the shape of an order request. This never touches storage.
pub fn validate_order_lines(lines: &[OrderLineRequest]) -> Result<(), InvalidOrderRequest> {
    if lines.is_empty() {
        return Err(InvalidOrderRequest("an order must contain at least one line".to_string()));
    }
    if let Some(line) = lines.iter().find(|l| l.quantity <= 0) {
        return Err(InvalidOrderRequest(format!(
            "quantity for product {} must be a positive integer, got {}",
            line.product_id, line.quantity
        )));
    }
    Ok(())
}

/// A line whose stock has been claimed inside an open order transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimedLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Cents,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    pub user_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    pub statuses: Vec<OrderStatusType>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_product_id(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.product_id.is_none() && self.statuses.is_empty()
    }
}

//--------------------------------------      AuditEntry       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub table_name: String,
    pub action: String,
    pub user_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub table_name: String,
    pub action: String,
    pub user_id: Option<i64>,
    pub details: serde_json::Value,
}

impl NewAuditEntry {
    pub fn new<S: Into<String>>(table_name: S, action: S, user_id: Option<i64>, details: serde_json::Value) -> Self {
        Self { table_name: table_name.into(), action: action.into(), user_id, details }
    }
}

//--------------------------------------       Reports         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub product_count: i64,
    pub avg_price: Cents,
    pub min_price: Cents,
    pub max_price: Cents,
    pub total_stock: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SalesStatistics {
    pub total_orders: i64,
    pub unique_customers: i64,
    pub total_revenue: Cents,
    pub avg_order_value: Cents,
    pub min_order: Cents,
    pub max_order: Cents,
    pub completed_orders: i64,
    pub pending_orders: i64,
    pub cancelled_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserOrderSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent: Cents,
    pub avg_order_value: Cents,
    pub last_order_date: Option<DateTime<Utc>>,
    pub unique_products_purchased: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TopCustomer {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SchemaObject {
    #[sqlx(rename = "type")]
    pub kind: String,
    pub name: String,
    pub table_name: String,
    pub sql: Option<String>,
}

/// One column of a table, as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[sqlx(rename = "type")]
    pub data_type: String,
    #[sqlx(rename = "notnull")]
    pub not_null: bool,
    #[sqlx(rename = "dflt_value")]
    pub default_value: Option<String>,
    /// 1-based position in the primary key, or 0 if the column is not part of it.
    #[sqlx(rename = "pk")]
    pub primary_key: i64,
}

impl ColumnInfo {
    pub fn is_primary_key(&self) -> bool {
        self.primary_key > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDocumentation {
    pub name: String,
    pub row_count: i64,
    pub columns: Vec<ColumnInfo>,
}

/// The outcome of a maintenance pass: `ANALYZE`, a query plan for the per-user order count, then `VACUUM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub query_plan: Vec<String>,
    pub page_count_before: i64,
    pub page_count_after: i64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_order_line() {
        let line = "12:3".parse::<OrderLineRequest>().unwrap();
        assert_eq!(line, OrderLineRequest::new(ProductId(12), 3));
        let line = "#4: 1".parse::<OrderLineRequest>().unwrap();
        assert_eq!(line, OrderLineRequest::new(ProductId(4), 1));
        // Non-positive quantities parse; they are rejected when the order is processed.
        assert_eq!("4:-1".parse::<OrderLineRequest>().unwrap().quantity, -1);
        assert!("4".parse::<OrderLineRequest>().is_err());
        assert!("x:1".parse::<OrderLineRequest>().is_err());
    }

    #[test]
    fn order_line_validation() {
        let line = |product, quantity| OrderLineRequest::new(ProductId(product), quantity);
        assert!(validate_order_lines(&[]).is_err());
        assert!(validate_order_lines(&[line(1, 2), line(2, 0)]).is_err());
        assert!(validate_order_lines(&[line(1, -3)]).is_err());
        assert!(validate_order_lines(&[line(1, 2), line(1, 1)]).is_ok());
    }

    #[test]
    fn statuses_round_trip_through_text() {
        for status in [OrderStatusType::Pending, OrderStatusType::Completed, OrderStatusType::Cancelled] {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert_eq!("Suspended".parse::<UserStatus>().unwrap(), UserStatus::Suspended);
        assert_eq!(UserStatus::default(), UserStatus::Active);
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("root".parse::<UserRole>().is_err());
        assert_eq!(OrderStatusType::from("bogus".to_string()), OrderStatusType::Pending);
    }

    #[test]
    fn empty_filter() {
        assert!(OrderQueryFilter::default().is_empty());
        assert!(!OrderQueryFilter::default().with_status(OrderStatusType::Completed).is_empty());
        assert!(!OrderQueryFilter::default().with_user_id(UserId(3)).is_empty());
    }

    #[test]
    fn line_totals() {
        let item = OrderItem {
            id: 1,
            order_id: OrderId(1),
            product_id: ProductId(2),
            quantity: 3,
            price: Cents::from(1000),
        };
        assert_eq!(item.line_total(), Cents::from(3000));
        assert_eq!(ProductId(7).to_string(), "#7");
    }
}
