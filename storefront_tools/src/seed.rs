//! A fixed demo catalogue, so that every run of the showcase prints the same numbers.
use anyhow::{Context, Result};
use log::*;
use storefront_engine::{
    db_types::{Cents, NewProduct, NewUser, OrderLineRequest, ProductId, Secret, UserId, UserStatus},
    CatalogApi,
    OrderProcessor,
    SqliteDatabase,
};

const USERS: [(&str, &str, UserStatus); 6] = [
    ("alice", "alice@example.com", UserStatus::Active),
    ("bob", "bob@example.com", UserStatus::Active),
    ("carol", "carol@example.com", UserStatus::Active),
    ("dave", "dave@example.com", UserStatus::Inactive),
    ("erin", "erin@example.com", UserStatus::Active),
    ("frank", "frank@example.com", UserStatus::Suspended),
];

/// name, category, price in cents, stock
const PRODUCTS: [(&str, &str, i64, i64); 10] = [
    ("Laptop", "Electronics", 129_900, 10),
    ("Headphones", "Electronics", 19_950, 25),
    ("USB-C Cable", "Electronics", 1_299, 100),
    ("Desk Lamp", "Home", 3_450, 15),
    ("Coffee Mug", "Home", 1_200, 40),
    ("Throw Pillow", "Home", 2_500, 0),
    ("Rust in Action", "Books", 4_999, 12),
    ("The Pragmatic Programmer", "Books", 3_995, 8),
    ("Yoga Mat", "Sports", 2_999, 20),
    ("Tennis Balls", "Sports", 899, 1),
];

/// buyer index, then (product index, quantity) lines
const ORDERS: [(usize, &[(usize, i64)]); 5] = [
    (0, &[(0, 1), (2, 2)]),
    (1, &[(1, 1)]),
    (0, &[(6, 1), (7, 1)]),
    (2, &[(3, 2), (4, 4)]),
    (4, &[(8, 1)]),
];

#[derive(Debug, Default)]
pub struct SeededStore {
    pub users: Vec<UserId>,
    pub products: Vec<ProductId>,
    pub orders: usize,
}

/// Fills an empty store with the demo users, products and a handful of orders.
pub async fn seed_store(db: &SqliteDatabase) -> Result<SeededStore> {
    let catalog = CatalogApi::new(db.clone());
    let mut seeded = SeededStore::default();
    for (username, email, status) in USERS {
        let user = NewUser::new(username, email, Secret::from("changeme")).with_status(status);
        let id = catalog
            .create_user(user)
            .await
            .with_context(|| format!("Could not create demo user {username}. Has the store already been seeded?"))?;
        seeded.users.push(id);
    }
    for (name, category, price, stock) in PRODUCTS {
        let id = catalog
            .add_product(NewProduct::new(name, category, Cents::from(price), stock))
            .await
            .with_context(|| format!("Could not add demo product {name}"))?;
        seeded.products.push(id);
    }
    let orders = OrderProcessor::new(db.clone());
    for (buyer, lines) in ORDERS {
        let lines = lines.iter().map(|&(p, q)| OrderLineRequest::new(seeded.products[p], q)).collect::<Vec<_>>();
        orders.process_order(seeded.users[buyer], &lines).await.context("Could not place demo order")?;
        seeded.orders += 1;
    }
    info!(
        "🌱️ Seeded {} users, {} products and {} orders",
        seeded.users.len(),
        seeded.products.len(),
        seeded.orders
    );
    Ok(seeded)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn demo_orders_fit_the_catalogue() {
        for (buyer, lines) in ORDERS {
            assert!(buyer < USERS.len());
            assert_eq!(USERS[buyer].2, UserStatus::Active);
            for &(product, quantity) in lines {
                assert!(quantity > 0);
                assert!(quantity <= PRODUCTS[product].3, "demo order exceeds stock of {}", PRODUCTS[product].0);
            }
        }
    }
}
