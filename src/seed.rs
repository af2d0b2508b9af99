//! Sample data for local development.

use rusqlite::Connection;

use crate::error::Result;
use crate::models::{Customer, Item, NewCustomer, NewItem, NewReview, Review};

const CUSTOMERS: &[&str] = &["Tal Yuri", "Raha Rosario", "Luca Mahan"];

const ITEMS: &[(&str, f64)] = &[
    ("Laptop Backpack", 49.99),
    ("Insulated Coffee Mug", 9.99),
    ("6 Foot HDMI Cable", 12.99),
];

/// (customer index, item index, comment)
const REVIEWS: &[(usize, usize, &str)] = &[
    (0, 0, "zipper broke the first week"),
    (1, 0, "love this backpack!"),
    (0, 1, "coffee stays hot for hours!"),
    (2, 2, "does what it says"),
];

/// Row counts inserted by `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub customers: usize,
    pub items: usize,
    pub reviews: usize,
}

/// Replace the contents of all three tables with the sample set
pub fn run(conn: &mut Connection) -> Result<SeedSummary> {
    let tx = conn.transaction()?;

    // Reviews go with their owners through the cascade.
    tx.execute("DELETE FROM customers", [])?;
    tx.execute("DELETE FROM items", [])?;
    log::info!("Cleared existing customers, items and reviews");

    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for name in CUSTOMERS {
        customers.push(Customer::create(&tx, &NewCustomer { name: name.to_string() })?);
    }

    let mut items = Vec::with_capacity(ITEMS.len());
    for (name, price) in ITEMS {
        items.push(Item::create(&tx, &NewItem { name: name.to_string(), price: *price })?);
    }

    for (customer, item, comment) in REVIEWS {
        Review::create(
            &tx,
            &NewReview {
                comment: comment.to_string(),
                customer_id: customers[*customer].id,
                item_id: items[*item].id,
            },
        )?;
    }

    tx.commit()?;

    let summary = SeedSummary {
        customers: customers.len(),
        items: items.len(),
        reviews: REVIEWS.len(),
    };
    log::info!(
        "Seeded {} customers, {} items, {} reviews",
        summary.customers,
        summary.items,
        summary.reviews
    );
    Ok(summary)
}
