//! Tree-shaped views of the record graph for JSON output.
//!
//! Customers and items reference each other through reviews, so a naive
//! recursive dump never terminates. Each view below expands exactly one hop
//! and renders the record on the far side flat:
//!
//! - a customer's reviews carry their `item`, never their `customer`
//! - an item's reviews carry their `customer`, never their `item`
//! - a review carries both ends, without either end's review list

use rusqlite::{params, Connection, Row};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{collect_rows, Customer, Item, Review};

/// A customer with their reviews
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTree {
    pub id: i64,
    pub name: String,
    pub reviews: Vec<CustomerReview>,
}

/// A review as seen from its customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerReview {
    pub id: i64,
    pub comment: String,
    pub customer_id: i64,
    pub item_id: i64,
    pub item: Item,
}

/// An item with its reviews
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTree {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub reviews: Vec<ItemReview>,
}

/// A review as seen from its item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReview {
    pub id: i64,
    pub comment: String,
    pub customer_id: i64,
    pub item_id: i64,
    pub customer: Customer,
}

/// A review with both of its owners
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewTree {
    pub id: i64,
    pub comment: String,
    pub customer_id: i64,
    pub item_id: i64,
    pub customer: Customer,
    pub item: Item,
}

fn customer_review_from_row(row: &Row<'_>) -> rusqlite::Result<CustomerReview> {
    let item_id: i64 = row.get("item_id")?;
    Ok(CustomerReview {
        id: row.get("id")?,
        comment: row.get("comment")?,
        customer_id: row.get("customer_id")?,
        item_id,
        item: Item {
            id: item_id,
            name: row.get("item_name")?,
            price: row.get("item_price")?,
        },
    })
}

fn item_review_from_row(row: &Row<'_>) -> rusqlite::Result<ItemReview> {
    let customer_id: i64 = row.get("customer_id")?;
    Ok(ItemReview {
        id: row.get("id")?,
        comment: row.get("comment")?,
        customer_id,
        item_id: row.get("item_id")?,
        customer: Customer {
            id: customer_id,
            name: row.get("customer_name")?,
        },
    })
}

fn build_customer_tree(conn: &Connection, customer: Customer) -> Result<CustomerTree> {
    let mut stmt = conn.prepare(
        "SELECT r.id AS id, r.comment AS comment, r.customer_id AS customer_id, r.item_id AS item_id,
                i.name AS item_name, i.price AS item_price
         FROM reviews r
         JOIN items i ON i.id = r.item_id
         WHERE r.customer_id = ?1
         ORDER BY r.id",
    )?;
    let reviews = collect_rows(stmt.query_map(params![customer.id], customer_review_from_row)?)?;
    Ok(CustomerTree {
        id: customer.id,
        name: customer.name,
        reviews,
    })
}

fn build_item_tree(conn: &Connection, item: Item) -> Result<ItemTree> {
    let mut stmt = conn.prepare(
        "SELECT r.id AS id, r.comment AS comment, r.customer_id AS customer_id, r.item_id AS item_id,
                c.name AS customer_name
         FROM reviews r
         JOIN customers c ON c.id = r.customer_id
         WHERE r.item_id = ?1
         ORDER BY r.id",
    )?;
    let reviews = collect_rows(stmt.query_map(params![item.id], item_review_from_row)?)?;
    Ok(ItemTree {
        id: item.id,
        name: item.name,
        price: item.price,
        reviews,
    })
}

fn build_review_tree(conn: &Connection, review: Review) -> Result<ReviewTree> {
    let customer = review.customer(conn)?;
    let item = review.item(conn)?;
    Ok(ReviewTree {
        id: review.id,
        comment: review.comment,
        customer_id: review.customer_id,
        item_id: review.item_id,
        customer,
        item,
    })
}

pub fn customer_tree(conn: &Connection, id: i64) -> Result<CustomerTree> {
    build_customer_tree(conn, Customer::get(conn, id)?)
}

pub fn customer_trees(conn: &Connection) -> Result<Vec<CustomerTree>> {
    Customer::all(conn)?
        .into_iter()
        .map(|c| build_customer_tree(conn, c))
        .collect()
}

pub fn item_tree(conn: &Connection, id: i64) -> Result<ItemTree> {
    build_item_tree(conn, Item::get(conn, id)?)
}

pub fn item_trees(conn: &Connection) -> Result<Vec<ItemTree>> {
    Item::all(conn)?
        .into_iter()
        .map(|i| build_item_tree(conn, i))
        .collect()
}

pub fn review_tree(conn: &Connection, id: i64) -> Result<ReviewTree> {
    build_review_tree(conn, Review::get(conn, id)?)
}

pub fn review_trees(conn: &Connection) -> Result<Vec<ReviewTree>> {
    Review::all(conn)?
        .into_iter()
        .map(|r| build_review_tree(conn, r))
        .collect()
}

pub fn to_value<T: Serialize>(view: &T) -> Result<Value> {
    Ok(serde_json::to_value(view)?)
}

/// Pretty-printed JSON
pub fn to_json<T: Serialize>(view: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(view)?)
}

/// Keep only the named fields. Dotted paths reach into nested objects and
/// through arrays, so `["name", "reviews.item.name"]` on a customer tree
/// keeps the customer name and the name of each reviewed item. A path that
/// runs past a scalar selects nothing.
pub fn only(value: &Value, fields: &[&str]) -> Value {
    let paths: Vec<Vec<&str>> = fields
        .iter()
        .map(|f| f.split('.').filter(|s| !s.is_empty()).collect::<Vec<_>>())
        .filter(|p| !p.is_empty())
        .collect();
    let slices: Vec<&[&str]> = paths.iter().map(Vec::as_slice).collect();
    project(value, &slices).unwrap_or_else(|| match value {
        Value::Array(_) => Value::Array(Vec::new()),
        Value::Object(_) => Value::Object(Map::new()),
        _ => Value::Null,
    })
}

// None when nothing under `value` matches: a scalar can't satisfy a path
// that still has segments left, and an object with no surviving keys is
// dropped from its parent.
fn project(value: &Value, paths: &[&[&str]]) -> Option<Value> {
    match value {
        Value::Array(elements) => {
            let kept: Vec<Value> = elements.iter().filter_map(|v| project(v, paths)).collect();
            if kept.is_empty() && !elements.is_empty() {
                None
            } else {
                Some(Value::Array(kept))
            }
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                let matching: Vec<&[&str]> = paths
                    .iter()
                    .filter(|p| p[0] == key.as_str())
                    .map(|p| &p[1..])
                    .collect();
                if matching.is_empty() {
                    continue;
                }
                if matching.iter().any(|rest| rest.is_empty()) {
                    out.insert(key.clone(), child.clone());
                } else if let Some(projected) = project(child, &matching) {
                    out.insert(key.clone(), projected);
                }
            }
            if out.is_empty() {
                None
            } else {
                Some(Value::Object(out))
            }
        }
        _ => None,
    }
}
