use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{collect_rows, Item, Review};
use crate::error::{Result, StoreError};

/// A row of `customers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

/// Fields needed to insert a customer
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
}

/// Partial update, as carried by a PATCH body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomerPatch {
    pub name: Option<String>,
}

impl Customer {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }

    pub fn create(conn: &Connection, new: &NewCustomer) -> Result<Self> {
        conn.execute("INSERT INTO customers (name) VALUES (?1)", params![new.name])
            .map_err(StoreError::from_write)?;
        let id = conn.last_insert_rowid();
        log::debug!("Created customer {}", id);
        Ok(Customer { id, name: new.name.clone() })
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let customer = conn
            .query_row("SELECT id, name FROM customers WHERE id = ?1", params![id], Self::from_row)
            .optional()?;
        Ok(customer)
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Self> {
        Self::find(conn, id)?.ok_or(StoreError::CustomerNotFound(id))
    }

    pub fn all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM customers ORDER BY id")?;
        let rows = stmt.query_map([], Self::from_row)?;
        collect_rows(rows)
    }

    pub fn apply(&mut self, patch: CustomerPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }

    /// Persist the current field values
    pub fn update(&self, conn: &Connection) -> Result<()> {
        let changed = conn
            .execute("UPDATE customers SET name = ?1 WHERE id = ?2", params![self.name, self.id])
            .map_err(StoreError::from_write)?;
        if changed == 0 {
            return Err(StoreError::CustomerNotFound(self.id));
        }
        Ok(())
    }

    /// Delete a customer and, through the cascade, all of their reviews.
    /// Returns false when no such customer existed.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let changed = conn
            .execute("DELETE FROM customers WHERE id = ?1", params![id])
            .map_err(StoreError::from_write)?;
        if changed > 0 {
            log::debug!("Deleted customer {} and their reviews", id);
        }
        Ok(changed > 0)
    }

    pub fn reviews(&self, conn: &Connection) -> Result<Vec<Review>> {
        Review::for_customer(conn, self.id)
    }

    /// Items reached through this customer's reviews, one per review in review order.
    pub fn items(&self, conn: &Connection) -> Result<Vec<Item>> {
        let mut stmt = conn.prepare(
            "SELECT items.id AS id, items.name AS name, items.price AS price
             FROM reviews
             JOIN items ON items.id = reviews.item_id
             WHERE reviews.customer_id = ?1
             ORDER BY reviews.id",
        )?;
        let rows = stmt.query_map(params![self.id], Item::from_row)?;
        collect_rows(rows)
    }

    /// Drop one of this customer's reviews; a review cannot outlive its place in the collection.
    pub fn remove_review(&self, conn: &Connection, review_id: i64) -> Result<()> {
        Review::delete_owned(conn, review_id, "customer_id", self.id)
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Customer {}, {}>", self.id, self.name)
    }
}
