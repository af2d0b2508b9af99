use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{collect_rows, Customer, Item};
use crate::error::{Result, StoreError};

/// A row of `reviews`: one customer's comment on one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub comment: String,
    pub customer_id: i64,
    pub item_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub comment: String,
    pub customer_id: i64,
    pub item_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewPatch {
    pub comment: Option<String>,
    pub customer_id: Option<i64>,
    pub item_id: Option<i64>,
}

const SELECT_REVIEWS: &str = "SELECT id, comment, customer_id, item_id FROM reviews";

impl Review {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Review {
            id: row.get("id")?,
            comment: row.get("comment")?,
            customer_id: row.get("customer_id")?,
            item_id: row.get("item_id")?,
        })
    }

    /// Insert a review. Fails with `StoreError::Constraint` when the customer
    /// or item does not exist.
    pub fn create(conn: &Connection, new: &NewReview) -> Result<Self> {
        conn.execute(
            "INSERT INTO reviews (comment, customer_id, item_id) VALUES (?1, ?2, ?3)",
            params![new.comment, new.customer_id, new.item_id],
        )
        .map_err(StoreError::from_write)?;
        let id = conn.last_insert_rowid();
        log::debug!("Created review {} (customer {}, item {})", id, new.customer_id, new.item_id);
        Ok(Review {
            id,
            comment: new.comment.clone(),
            customer_id: new.customer_id,
            item_id: new.item_id,
        })
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let review = conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_REVIEWS), params![id], Self::from_row)
            .optional()?;
        Ok(review)
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Self> {
        Self::find(conn, id)?.ok_or(StoreError::ReviewNotFound(id))
    }

    pub fn all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_REVIEWS))?;
        let rows = stmt.query_map([], Self::from_row)?;
        collect_rows(rows)
    }

    pub fn for_customer(conn: &Connection, customer_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("{} WHERE customer_id = ?1 ORDER BY id", SELECT_REVIEWS))?;
        let rows = stmt.query_map(params![customer_id], Self::from_row)?;
        collect_rows(rows)
    }

    pub fn for_item(conn: &Connection, item_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("{} WHERE item_id = ?1 ORDER BY id", SELECT_REVIEWS))?;
        let rows = stmt.query_map(params![item_id], Self::from_row)?;
        collect_rows(rows)
    }

    pub fn apply(&mut self, patch: ReviewPatch) {
        if let Some(comment) = patch.comment {
            self.comment = comment;
        }
        if let Some(customer_id) = patch.customer_id {
            self.customer_id = customer_id;
        }
        if let Some(item_id) = patch.item_id {
            self.item_id = item_id;
        }
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        let changed = conn
            .execute(
                "UPDATE reviews SET comment = ?1, customer_id = ?2, item_id = ?3 WHERE id = ?4",
                params![self.comment, self.customer_id, self.item_id, self.id],
            )
            .map_err(StoreError::from_write)?;
        if changed == 0 {
            return Err(StoreError::ReviewNotFound(self.id));
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let changed = conn
            .execute("DELETE FROM reviews WHERE id = ?1", params![id])
            .map_err(StoreError::from_write)?;
        Ok(changed > 0)
    }

    pub fn customer(&self, conn: &Connection) -> Result<Customer> {
        Customer::get(conn, self.customer_id)
    }

    pub fn item(&self, conn: &Connection) -> Result<Item> {
        Item::get(conn, self.item_id)
    }

    /// Delete `review_id` only if `owner_column` on it equals `owner_id`.
    /// `owner_column` is one of the two foreign key columns, never caller input.
    pub(crate) fn delete_owned(
        conn: &Connection,
        review_id: i64,
        owner_column: &'static str,
        owner_id: i64,
    ) -> Result<()> {
        debug_assert!(owner_column == "customer_id" || owner_column == "item_id");
        let changed = conn
            .execute(
                &format!("DELETE FROM reviews WHERE id = ?1 AND {} = ?2", owner_column),
                params![review_id, owner_id],
            )
            .map_err(StoreError::from_write)?;
        if changed > 0 {
            log::debug!("Removed review {} from {} {}", review_id, owner_column, owner_id);
            return Ok(());
        }

        match Self::find(conn, review_id)? {
            None => Err(StoreError::ReviewNotFound(review_id)),
            Some(review) => Err(StoreError::InvalidInput(format!(
                "review {} does not belong to {} {} (found customer {}, item {})",
                review_id, owner_column, owner_id, review.customer_id, review.item_id
            ))),
        }
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Review {}, {}>", self.id, self.comment)
    }
}
