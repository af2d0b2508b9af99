use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{collect_rows, Review};
use crate::error::{Result, StoreError};

/// A row of `items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
}

// SQLite turns NaN into NULL, which would fail the NOT NULL column with a
// less useful message.
fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() {
        return Err(StoreError::InvalidInput(format!(
            "price must be a finite number, got {}",
            price
        )));
    }
    Ok(())
}

impl Item {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Item {
            id: row.get("id")?,
            name: row.get("name")?,
            price: row.get("price")?,
        })
    }

    pub fn create(conn: &Connection, new: &NewItem) -> Result<Self> {
        check_price(new.price)?;
        conn.execute(
            "INSERT INTO items (name, price) VALUES (?1, ?2)",
            params![new.name, new.price],
        )
        .map_err(StoreError::from_write)?;
        let id = conn.last_insert_rowid();
        log::debug!("Created item {}", id);
        Ok(Item { id, name: new.name.clone(), price: new.price })
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let item = conn
            .query_row("SELECT id, name, price FROM items WHERE id = ?1", params![id], Self::from_row)
            .optional()?;
        Ok(item)
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Self> {
        Self::find(conn, id)?.ok_or(StoreError::ItemNotFound(id))
    }

    pub fn all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name, price FROM items ORDER BY id")?;
        let rows = stmt.query_map([], Self::from_row)?;
        collect_rows(rows)
    }

    pub fn apply(&mut self, patch: ItemPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        check_price(self.price)?;
        let changed = conn
            .execute(
                "UPDATE items SET name = ?1, price = ?2 WHERE id = ?3",
                params![self.name, self.price, self.id],
            )
            .map_err(StoreError::from_write)?;
        if changed == 0 {
            return Err(StoreError::ItemNotFound(self.id));
        }
        Ok(())
    }

    /// Delete an item together with every review of it
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let changed = conn
            .execute("DELETE FROM items WHERE id = ?1", params![id])
            .map_err(StoreError::from_write)?;
        if changed > 0 {
            log::debug!("Deleted item {} and its reviews", id);
        }
        Ok(changed > 0)
    }

    pub fn reviews(&self, conn: &Connection) -> Result<Vec<Review>> {
        Review::for_item(conn, self.id)
    }

    pub fn remove_review(&self, conn: &Connection, review_id: i64) -> Result<()> {
        Review::delete_owned(conn, review_id, "item_id", self.id)
    }
}

/// Shortest round-trip form with a trailing ".0" on whole values, switching
/// to `1e+16` / `1e-07` style exponents outside [1e-4, 1e16).
fn format_price(price: f64) -> String {
    let magnitude = price.abs();
    if price == 0.0 || !price.is_finite() || (1e-4..1e16).contains(&magnitude) {
        return format!("{:?}", price);
    }
    let exp_form = format!("{:e}", price);
    match exp_form.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => exp_form,
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Item {}, {}, {}>", self.id, self.name, format_price(self.price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::models::{Customer, NewCustomer, NewReview};

    fn widget(conn: &Connection) -> Item {
        Item::create(conn, &NewItem { name: "Widget".to_string(), price: 9.99 }).unwrap()
    }

    #[test]
    fn test_create_and_display() {
        let conn = test_connection();
        let item = widget(&conn);
        assert_eq!(Item::get(&conn, item.id).unwrap(), item);
        assert_eq!(item.to_string(), "<Item 1, Widget, 9.99>");

        let whole = Item::create(&conn, &NewItem { name: "Crate".to_string(), price: 10.0 }).unwrap();
        assert_eq!(whole.to_string(), "<Item 2, Crate, 10.0>");
    }

    #[test]
    fn test_invalid_prices_rejected() {
        let conn = test_connection();
        for price in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = Item::create(&conn, &NewItem { name: "Bad".to_string(), price }).unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)));
        }
        assert!(Item::all(&conn).unwrap().is_empty());

        let mut item = widget(&conn);
        item.apply(ItemPatch { price: Some(f64::NAN), ..Default::default() });
        assert!(matches!(item.update(&conn), Err(StoreError::InvalidInput(_))));
        assert_eq!(Item::get(&conn, item.id).unwrap().price, 9.99);
    }

    #[test]
    fn test_negative_price_accepted() {
        let conn = test_connection();
        let credit = Item::create(&conn, &NewItem { name: "Credit".to_string(), price: -5.0 }).unwrap();
        assert_eq!(Item::get(&conn, credit.id).unwrap().price, -5.0);
        assert_eq!(credit.to_string(), "<Item 1, Credit, -5.0>");
    }

    #[test]
    fn test_price_exponent_form() {
        assert_eq!(format_price(1e16), "1e+16");
        assert_eq!(format_price(1.5e16), "1.5e+16");
        assert_eq!(format_price(1e-7), "1e-07");
        assert_eq!(format_price(-2.5e-5), "-2.5e-05");
        assert_eq!(format_price(1e-4), "0.0001");
        assert_eq!(format_price(123456789.0), "123456789.0");
        assert_eq!(format_price(1e100), "1e+100");
        assert_eq!(format_price(0.0), "0.0");
    }

    #[test]
    fn test_partial_patch_from_json() {
        let conn = test_connection();
        let mut item = widget(&conn);
        let patch: ItemPatch = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        item.apply(patch);
        item.update(&conn).unwrap();

        let stored = Item::get(&conn, item.id).unwrap();
        assert_eq!(stored.name, "Widget");
        assert_eq!(stored.price, 12.5);
    }

    #[test]
    fn test_delete_cascades_to_reviews() {
        let conn = test_connection();
        let customer = Customer::create(&conn, &NewCustomer { name: "Ann".to_string() }).unwrap();
        let item = widget(&conn);
        let other = Item::create(&conn, &NewItem { name: "Gadget".to_string(), price: 3.0 }).unwrap();
        for target in [&item, &item, &other] {
            Review::create(
                &conn,
                &NewReview { comment: "fine".to_string(), customer_id: customer.id, item_id: target.id },
            )
            .unwrap();
        }
        assert_eq!(item.reviews(&conn).unwrap().len(), 2);

        assert!(Item::delete(&conn, item.id).unwrap());

        assert!(Review::all(&conn).unwrap().iter().all(|r| r.item_id == other.id));
        assert_eq!(customer.reviews(&conn).unwrap().len(), 1);
        assert!(Customer::find(&conn, customer.id).unwrap().is_some());
    }

    #[test]
    fn test_remove_review() {
        let conn = test_connection();
        let customer = Customer::create(&conn, &NewCustomer { name: "Ann".to_string() }).unwrap();
        let item = widget(&conn);
        let review = Review::create(
            &conn,
            &NewReview { comment: "fine".to_string(), customer_id: customer.id, item_id: item.id },
        )
        .unwrap();

        item.remove_review(&conn, review.id).unwrap();
        assert!(item.reviews(&conn).unwrap().is_empty());
        assert!(Review::find(&conn, review.id).unwrap().is_none());
    }
}
