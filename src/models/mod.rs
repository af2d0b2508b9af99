//! Customer, item and review records.
//!
//! Every operation takes a borrowed `rusqlite::Connection` so callers can run
//! several of them inside one `Db::with_connection` call or one transaction.
//! Referential integrity and cascade deletes are enforced by the schema, not
//! re-implemented here.

mod customer;
mod item;
mod review;

pub use customer::{Customer, CustomerPatch, NewCustomer};
pub use item::{Item, ItemPatch, NewItem};
pub use review::{NewReview, Review, ReviewPatch};

/// Collect mapped rows, converting the first failure into a store error
pub(crate) fn collect_rows<T, I>(rows: I) -> crate::Result<Vec<T>>
where
    I: Iterator<Item = rusqlite::Result<T>>,
{
    rows.collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
        .map_err(crate::StoreError::Database)
}
