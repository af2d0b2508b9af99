pub mod config;
pub mod error;
pub mod db;
pub mod models;
pub mod serialize;
pub mod seed;

pub use config::Config;
pub use error::{StoreError, Result};
pub use models::{Customer, Item, Review, NewCustomer, NewItem, NewReview};
