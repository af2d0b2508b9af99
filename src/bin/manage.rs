use anyhow::Result;
use clap::{Parser, Subcommand};
use reviewstore::db::Db;
use reviewstore::models::{CustomerPatch, ItemPatch, ReviewPatch};
use reviewstore::{Config, Customer, Item, NewCustomer, NewItem, NewReview, Review, StoreError};

#[derive(Parser, Debug)]
#[command(name = "manage")]
#[command(about = "Create, update and delete customers, items and reviews")]
struct Args {
    #[command(subcommand)]
    entity: Entity,
}

#[derive(Subcommand, Debug)]
enum Entity {
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Manage items
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Manage reviews
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
}

#[derive(Subcommand, Debug)]
enum CustomerAction {
    List,
    Add {
        #[arg(long)]
        name: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete the customer and all of their reviews
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ItemAction {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    /// Delete the item and all of its reviews
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ReviewAction {
    List,
    Add {
        #[arg(long)]
        comment: String,
        #[arg(long)]
        customer_id: i64,
        #[arg(long)]
        item_id: i64,
    },
    Update {
        id: i64,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        customer_id: Option<i64>,
        #[arg(long)]
        item_id: Option<i64>,
    },
    Delete { id: i64 },
}

fn print_all<T: std::fmt::Display>(rows: &[T]) {
    if rows.is_empty() {
        println!("(none)");
    }
    for row in rows {
        println!("{}", row);
    }
}

fn deleted(kind: &str, id: i64, existed: bool) -> std::result::Result<String, StoreError> {
    if existed {
        Ok(format!("Deleted {} {}", kind, id))
    } else {
        Err(StoreError::InvalidInput(format!("no {} with id {}", kind, id)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", config.log_level())).init();

    let db = Db::new(config.db_path());

    let output = db
        .with_connection(move |conn| match args.entity {
            Entity::Customer { action } => match action {
                CustomerAction::List => {
                    print_all(&Customer::all(conn)?);
                    Ok(String::new())
                }
                CustomerAction::Add { name } => Ok(Customer::create(conn, &NewCustomer { name })?.to_string()),
                CustomerAction::Update { id, name } => {
                    let mut customer = Customer::get(conn, id)?;
                    customer.apply(CustomerPatch { name });
                    customer.update(conn)?;
                    Ok(customer.to_string())
                }
                CustomerAction::Delete { id } => deleted("customer", id, Customer::delete(conn, id)?),
            },
            Entity::Item { action } => match action {
                ItemAction::List => {
                    print_all(&Item::all(conn)?);
                    Ok(String::new())
                }
                ItemAction::Add { name, price } => Ok(Item::create(conn, &NewItem { name, price })?.to_string()),
                ItemAction::Update { id, name, price } => {
                    let mut item = Item::get(conn, id)?;
                    item.apply(ItemPatch { name, price });
                    item.update(conn)?;
                    Ok(item.to_string())
                }
                ItemAction::Delete { id } => deleted("item", id, Item::delete(conn, id)?),
            },
            Entity::Review { action } => match action {
                ReviewAction::List => {
                    print_all(&Review::all(conn)?);
                    Ok(String::new())
                }
                ReviewAction::Add { comment, customer_id, item_id } => {
                    let review = Review::create(conn, &NewReview { comment, customer_id, item_id })?;
                    Ok(review.to_string())
                }
                ReviewAction::Update { id, comment, customer_id, item_id } => {
                    let mut review = Review::get(conn, id)?;
                    review.apply(ReviewPatch { comment, customer_id, item_id });
                    review.update(conn)?;
                    Ok(review.to_string())
                }
                ReviewAction::Delete { id } => deleted("review", id, Review::delete(conn, id)?),
            },
        })
        .await?;

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
