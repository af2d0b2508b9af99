use anyhow::Result;
use clap::{Parser, ValueEnum};
use reviewstore::db::Db;
use reviewstore::{serialize, Config};
use serde_json::Value;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Customers,
    Items,
    Reviews,
}

#[derive(Parser, Debug)]
#[command(name = "export")]
#[command(about = "Print customers, items or reviews as JSON trees")]
struct Args {
    /// Record kind to list when no id is given
    #[arg(short, long, value_enum, default_value_t = Kind::Customers)]
    kind: Kind,

    /// Export a single customer
    #[arg(long, conflicts_with_all = ["item", "review"])]
    customer: Option<i64>,

    /// Export a single item
    #[arg(long, conflicts_with = "review")]
    item: Option<i64>,

    /// Export a single review
    #[arg(long)]
    review: Option<i64>,

    /// Comma separated fields to keep, dotted for nested ones (e.g. name,reviews.item.name)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", config.log_level())).init();

    let db = Db::new(config.db_path());

    let (customer, item, review, kind) = (args.customer, args.item, args.review, args.kind);
    let value = db
        .with_connection(move |conn| {
            let value = match (customer, item, review) {
                (Some(id), _, _) => serialize::to_value(&serialize::customer_tree(conn, id)?)?,
                (_, Some(id), _) => serialize::to_value(&serialize::item_tree(conn, id)?)?,
                (_, _, Some(id)) => serialize::to_value(&serialize::review_tree(conn, id)?)?,
                (None, None, None) => match kind {
                    Kind::Customers => serialize::to_value(&serialize::customer_trees(conn)?)?,
                    Kind::Items => serialize::to_value(&serialize::item_trees(conn)?)?,
                    Kind::Reviews => serialize::to_value(&serialize::review_trees(conn)?)?,
                },
            };
            Ok(value)
        })
        .await?;

    let value: Value = if args.only.is_empty() {
        value
    } else {
        let fields: Vec<&str> = args.only.iter().map(String::as_str).collect();
        serialize::only(&value, &fields)
    };

    println!("{}", serialize::to_json(&value)?);
    Ok(())
}
