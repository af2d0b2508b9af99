use anyhow::Result;
use clap::Parser;
use reviewstore::db::Db;
use reviewstore::{seed, Config};

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Replace all customers, items and reviews with sample data")]
struct Args {
    /// Skip applying pending migrations first
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", config.log_level())).init();

    let db = Db::new(config.db_path());
    if !args.no_migrate {
        db.migrate(config.migrations_dir()).await?;
    }

    let summary = db.with_connection(|conn| seed::run(conn)).await?;
    println!(
        "Seeded {} customers, {} items, {} reviews into {}",
        summary.customers,
        summary.items,
        summary.reviews,
        db.path().display()
    );
    Ok(())
}
