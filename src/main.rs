use anyhow::Result;
use reviewstore::Config;
use reviewstore::db::{schema, Db};

fn init_logger(config: Option<&Config>) {
    let default_level = config.map(|c| c.log_level().to_string()).unwrap_or_else(|| "info".to_string());
    let _ = env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", default_level)).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            init_logger(None);
            return Err(e);
        }
    };
    init_logger(Some(&config));

    match command {
        "migrate" => {
            run_migrations(&config).await?;
        }
        "verify" => run_schema_verification(&config).await?,
        other => anyhow::bail!("unknown command {:?} (expected migrate or verify)", other),
    }

    Ok(())
}

async fn run_migrations(config: &Config) -> Result<Db> {
    log::info!("Database path: {}", config.db_path().display());
    let db = Db::new(config.db_path());
    let applied = db.migrate(config.migrations_dir()).await?;
    log::info!("Database initialized ({} new migrations)", applied);
    Ok(db)
}

async fn run_schema_verification(config: &Config) -> Result<()> {
    log::info!("Starting reviewstore v{}", env!("CARGO_PKG_VERSION"));
    let db = run_migrations(config).await?;

    let report = db.with_connection(|conn| schema::verify(conn)).await?;
    for table in &report.tables {
        log::info!("✓ Table: {}", table);
    }
    for fk in &report.foreign_keys {
        log::info!("✓ Foreign key: {}", fk);
    }
    log::info!("✓ {} migrations applied", report.migrations.len());
    log::info!("✓ Database schema verification complete");
    Ok(())
}
