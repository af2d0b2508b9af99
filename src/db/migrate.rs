use rusqlite::{Connection, params};
use std::fs;
use std::path::Path;
use crate::error::{Result, StoreError};

/// A single `NNN_name.sql` file
#[derive(Debug)]
struct Migration {
    version: u32,
    name: String,
    sql: String,
}

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Names of applied migrations, in version order
pub fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    ensure_migrations_table(conn)?;
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY version")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(names)
}

fn parse_filename(filename: &str) -> Result<(u32, String)> {
    let stem = filename
        .strip_suffix(".sql")
        .ok_or_else(|| StoreError::Config(format!("Not a migration file: {}", filename)))?;
    let version_str = stem
        .split('_')
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StoreError::Config(format!("Invalid migration filename: {}", filename)))?;
    let version = version_str
        .parse()
        .map_err(|_| StoreError::Config(format!("Invalid migration version: {}", version_str)))?;
    Ok((version, stem.to_string()))
}

fn load_migrations(migrations_dir: &Path) -> Result<Vec<Migration>> {
    let mut files: Vec<_> = fs::read_dir(migrations_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();
    files.sort_by_key(|e| e.file_name());

    let mut migrations = Vec::with_capacity(files.len());
    for entry in files {
        let path = entry.path();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::Config("Invalid migration filename".to_string()))?;
        let (version, name) = parse_filename(filename)?;
        let sql = fs::read_to_string(&path)?;
        migrations.push(Migration { version, name, sql });
    }

    migrations.sort_by_key(|m| m.version);
    for pair in migrations.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(StoreError::Config(format!(
                "Duplicate migration version {}: {} and {}",
                pair[0].version, pair[0].name, pair[1].name
            )));
        }
    }

    Ok(migrations)
}

/// Run all pending migrations, returning how many were applied
pub fn run_migrations(conn: &mut Connection, migrations_dir: &Path) -> Result<usize> {
    let applied = get_applied_migrations(conn)?;
    let migrations = load_migrations(migrations_dir)?;
    let mut count = 0;

    for migration in migrations {
        if applied.contains(&migration.name) {
            log::debug!("Migration {} already applied, skipping", migration.name);
            continue;
        }

        log::info!("Applying migration: {} (version {})", migration.name, migration.version);

        let tx = conn.transaction()?;
        tx.execute_batch(&migration.sql).map_err(|e| {
            StoreError::Config(format!("Failed to execute migration {}: {}", migration.name, e))
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;

        count += 1;
        log::info!("Migration {} applied successfully", migration.name);
    }

    log::info!("All migrations completed ({} applied)", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_filename() {
        assert_eq!(parse_filename("001_core_tables.sql").unwrap(), (1, "001_core_tables".to_string()));
        assert!(parse_filename("core.sql").is_err());
        assert!(parse_filename("_x.sql").is_err());
    }

    #[test]
    fn test_load_migrations_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("002_another.sql"), "CREATE TABLE another (id INTEGER);").unwrap();
        fs::write(temp_dir.path().join("001_test.sql"), "CREATE TABLE test (id INTEGER);").unwrap();
        fs::write(temp_dir.path().join("README.md"), "ignored").unwrap();

        let migrations = load_migrations(temp_dir.path()).unwrap();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].version, 1);
        assert_eq!(migrations[1].name, "002_another");
    }

    #[test]
    fn test_duplicate_versions_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("001_a.sql"), "SELECT 1;").unwrap();
        fs::write(temp_dir.path().join("001_b.sql"), "SELECT 1;").unwrap();
        assert!(matches!(load_migrations(temp_dir.path()), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("001_broken.sql"),
            "CREATE TABLE half (id INTEGER); NOT VALID SQL;",
        )
        .unwrap();
        let mut conn = Connection::open_in_memory().unwrap();

        let err = run_migrations(&mut conn, temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("001_broken"));
        assert!(get_applied_migrations(&conn).unwrap().is_empty());
        let exists: bool = conn
            .prepare("SELECT name FROM sqlite_master WHERE name = 'half'")
            .unwrap()
            .exists([])
            .unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_bundled_migrations_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");

        let first = run_migrations(&mut conn, &dir).unwrap();
        assert!(first >= 1);
        assert_eq!(run_migrations(&mut conn, &dir).unwrap(), 0);
        assert_eq!(get_applied_migrations(&conn).unwrap().len(), first);
    }
}
