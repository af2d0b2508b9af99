//! Table layout and the checks run by `reviewstore verify`.
//!
//! The DDL itself lives in `migrations/`; this module records what that DDL
//! is expected to produce so a deployed database can be checked against it.

use rusqlite::Connection;
use crate::db::migrate;
use crate::error::{Result, StoreError};

pub const CUSTOMERS: &str = "customers";
pub const ITEMS: &str = "items";
pub const REVIEWS: &str = "reviews";

pub const TABLES: &[&str] = &[CUSTOMERS, ITEMS, REVIEWS];

/// A declared foreign key on one of the store tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub referenced_table: &'static str,
    pub referenced_column: &'static str,
    pub on_delete: &'static str,
}

impl ForeignKey {
    pub fn name(&self) -> String {
        foreign_key_name(self.table, self.column, self.referenced_table)
    }
}

pub const FOREIGN_KEYS: &[ForeignKey] = &[
    ForeignKey {
        table: REVIEWS,
        column: "customer_id",
        referenced_table: CUSTOMERS,
        referenced_column: "id",
        on_delete: "CASCADE",
    },
    ForeignKey {
        table: REVIEWS,
        column: "item_id",
        referenced_table: ITEMS,
        referenced_column: "id",
        on_delete: "CASCADE",
    },
];

/// Constraint name under the `fk_<table>_<column>_<referenced_table>` convention
pub fn foreign_key_name(table: &str, column: &str, referenced_table: &str) -> String {
    format!("fk_{}_{}_{}", table, column, referenced_table)
}

/// What `verify` found
#[derive(Debug, Clone, Default)]
pub struct SchemaReport {
    pub tables: Vec<String>,
    pub foreign_keys: Vec<String>,
    pub migrations: Vec<String>,
}

fn table_sql(conn: &Connection, table: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut rows = stmt.query([table])?;
    match rows.next()? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(None),
    }
}

/// True when `ddl` has a `CONSTRAINT <name>` clause for exactly `name`,
/// whatever whitespace separates the two and however the name is quoted.
fn declares_constraint(ddl: &str, name: &str) -> bool {
    let tokens: Vec<&str> = ddl.split_whitespace().collect();
    tokens.windows(2).any(|pair| {
        pair[0].eq_ignore_ascii_case("CONSTRAINT")
            && pair[1].trim_matches(|c| matches!(c, '"' | '`' | '[' | ']')) == name
    })
}

fn check_foreign_key(conn: &Connection, fk: &ForeignKey, ddl: &str) -> Result<()> {
    let name = fk.name();
    if !declares_constraint(ddl, &name) {
        return Err(StoreError::Config(format!("Missing foreign key constraint: {}", name)));
    }

    // (table, from, to, on_delete)
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", fk.table))?;
    let declared = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let found = declared.iter().find(|(table, from, _, _)| table == fk.referenced_table && from == fk.column);
    match found {
        None => Err(StoreError::Config(format!(
            "{} is not declared on {}.{}",
            name, fk.table, fk.column
        ))),
        Some((_, _, to, on_delete)) => {
            if to.as_deref().unwrap_or(fk.referenced_column) != fk.referenced_column {
                return Err(StoreError::Config(format!(
                    "{} references {:?}, expected {}",
                    name, to, fk.referenced_column
                )));
            }
            if !on_delete.eq_ignore_ascii_case(fk.on_delete) {
                return Err(StoreError::Config(format!(
                    "{} has ON DELETE {}, expected {}",
                    name, on_delete, fk.on_delete
                )));
            }
            Ok(())
        }
    }
}

/// Verify that the connected database carries the store schema
pub fn verify(conn: &Connection) -> Result<SchemaReport> {
    let mut report = SchemaReport::default();

    for table in TABLES {
        if table_sql(conn, table)?.is_none() {
            log::error!("Missing table: {}", table);
            return Err(StoreError::Config(format!("Missing table: {}", table)));
        }
        log::debug!("✓ Table exists: {}", table);
        report.tables.push(table.to_string());
    }

    for fk in FOREIGN_KEYS {
        let ddl = table_sql(conn, fk.table)?.unwrap_or_default();
        check_foreign_key(conn, fk, &ddl)?;
        log::debug!("✓ Foreign key: {}", fk.name());
        report.foreign_keys.push(fk.name());
    }

    let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(StoreError::Config("Foreign keys not enabled".to_string()));
    }

    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    if integrity != "ok" {
        return Err(StoreError::Config(format!("Database integrity check failed: {}", integrity)));
    }

    report.migrations = migrate::get_applied_migrations(conn)?;
    Ok(report)
}
