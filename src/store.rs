// 💾 Provider Store - SQLite persistence collaborator
// Narrow save/query surface; the import core never depends on the storage
// format. Only the binaries touch this module.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;

use crate::record::ProviderRecord;

/// Open (or create) the provider database with the schema applied.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

/// Create the providers table and enable WAL mode.
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("Failed to enable WAL mode")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS providers (
            id TEXT PRIMARY KEY,
            tax_id TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            second_last_name TEXT NOT NULL,
            full_name TEXT NOT NULL,
            profession TEXT NOT NULL,
            registration_date TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            website TEXT NOT NULL,
            contact_person TEXT NOT NULL,
            categories TEXT NOT NULL,
            description TEXT NOT NULL,
            raw_lines TEXT NOT NULL,
            source_file TEXT NOT NULL,
            source_format TEXT NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create providers table")?;

    Ok(())
}

/// Upsert a batch of validated records (by id) inside one transaction.
pub fn insert_providers(conn: &mut Connection, records: &[ProviderRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO providers (
                id, tax_id, first_name, last_name, second_last_name, full_name,
                profession, registration_date, phone, email, address, website,
                contact_person, categories, description, raw_lines,
                source_file, source_format, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        )?;

        for record in records {
            stmt.execute(params![
                record.id,
                record.tax_id,
                record.first_name,
                record.last_name,
                record.second_last_name,
                record.full_name,
                record.profession,
                record.registration_date,
                record.phone,
                record.email,
                record.address,
                record.website,
                record.contact_person,
                record.categories.join(";"),
                record.description,
                record.raw_lines.join("\n"),
                record.source_file,
                record.source_format,
                record.imported_at.to_rfc3339(),
            ])?;
        }
    }
    tx.commit()?;

    Ok(records.len())
}

const SELECT_COLUMNS: &str = "id, tax_id, first_name, last_name, second_last_name, full_name, \
     profession, registration_date, phone, email, address, website, \
     contact_person, categories, description, raw_lines, \
     source_file, source_format, imported_at";

fn row_to_record(row: &Row) -> rusqlite::Result<ProviderRecord> {
    let categories: String = row.get(13)?;
    let raw_lines: String = row.get(15)?;
    let imported_at: String = row.get(18)?;

    Ok(ProviderRecord {
        id: row.get(0)?,
        tax_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        second_last_name: row.get(4)?,
        full_name: row.get(5)?,
        profession: row.get(6)?,
        registration_date: row.get(7)?,
        phone: row.get(8)?,
        email: row.get(9)?,
        address: row.get(10)?,
        website: row.get(11)?,
        contact_person: row.get(12)?,
        categories: categories
            .split(';')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect(),
        description: row.get(14)?,
        raw_lines: raw_lines
            .lines()
            .map(|l| l.to_string())
            .collect(),
        source_file: row.get(16)?,
        source_format: row.get(17)?,
        imported_at: DateTime::parse_from_rfc3339(&imported_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// All stored providers, ordered by name.
pub fn get_all_providers(conn: &Connection) -> Result<Vec<ProviderRecord>> {
    let sql = format!("SELECT {} FROM providers ORDER BY full_name", SELECT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;

    let records = stmt
        .query_map([], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read providers")?;

    Ok(records)
}

/// Substring search over name / tax id / profession (case-insensitive).
pub fn search_stored(conn: &Connection, query: &str, limit: usize) -> Result<Vec<ProviderRecord>> {
    let sql = format!(
        "SELECT {} FROM providers
         WHERE LOWER(full_name) LIKE ?1
            OR LOWER(tax_id) LIKE ?1
            OR LOWER(profession) LIKE ?1
         ORDER BY full_name
         LIMIT ?2",
        SELECT_COLUMNS
    );
    let pattern = format!("%{}%", query.trim().to_lowercase());

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params![pattern, limit as i64], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to search providers")?;

    Ok(records)
}

/// Total stored providers.
pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM providers", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================
