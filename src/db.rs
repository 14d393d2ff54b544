use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::dedup::MasterDataset;
use crate::record::{JobMap, MASTERLIST_HEADER};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS masterlist (
            status          TEXT NOT NULL,
            title           TEXT NOT NULL,
            company         TEXT NOT NULL,
            location        TEXT NOT NULL,
            raw_date        TEXT NOT NULL DEFAULT '',
            normalized_date TEXT NOT NULL DEFAULT '',
            blurb           TEXT NOT NULL DEFAULT '',
            link            TEXT NOT NULL DEFAULT '',
            id              TEXT NOT NULL,
            provider        TEXT NOT NULL,
            saved_at        TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (provider, id)
        );
        CREATE INDEX IF NOT EXISTS idx_masterlist_status ON masterlist(status);
        ",
    )?;
    Ok(())
}

/// Previously saved `(provider, id)` pairs, or `None` before the first run.
pub fn load_master(conn: &Connection) -> Result<Option<MasterDataset>> {
    let mut stmt = conn.prepare("SELECT provider, id FROM masterlist")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Ok(None);
    }
    let mut master = MasterDataset::new();
    for (provider, id) in rows {
        master.insert(provider, id);
    }
    Ok(Some(master))
}

pub fn save_records(conn: &Connection, jobs: &JobMap) -> Result<usize> {
    let placeholders: Vec<String> = (1..=MASTERLIST_HEADER.len())
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "INSERT OR REPLACE INTO masterlist ({}) VALUES ({})",
        MASTERLIST_HEADER.join(", "),
        placeholders.join(", ")
    );

    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(&sql)?;
        for job in jobs.values() {
            count += stmt.execute(rusqlite::params_from_iter(job.columns()))?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct ProviderStats {
    pub provider: String,
    pub status: String,
    pub count: i64,
}

pub fn get_stats(conn: &Connection) -> Result<Vec<ProviderStats>> {
    let mut stmt = conn.prepare(
        "SELECT provider, status, COUNT(*) FROM masterlist
         GROUP BY provider, status ORDER BY provider, status",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ProviderStats {
                provider: row.get(0)?,
                status: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
