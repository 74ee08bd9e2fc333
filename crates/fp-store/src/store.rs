use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use num_bigint::BigUint;
use rusqlite::{Connection, OptionalExtension, params};

use fp_core::constants::EXTRA_PRIMALITY_ROUNDS;
use fp_core::{Budget, Factor, Factorization, Method, PageIndex, export_json, import_json, residue};

use crate::error::{Result, StoreError};
use crate::schema;

const SELECT_COLUMNS: &str =
    "SELECT n, factors, method, iterations, max_iterations, deadline_ms FROM results";

/// Ledger of factorization results, one row per integer.
pub struct Store {
    conn: Connection,
}

/// Raw column values, decoded into a `Factorization` outside the row closure
/// so decode failures surface as `StoreError` instead of `rusqlite::Error`.
struct StoredRow {
    n: String,
    factors: String,
    method: String,
    iterations: i64,
    max_iterations: i64,
    deadline_ms: Option<i64>,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            n: row.get(0)?,
            factors: row.get(1)?,
            method: row.get(2)?,
            iterations: row.get(3)?,
            max_iterations: row.get(4)?,
            deadline_ms: row.get(5)?,
        })
    }

    fn decode(self) -> Result<Factorization> {
        let n: BigUint = self
            .n
            .parse()
            .map_err(|_| StoreError::InvalidData(format!("bad integer key: {}", self.n)))?;
        let factors: Vec<Factor> = serde_json::from_str(&self.factors)?;
        let method = Method::from_label(&self.method)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown method: {}", self.method)))?;
        let mut budget = Budget::iterations(from_sql_int(self.max_iterations));
        if let Some(ms) = self.deadline_ms {
            budget = budget.with_deadline(Duration::from_millis(from_sql_int(ms)));
        }
        // Method and confidence follow from the factors; the stored label
        // must agree with them.
        let result =
            Factorization::from_factors(n, factors, from_sql_int(self.iterations), budget);
        if result.method != method {
            return Err(StoreError::InvalidData(format!(
                "stored method {method} disagrees with factors of {}",
                result.n
            )));
        }
        Ok(result)
    }
}

fn to_sql_int(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn from_sql_int(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| to_sql_int(d.as_secs()))
        .unwrap_or(0)
}

/// Insert or refresh one row. An exact row is never replaced by an inexact
/// one. Returns whether a row was written.
fn upsert(conn: &Connection, result: &Factorization, pages: &PageIndex, now: i64) -> Result<bool> {
    let position = pages.locate(&result.n);
    let factors = serde_json::to_string(&result.factors)?;
    let deadline_ms = result
        .budget
        .deadline
        .map(|d| to_sql_int(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)));
    let changed = conn.execute(
        "INSERT INTO results (n, residue, page, page_offset, factors, method, iterations,
                              confidence, exact, max_iterations, deadline_ms, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(n) DO UPDATE SET
            factors = excluded.factors,
            method = excluded.method,
            iterations = excluded.iterations,
            confidence = excluded.confidence,
            exact = excluded.exact,
            max_iterations = excluded.max_iterations,
            deadline_ms = excluded.deadline_ms,
            recorded_at = excluded.recorded_at
         WHERE results.exact = 0 OR excluded.exact = 1",
        params![
            result.n.to_string(),
            residue(&result.n),
            position.page.to_string(),
            position.offset,
            factors,
            result.method.label(),
            to_sql_int(result.iterations),
            result.confidence,
            result.is_exact(),
            to_sql_int(result.budget.max_iterations),
            deadline_ms,
            now,
        ],
    )?;
    Ok(changed > 0)
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).ok();
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Write ---

    /// Record one result. Returns false when an exact row for the same
    /// integer already exists and `result` is inexact.
    pub fn record(&self, result: &Factorization) -> Result<bool> {
        upsert(&self.conn, result, &PageIndex::default(), unix_now())
    }

    /// Record many results in one transaction; returns how many rows were
    /// written.
    pub fn record_all<'a, I>(&self, results: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Factorization>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let pages = PageIndex::default();
        let now = unix_now();
        let mut written = 0;
        for result in results {
            if upsert(&tx, result, &pages, now)? {
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Delete every recorded result. Returns the number of rows removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM results", [])?;
        tracing::debug!(removed, "ledger cleared");
        Ok(removed)
    }

    // --- Read ---

    pub fn load(&self, n: &BigUint) -> Result<Option<Factorization>> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE n = ?1"),
                [n.to_string()],
                StoredRow::from_row,
            )
            .optional()?;
        row.map(StoredRow::decode).transpose()
    }

    pub fn load_all(&self) -> Result<Vec<Factorization>> {
        self.load_where(&format!("{SELECT_COLUMNS} ORDER BY recorded_at, rowid"))
    }

    /// Results whose every factor is proven. These are safe to reuse under
    /// any budget. Rows whose proven factors fail a primality re-check are
    /// left out.
    pub fn load_exact(&self) -> Result<Vec<Factorization>> {
        let rows = self.load_where(&format!(
            "{SELECT_COLUMNS} WHERE exact = 1 ORDER BY recorded_at, rowid"
        ))?;
        let total = rows.len();
        let checked: Vec<_> = rows
            .into_iter()
            .filter_map(|r| r.revalidated(EXTRA_PRIMALITY_ROUNDS))
            .filter(Factorization::is_exact)
            .collect();
        if checked.len() < total {
            tracing::warn!(skipped = total - checked.len(), "ledger rows failed re-check");
        }
        Ok(checked)
    }

    fn load_where(&self, sql: &str) -> Result<Vec<Factorization>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], StoredRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(StoredRow::decode).collect()
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(from_sql_int(count))
    }

    /// Row counts per overall method, in method order.
    pub fn method_counts(&self) -> Result<Vec<(Method, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT method, COUNT(*) FROM results GROUP BY method")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut counts = rows
            .into_iter()
            .map(|(label, count)| {
                Method::from_label(&label)
                    .map(|m| (m, from_sql_int(count)))
                    .ok_or_else(|| StoreError::InvalidData(format!("unknown method: {label}")))
            })
            .collect::<Result<Vec<_>>>()?;
        counts.sort_by_key(|(m, _)| *m);
        Ok(counts)
    }

    /// Size of the database in bytes (page_count * page_size).
    pub fn db_size(&self) -> Result<u64> {
        let page_count: i64 = self
            .conn
            .pragma_query_value(None, "page_count", |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .pragma_query_value(None, "page_size", |row| row.get(0))?;
        Ok(from_sql_int(page_count).saturating_mul(from_sql_int(page_size)))
    }

    // --- Snapshots ---

    /// Write every result as a versioned JSON snapshot. Returns the count.
    pub fn export_json_file(&self, path: &Path) -> Result<usize> {
        let results = self.load_all()?;
        let json = export_json(&results)?;
        std::fs::write(path, json)?;
        Ok(results.len())
    }

    /// Record every result from a snapshot file. Results that fail
    /// [`Factorization::revalidated`] (wrong product, a composite claimed
    /// proven, a forged confidence) are skipped. Returns rows written.
    pub fn import_json_file(&self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)?;
        let results = import_json(&json)?;
        let total = results.len();
        let valid: Vec<_> = results
            .into_iter()
            .filter_map(|r| r.revalidated(EXTRA_PRIMALITY_ROUNDS))
            .collect();
        if valid.len() < total {
            tracing::warn!(skipped = total - valid.len(), "snapshot results failed verification");
        }
        self.record_all(&valid)
    }
}
