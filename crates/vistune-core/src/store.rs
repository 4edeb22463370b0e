//! SQLite-backed record store.
//!
//! Every [`Record`] type owns one table of `(key TEXT PRIMARY KEY, payload TEXT)`.
//! The key is the JSON encoding of [`Record::Key`]; the payload is the TOML
//! encoding of the record, which keeps NaN values intact.

use std::path::Path;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Result, VistuneError};
use crate::records::imaging::lookups;
use crate::records::{Record, RegistrationInput, RegistrationRun, RunKey};

/// Default busy timeout when another process holds the database.
const BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) a store file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        info!(path = %path.display(), "Opened record store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    fn ensure_table<R: Record>(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, payload TEXT NOT NULL);",
            R::TABLE
        ))?;
        Ok(())
    }

    fn encode_key<R: Record>(key: &R::Key) -> Result<String> {
        Ok(serde_json::to_string(key)?)
    }

    fn insert_on<R: Record>(conn: &Connection, record: &R) -> Result<()> {
        Self::ensure_table::<R>(conn)?;
        let key = Self::encode_key::<R>(&record.key())?;
        let payload = toml::to_string(record)?;
        let sql = format!("INSERT INTO {} (key, payload) VALUES (?1, ?2)", R::TABLE);
        match conn.execute(&sql, params![key, payload]) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(VistuneError::DuplicateKey {
                    table: R::TABLE,
                    key,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert one record. Inserting an existing key is an error.
    pub fn insert<R: Record>(&self, record: &R) -> Result<()> {
        Self::insert_on(&self.conn, record)?;
        debug!(table = R::TABLE, "Inserted record");
        Ok(())
    }

    /// Insert all records atomically: either every row lands or none does.
    pub fn insert_many<R: Record>(&mut self, records: &[R]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for record in records {
            Self::insert_on(&tx, record)?;
        }
        tx.commit()?;
        debug!(table = R::TABLE, rows = records.len(), "Inserted records");
        Ok(())
    }

    pub fn fetch<R: Record>(&self, key: &R::Key) -> Result<Option<R>> {
        Self::ensure_table::<R>(&self.conn)?;
        let key = Self::encode_key::<R>(key)?;
        let sql = format!("SELECT payload FROM {} WHERE key = ?1", R::TABLE);
        let payload: Option<String> = self
            .conn
            .query_row(&sql, params![key], |row| row.get(0))
            .optional()?;
        payload.map(|p| toml::from_str(&p).map_err(Into::into)).transpose()
    }

    /// Like [`fetch`](Self::fetch), but a missing row is an error.
    pub fn fetch_one<R: Record>(&self, key: &R::Key) -> Result<R> {
        self.fetch(key)?.ok_or_else(|| VistuneError::MissingRecord {
            table: R::TABLE,
            key: serde_json::to_string(key).unwrap_or_default(),
        })
    }

    pub fn contains<R: Record>(&self, key: &R::Key) -> Result<bool> {
        Self::ensure_table::<R>(&self.conn)?;
        let key = Self::encode_key::<R>(key)?;
        let sql = format!("SELECT 1 FROM {} WHERE key = ?1", R::TABLE);
        let found: Option<i64> = self
            .conn
            .query_row(&sql, params![key], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// All rows of a table in insertion order.
    pub fn fetch_all<R: Record>(&self) -> Result<Vec<R>> {
        Self::ensure_table::<R>(&self.conn)?;
        let sql = format!("SELECT payload FROM {} ORDER BY rowid", R::TABLE);
        let mut stmt = self.conn.prepare(&sql)?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|p| toml::from_str(p).map_err(Into::into))
            .collect()
    }

    pub fn count<R: Record>(&self) -> Result<usize> {
        Self::ensure_table::<R>(&self.conn)?;
        let sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Create a registration job over `runs` with the next free id.
    pub fn create_registration_input(&mut self, runs: &[RunKey]) -> Result<RegistrationInput> {
        if runs.is_empty() {
            return Err(VistuneError::Precondition(
                "a registration input needs at least one run".into(),
            ));
        }
        Self::ensure_table::<RegistrationInput>(&self.conn)?;
        let tx = self.conn.transaction()?;
        let existing: Vec<RegistrationInput> = {
            let sql = format!("SELECT payload FROM {}", RegistrationInput::TABLE);
            let mut stmt = tx.prepare(&sql)?;
            let payloads = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            payloads
                .iter()
                .map(|p| toml::from_str(p))
                .collect::<std::result::Result<_, _>>()?
        };
        let registration_id = existing
            .iter()
            .map(|r| r.registration_id)
            .max()
            .map_or(1, |m| m + 1);

        let input = RegistrationInput { registration_id };
        Self::insert_on(&tx, &input)?;
        for (i, run) in runs.iter().enumerate() {
            Self::insert_on(
                &tx,
                &RegistrationRun {
                    registration_id,
                    subject_id: run.subject_id,
                    session: run.session,
                    run_id: run.run_id,
                    registrationrun_id: i as u16,
                },
            )?;
        }
        tx.commit()?;
        info!(registration_id, runs = runs.len(), "Created registration input");
        Ok(input)
    }

    /// Runs of a registration job, ordered by their position in the job.
    pub fn registration_runs(&self, registration_id: u32) -> Result<Vec<RegistrationRun>> {
        let mut runs: Vec<RegistrationRun> = self
            .fetch_all::<RegistrationRun>()?
            .into_iter()
            .filter(|r| r.registration_id == registration_id)
            .collect();
        runs.sort_by_key(|r| r.registrationrun_id);
        Ok(runs)
    }

    /// Insert the default lookup contents that are not present yet.
    /// Returns the number of rows added.
    pub fn seed_lookups(&mut self) -> Result<usize> {
        let mut added = 0;
        added += self.insert_missing(&lookups::objectives())?;
        added += self.insert_missing(&lookups::fluorophores())?;
        added += self.insert_missing(&lookups::anesthesia())?;
        added += self.insert_missing(&lookups::compartments())?;
        added += self.insert_missing(&lookups::pmt_filter_sets())?;
        added += self.insert_missing(&lookups::pmt_channels())?;
        info!(added, "Seeded lookup tables");
        Ok(added)
    }

    /// Insert the records whose key is absent; existing rows are left untouched.
    pub fn insert_missing<R: Record>(&mut self, records: &[R]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        Self::ensure_table::<R>(&tx)?;
        let mut added = 0;
        for record in records {
            match Self::insert_on(&tx, record) {
                Ok(()) => added += 1,
                Err(VistuneError::DuplicateKey { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        tx.commit()?;
        Ok(added)
    }
}
