//! SQLite-backed implementation of the [`Storage`] trait.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, params};

use crate::{
    combo::NumberSet,
    core::history::Draw,
    favorites::FavoriteFilter,
    op::{SideOp, StoredOp},
    suggestions::SavedSuggestion,
    types::OpSeq,
};

use super::{PersistError, PersistResult, PersistedState, Storage};

/// SQLite implementation of [`crate::persist::Storage`].
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    fn apply_one(tx: &rusqlite::Transaction<'_>, op: &SideOp) -> PersistResult<()> {
        match op {
            SideOp::AppendDraw { draw } => {
                tx.execute(
                    "INSERT OR REPLACE INTO draws(contest_number, draw_date, numbers)
                     VALUES (?1, ?2, ?3)",
                    params![
                        i64::from(draw.contest_number),
                        draw.date.to_string(),
                        encode_numbers(draw.numbers)?,
                    ],
                )?;
            }
            SideOp::RemoveDraw { contest_number } => {
                tx.execute(
                    "DELETE FROM draws WHERE contest_number = ?1",
                    params![i64::from(*contest_number)],
                )?;
            }
            SideOp::PurgeDraws => {
                tx.execute("DELETE FROM draws", [])?;
            }
            SideOp::SaveFavorite { favorite, replaced } => {
                if let Some(old) = replaced {
                    tx.execute("DELETE FROM favorites WHERE id = ?1", params![*old as i64])?;
                }
                tx.execute(
                    "INSERT OR REPLACE INTO favorites(id, name, spec_json, created_at_ms)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        favorite.id as i64,
                        favorite.name,
                        favorite.spec_json,
                        favorite.created_at_ms as i64,
                    ],
                )?;
            }
            SideOp::DeleteFavorite { id } => {
                tx.execute("DELETE FROM favorites WHERE id = ?1", params![*id as i64])?;
            }
            SideOp::SaveSuggestion { suggestion } => {
                tx.execute(
                    "INSERT OR REPLACE INTO suggestions(id, numbers, kind, match_score, created_at_ms)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        suggestion.id as i64,
                        encode_numbers(suggestion.numbers)?,
                        suggestion.kind,
                        i64::from(suggestion.match_score),
                        suggestion.created_at_ms as i64,
                    ],
                )?;
            }
            SideOp::DeleteSuggestion { id } => {
                tx.execute("DELETE FROM suggestions WHERE id = ?1", params![*id as i64])?;
            }
            SideOp::ClearSuggestions => {
                tx.execute("DELETE FROM suggestions", [])?;
            }
        }
        Ok(())
    }

    fn load_draws(&self) -> PersistResult<Vec<Draw>> {
        let mut stmt = self.conn.prepare(
            "SELECT contest_number, draw_date, numbers FROM draws ORDER BY contest_number ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let contest: i64 = row.get(0)?;
            let date: String = row.get(1)?;
            let numbers: String = row.get(2)?;
            Ok((contest, date, numbers))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (contest, date, numbers) = row?;
            out.push(Draw {
                contest_number: contest as u32,
                date: date
                    .parse::<NaiveDate>()
                    .map_err(|e| PersistError::Message(format!("bad draw date: {e}")))?,
                numbers: decode_numbers(&numbers)?,
            });
        }
        Ok(out)
    }

    fn load_favorites(&self) -> PersistResult<Vec<FavoriteFilter>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, spec_json, created_at_ms FROM favorites ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(FavoriteFilter {
                id: row.get::<_, i64>(0)? as u64,
                name: row.get(1)?,
                spec_json: row.get(2)?,
                created_at_ms: row.get::<_, i64>(3)? as u64,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn load_suggestions(&self) -> PersistResult<Vec<SavedSuggestion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, numbers, kind, match_score, created_at_ms
             FROM suggestions ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let numbers: String = row.get(1)?;
            let kind: String = row.get(2)?;
            let match_score: i64 = row.get(3)?;
            let created_at_ms: i64 = row.get(4)?;
            Ok((id, numbers, kind, match_score, created_at_ms))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, numbers, kind, match_score, created_at_ms) = row?;
            out.push(SavedSuggestion {
                id: id as u64,
                numbers: decode_numbers(&numbers)?,
                kind,
                match_score: match_score as u8,
                created_at_ms: created_at_ms as u64,
            });
        }
        Ok(out)
    }
}

impl Storage for SqliteStorage {
    fn apply_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq> {
        if ops.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        for stored in ops {
            Self::apply_one(&tx, &stored.op)?;
        }
        tx.commit()?;

        Ok(ops.last().map(|o| o.seq).unwrap_or(0))
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }

    fn load(&self) -> PersistResult<PersistedState> {
        Ok(PersistedState {
            draws: self.load_draws()?,
            favorites: self.load_favorites()?,
            suggestions: self.load_suggestions()?,
        })
    }
}

fn encode_numbers(numbers: NumberSet) -> PersistResult<String> {
    Ok(serde_json::to_string(&numbers)?)
}

fn decode_numbers(payload: &str) -> PersistResult<NumberSet> {
    Ok(serde_json::from_str(payload)?)
}
