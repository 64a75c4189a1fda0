// ═══════════════════════════════════════════════════════════════════════
// Database: SQLite storage for resolution outcomes and commander records
// ═══════════════════════════════════════════════════════════════════════

use crate::error::Result;
use crate::runner::ResolutionResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Win/draw/loss record of one commander kind across stored resolutions.
#[derive(Debug, Clone, PartialEq)]
pub struct CommanderRecord {
    pub name: String,
    pub sides: u32,
    pub wins: u32,
    pub draws: u32,
}

impl CommanderRecord {
    pub fn win_rate(&self) -> f64 {
        if self.sides == 0 { 0.0 } else { f64::from(self.wins) / f64::from(self.sides) }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database { conn: Connection::open(path)? };
        db.create_schema()?;
        Ok(db)
    }

    /// In-memory database (useful for tests).
    pub fn in_memory() -> Result<Self> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch("
            CREATE TABLE IF NOT EXISTS commanders (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                sides       INTEGER NOT NULL DEFAULT 0,
                wins        INTEGER NOT NULL DEFAULT 0,
                draws       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS resolutions (
                id              INTEGER PRIMARY KEY,
                scenario        TEXT NOT NULL,
                seed            INTEGER NOT NULL,
                rounds          INTEGER NOT NULL,
                victory_team    INTEGER,
                victory_player  INTEGER,
                timed_out       INTEGER NOT NULL,
                decisions       INTEGER NOT NULL,
                resolved_at     TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS resolution_sides (
                id              INTEGER PRIMARY KEY,
                resolution_id   INTEGER NOT NULL REFERENCES resolutions(id),
                commander_id    INTEGER NOT NULL REFERENCES commanders(id),
                player          INTEGER NOT NULL,
                team            INTEGER NOT NULL,
                survivors       INTEGER NOT NULL,
                hit_points      INTEGER NOT NULL,
                losses          INTEGER NOT NULL
            );
        ")?;
        Ok(())
    }

    /// Register a commander kind (or return the existing id).
    pub fn register_commander(&self, name: &str) -> Result<i64> {
        commander_id(&self.conn, name)
    }

    /// Store a completed resolution and update commander records.
    pub fn store_resolution(&mut self, result: &ResolutionResult) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO resolutions (scenario, seed, rounds, victory_team, victory_player, timed_out, decisions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                result.scenario,
                result.seed as i64,
                result.rounds,
                result.victory_team.map(|t| t.0),
                result.victory_player.map(|p| p.0),
                result.timed_out,
                result.decisions as i64,
            ],
        )?;
        let resolution_id = tx.last_insert_rowid();

        for side in &result.sides {
            let commander = commander_id(&tx, &side.commander)?;
            tx.execute(
                "INSERT INTO resolution_sides (resolution_id, commander_id, player, team, survivors, hit_points, losses)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    resolution_id,
                    commander,
                    side.player.0,
                    side.team.0,
                    side.survivors as i64,
                    side.remaining_hit_points,
                    side.losses as i64,
                ],
            )?;

            let won = result.victory_team == Some(side.team);
            let drew = result.victory_team.is_none();
            tx.execute(
                "UPDATE commanders SET sides = sides + 1, wins = wins + ?1, draws = draws + ?2 WHERE id = ?3",
                params![i64::from(won), i64::from(drew), commander],
            )?;
        }

        tx.commit()?;
        Ok(resolution_id)
    }

    /// Commander records, best win rate first.
    pub fn leaderboard(&self) -> Result<Vec<CommanderRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, sides, wins, draws FROM commanders
             ORDER BY CAST(wins AS REAL) / MAX(sides, 1) DESC, name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CommanderRecord {
                name: row.get(0)?,
                sides: row.get(1)?,
                wins: row.get(2)?,
                draws: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// How often each team won a scenario; `None` counts draws.
    pub fn team_outcomes(&self, scenario: &str) -> Result<Vec<(Option<u32>, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT victory_team, COUNT(*) FROM resolutions WHERE scenario = ?1
             GROUP BY victory_team ORDER BY victory_team",
        )?;
        let rows = stmt.query_map(params![scenario], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Average rounds to a verdict for a scenario, if any were stored.
    pub fn average_rounds(&self, scenario: &str) -> Result<Option<f64>> {
        let avg = self.conn.query_row(
            "SELECT AVG(rounds) FROM resolutions WHERE scenario = ?1",
            params![scenario],
            |row| row.get::<_, Option<f64>>(0),
        ).optional()?;
        Ok(avg.flatten())
    }

    /// Total number of resolutions stored.
    pub fn resolution_count(&self) -> Result<u32> {
        let count = self.conn.query_row("SELECT COUNT(*) FROM resolutions", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Id of the named commander, inserting it on first sight.
fn commander_id(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT OR IGNORE INTO commanders (name) VALUES (?1)", params![name])?;
    let id = conn.query_row(
        "SELECT id FROM commanders WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(id)
}
