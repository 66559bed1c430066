use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::player::{Feature, PlayerRecord};
use crate::source::PlayerSource;

const META_COLUMNS: [&str; 5] = ["id", "player", "team", "nationality", "position"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub dataset_id: i64,
    pub players_inserted: usize,
    /// The (league, season) dataset already existed and its players were replaced.
    pub replaced: bool,
}

/// SQLite-backed league datasets, one per (league, season).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Stores a season's rows for a league. Uploading the same league and
    /// season again replaces the previous rows.
    pub fn replace_dataset(
        &mut self,
        league_name: &str,
        season: &str,
        records: &[PlayerRecord],
    ) -> Result<ReplaceSummary> {
        let league_name = league_name.trim();
        let season = season.trim();
        if league_name.is_empty() || season.is_empty() {
            return Err(anyhow!("league name and season are required"));
        }
        if let Some(idx) = records.iter().position(|r| r.player.trim().is_empty()) {
            return Err(anyhow!("row {idx} has an empty player name"));
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction().context("begin dataset transaction")?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT dataset_id FROM datasets WHERE league_name = ?1 AND season = ?2",
                params![league_name, season],
                |row| row.get(0),
            )
            .optional()
            .context("look up dataset")?;

        let dataset_id = match existing {
            Some(id) => {
                tx.execute("DELETE FROM players WHERE dataset_id = ?1", params![id])
                    .context("delete previous players")?;
                tx.execute(
                    "UPDATE datasets SET uploaded_at = ?1 WHERE dataset_id = ?2",
                    params![now, id],
                )
                .context("touch dataset")?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO datasets(league_name, season, uploaded_at) VALUES (?1, ?2, ?3)",
                    params![league_name, season, now],
                )
                .context("insert dataset")?;
                tx.last_insert_rowid()
            }
        };

        let columns: Vec<&str> = ["dataset_id", "player", "team", "nationality", "position"]
            .into_iter()
            .chain(Feature::ALL.iter().map(|f| f.name()))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO players({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        {
            let mut stmt = tx.prepare(&sql).context("prepare player insert")?;
            for record in records {
                stmt.execute(params_from_iter(insert_values(dataset_id, record)))
                    .with_context(|| format!("insert player {}", record.player))?;
            }
        }
        tx.commit().context("commit dataset transaction")?;

        Ok(ReplaceSummary {
            dataset_id,
            players_inserted: records.len(),
            replaced: existing.is_some(),
        })
    }

    fn query_players(&self, where_clause: &str, args: &[&str]) -> Result<Vec<PlayerRecord>> {
        let sql = format!(
            "SELECT {} FROM players p JOIN datasets d ON d.dataset_id = p.dataset_id \
             WHERE {where_clause} ORDER BY p.player ASC, p.id ASC",
            select_columns()
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare player query")?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), decode_player)
            .context("query players")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player row")?);
        }
        Ok(out)
    }
}

impl PlayerSource for SqliteStore {
    fn players_by_season(&self, season: &str) -> Result<Vec<PlayerRecord>> {
        self.query_players("d.season = ?1", &[season.trim()])
    }

    fn player_names_by_position(&self, season: &str, position: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT p.player
                FROM players p JOIN datasets d ON d.dataset_id = p.dataset_id
                WHERE d.season = ?1
                  AND p.position IS NOT NULL
                  AND instr(lower(p.position), lower(?2)) > 0
                ORDER BY p.player ASC
                "#,
            )
            .context("prepare position query")?;
        let rows = stmt
            .query_map(params![season.trim(), position.trim()], |row| row.get::<_, String>(0))
            .context("query players by position")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player name")?);
        }
        Ok(out)
    }

    fn player_detail(&self, season: &str, player: &str) -> Result<Option<PlayerRecord>> {
        Ok(self
            .query_players("d.season = ?1 AND p.player = ?2", &[season.trim(), player])?
            .into_iter()
            .next())
    }

    fn seasons(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT season FROM datasets ORDER BY season ASC")
            .context("prepare seasons query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query seasons")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode season")?);
        }
        Ok(out)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    let stat_columns: String = Feature::ALL
        .iter()
        .map(|f| {
            let ty = if f.is_count() { "INTEGER" } else { "REAL" };
            format!("            {} {ty} NOT NULL DEFAULT 0", f.name())
        })
        .collect::<Vec<_>>()
        .join(",\n");
    let sql = format!(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS datasets (
            dataset_id INTEGER PRIMARY KEY AUTOINCREMENT,
            league_name TEXT NOT NULL,
            season TEXT NOT NULL,
            uploaded_at TEXT NOT NULL,
            UNIQUE(league_name, season)
        );
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dataset_id INTEGER NOT NULL REFERENCES datasets(dataset_id),
            player TEXT NOT NULL,
            team TEXT NULL,
            nationality TEXT NULL,
            position TEXT NULL,
{stat_columns}
        );
        CREATE INDEX IF NOT EXISTS idx_players_dataset ON players(dataset_id);
        CREATE INDEX IF NOT EXISTS idx_players_name ON players(player);
        CREATE INDEX IF NOT EXISTS idx_datasets_season ON datasets(season);
        "#
    );
    conn.execute_batch(&sql).context("create sqlite schema")?;
    Ok(())
}

fn select_columns() -> String {
    META_COLUMNS
        .iter()
        .map(|c| format!("p.{c}"))
        .chain(Feature::ALL.iter().map(|f| format!("p.{}", f.name())))
        .collect::<Vec<_>>()
        .join(", ")
}

fn insert_values(dataset_id: i64, record: &PlayerRecord) -> Vec<Value> {
    let text = |v: &Option<String>| match v.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Value::Text(s.to_string()),
        _ => Value::Null,
    };
    let mut out = vec![
        Value::Integer(dataset_id),
        Value::Text(record.player.trim().to_string()),
        text(&record.team),
        text(&record.nationality),
        text(&record.position),
    ];
    for f in Feature::ALL {
        let v = f.value(record);
        out.push(if f.is_count() {
            Value::Integer(v as i64)
        } else if v.is_finite() {
            Value::Real(v)
        } else {
            Value::Real(0.0)
        });
    }
    out
}

fn decode_player(row: &Row<'_>) -> rusqlite::Result<PlayerRecord> {
    let mut record = PlayerRecord {
        id: row.get(0)?,
        player: row.get(1)?,
        team: row.get(2)?,
        nationality: row.get(3)?,
        position: row.get(4)?,
        ..Default::default()
    };
    for (idx, f) in Feature::ALL.iter().enumerate() {
        let v: f64 = row.get(META_COLUMNS.len() + idx)?;
        record = record.with_stat(*f, v);
    }
    Ok(record)
}
