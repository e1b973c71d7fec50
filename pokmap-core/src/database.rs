//! Spawn lookups against an SQLite export of the EQEmu world schema.

use crate::error::{MapError, Result};
use crate::models::SpawnRecord;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OpenFlags, params};
use std::path::Path;

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open an existing database read-only.
    pub fn new(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MapError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Database not found: {}", path.display()),
            )));
        }
        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX);
        let pool = Pool::builder().max_size(4).build(manager)?;
        Ok(Self { pool })
    }

    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Spawn points of NPCs in `zone` whose name matches the SQL LIKE `name_pattern`.
    ///
    /// Coordinates are game-space; `chance` is the spawn entry's percentage.
    pub fn spawns_for_npc(&self, zone: &str, name_pattern: &str) -> Result<Vec<SpawnRecord>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT s2.x, s2.y, s2.z, se.chance, nt.name, s2.zone
             FROM npc_types nt
             JOIN spawnentry se ON nt.id = se.npcID
             JOIN spawn2 s2 ON se.spawngroupID = s2.spawngroupID
             WHERE s2.zone = ?1 AND nt.name LIKE ?2
             ORDER BY se.chance DESC, nt.name, s2.id",
        )?;

        let spawns = stmt
            .query_map(params![zone, name_pattern], |row| {
                Ok(SpawnRecord {
                    x: row.get(0)?,
                    y: row.get(1)?,
                    z: row.get(2)?,
                    chance: row.get(3)?,
                    npc_name: row.get(4)?,
                    label: None,
                    zone: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Found {} spawn points for '{}' in {}",
            spawns.len(),
            name_pattern,
            zone
        );
        Ok(spawns)
    }

    /// Every spawn point of one NPC type, across zones, ordered by zone.
    pub fn spawns_for_npc_id(&self, npc_id: i64) -> Result<Vec<SpawnRecord>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT s2.x, s2.y, s2.z, se.chance, nt.name, s2.zone
             FROM npc_types nt
             JOIN spawnentry se ON nt.id = se.npcID
             JOIN spawn2 s2 ON se.spawngroupID = s2.spawngroupID
             WHERE nt.id = ?1
             ORDER BY s2.zone, s2.id",
        )?;

        let spawns = stmt
            .query_map(params![npc_id], |row| {
                Ok(SpawnRecord {
                    x: row.get(0)?,
                    y: row.get(1)?,
                    z: row.get(2)?,
                    chance: row.get(3)?,
                    npc_name: row.get(4)?,
                    label: None,
                    zone: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(spawns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn fixture() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peq.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE npc_types (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE spawnentry (spawngroupID INTEGER, npcID INTEGER, chance INTEGER);
            CREATE TABLE spawn2 (id INTEGER PRIMARY KEY, spawngroupID INTEGER, zone TEXT,
                                 x REAL, y REAL, z REAL);

            INSERT INTO npc_types VALUES (1, 'a_gnoll'), (2, 'Fippy_Darkpaw'), (3, 'a_gnoll_pup');
            INSERT INTO spawnentry VALUES (10, 1, 80), (10, 2, 20), (11, 3, 100);
            INSERT INTO spawn2 VALUES (100, 10, 'qeynos2', -120.5, 44.0, 3.0),
                                      (101, 11, 'qeynos2', 10.0, -20.0, NULL),
                                      (102, 10, 'blackburrow', 1.0, 2.0, 3.0);
            "#,
        )
        .unwrap();
        (dir, path)
    }

    #[test]
    fn test_spawns_for_npc_by_zone_and_pattern() {
        let (_dir, path) = fixture();
        let db = Database::new(&path).unwrap();

        let spawns = db.spawns_for_npc("qeynos2", "a_gnoll%").unwrap();
        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[0].npc_name.as_deref(), Some("a_gnoll_pup"));
        assert_eq!(spawns[0].chance, 100.0);
        assert_eq!(spawns[0].z, None);
        assert_eq!(spawns[1].npc_name.as_deref(), Some("a_gnoll"));
        assert_eq!((spawns[1].x, spawns[1].y, spawns[1].z), (-120.5, 44.0, Some(3.0)));
        assert_eq!(spawns[1].chance, 80.0);
        assert!(spawns.iter().all(|s| s.zone.as_deref() == Some("qeynos2")));
    }

    #[test]
    fn test_spawns_for_npc_id_across_zones() {
        let (_dir, path) = fixture();
        let db = Database::new(&path).unwrap();
        let spawns = db.spawns_for_npc_id(2).unwrap();
        let zones: Vec<_> = spawns.iter().map(|s| s.zone.clone().unwrap()).collect();
        assert_eq!(zones, vec!["blackburrow", "qeynos2"]);
        assert!(spawns.iter().all(|s| s.chance == 20.0 && s.label.is_none()));
        assert!(spawns.iter().all(|s| s.npc_name.as_deref() == Some("Fippy_Darkpaw")));
    }

    #[test]
    fn test_missing_database() {
        let result = Database::new(Path::new("/nonexistent/peq.sqlite"));
        assert!(matches!(result, Err(MapError::Io(_))));
    }
}
