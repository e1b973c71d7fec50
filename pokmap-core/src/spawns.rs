//! Spawn record loading from CSV exports.

use crate::error::Result;
use crate::models::SpawnRecord;
use std::path::Path;

/// Read spawn records from a CSV file with a `x,y,z,chance,npc_name,label`
/// header. `z`, `npc_name` and `label` may be empty.
pub fn load_spawns_csv(path: &Path) -> Result<Vec<SpawnRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut spawns = Vec::new();
    for result in reader.deserialize() {
        let record: SpawnRecord = result?;
        spawns.push(record);
    }
    tracing::debug!("Loaded {} spawn records from {:?}", spawns.len(), path);
    Ok(spawns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;

    #[test]
    fn test_load_spawns_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spawns.csv");
        std::fs::write(
            &path,
            "x,y,z,chance,npc_name,label\n-120.5, 44, 3, 80, a_gnoll, camp\n10,-20,,100,,\n",
        )
        .unwrap();

        let spawns = load_spawns_csv(&path).unwrap();
        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[0].x, -120.5);
        assert_eq!(spawns[0].z, Some(3.0));
        assert_eq!(spawns[0].npc_name.as_deref(), Some("a_gnoll"));
        assert_eq!(spawns[0].label.as_deref(), Some("camp"));
        assert_eq!(spawns[1].z, None);
        assert_eq!(spawns[1].npc_name, None);
        assert_eq!(spawns[1].chance, 100.0);
        assert!(spawns.iter().all(|s| s.zone.is_none()));
    }

    #[test]
    fn test_load_spawns_csv_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spawns.csv");
        std::fs::write(&path, "x,y,z,chance,npc_name,label\nnorth,1,2,3,a,b\n").unwrap();
        assert!(matches!(load_spawns_csv(&path), Err(MapError::Csv(_))));
    }
}
