//! Mission directory: one optional JSON file per part of the mission.

use serde::de::DeserializeOwned;
use smartlink_core::{Delta, MissionSnapshot};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MissionFile {
    Stations,
    System,
    Ephemeris,
    Topologies,
    Eligibilities,
}

impl MissionFile {
    pub const ALL: [MissionFile; 5] = [
        Self::Stations,
        Self::System,
        Self::Ephemeris,
        Self::Topologies,
        Self::Eligibilities,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Stations => "stations.json",
            Self::System => "system.json",
            Self::Ephemeris => "ephemeris.json",
            Self::Topologies => "topologies.json",
            Self::Eligibilities => "eligibilities.json",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::ALL.into_iter().find(|f| f.file_name() == name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct MissionDir {
    root: PathBuf,
}

impl MissionDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read<T: DeserializeOwned>(&self, file: MissionFile) -> Result<Option<T>, MissionError> {
        let path = self.root.join(file.file_name());
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(MissionError::Read { path, source }),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| MissionError::Parse { path, source })
    }

    /// Reads one part of the mission into `snapshot`; absent files clear it.
    pub fn load_file(
        &self,
        file: MissionFile,
        snapshot: &mut MissionSnapshot,
    ) -> Result<(), MissionError> {
        match file {
            MissionFile::Stations => snapshot.stations = self.read(file)?,
            MissionFile::System => snapshot.system = self.read(file)?,
            MissionFile::Ephemeris => snapshot.ephemeris = self.read(file)?,
            MissionFile::Topologies => snapshot.topologies = self.read(file)?,
            MissionFile::Eligibilities => snapshot.eligibilities = self.read(file)?,
        }
        Ok(())
    }

    pub fn load(&self) -> Result<MissionSnapshot, MissionError> {
        let mut snapshot = MissionSnapshot::default();
        for file in MissionFile::ALL {
            self.load_file(file, &mut snapshot)?;
        }
        Ok(snapshot)
    }

    /// Re-reads `changed` into `snapshot` and returns the deltas a viewer needs,
    /// in stations, satellites, topologies, eligibilities order. A file that
    /// fails to parse keeps its previous content.
    pub fn apply_changes(
        &self,
        snapshot: &mut MissionSnapshot,
        changed: &BTreeSet<MissionFile>,
    ) -> Vec<Delta> {
        let mut reloaded = BTreeSet::new();
        for &file in changed {
            match self.load_file(file, snapshot) {
                Ok(()) => {
                    reloaded.insert(file);
                }
                Err(e) => tracing::warn!(error = ?e, "keeping previous mission file"),
            }
        }

        let mut deltas = Vec::new();
        if reloaded.contains(&MissionFile::Stations) {
            deltas.push(match snapshot.stations.clone() {
                Some(stations) => Delta::SetStations { stations },
                None => Delta::RemoveStations,
            });
        }

        let satellites_changed = reloaded.contains(&MissionFile::System)
            || reloaded.contains(&MissionFile::Ephemeris);
        if satellites_changed {
            deltas.push(match (snapshot.system.clone(), snapshot.ephemeris.clone()) {
                (Some(system), Some(ephemeris)) => Delta::SetSatellites { system, ephemeris },
                _ => Delta::RemoveSatellites,
            });
        }

        if reloaded.contains(&MissionFile::Topologies) {
            deltas.push(Delta::SetTopologies {
                topologies: snapshot.topologies.clone().unwrap_or_default(),
            });
        }

        // Viewers drop eligibilities on new satellites, so resend what is on disk.
        let resend_eligibilities = satellites_changed && snapshot.eligibilities.is_some();
        if reloaded.contains(&MissionFile::Eligibilities) || resend_eligibilities {
            deltas.push(match snapshot.eligibilities.clone() {
                Some(windows) => Delta::SetEligibilities { windows },
                None => Delta::RemoveEligibilities,
            });
        }
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use smartlink_core::{
        EligibilityWindow, EphemerisResponse, FloatDataFormat, Horizon, Location, Station, System,
    };
    use std::fs;
    use tempfile::tempdir;

    fn station(id: u64) -> Station {
        Station {
            id,
            city: "Toulouse".to_string(),
            country: "France".to_string(),
            location: Location {
                longitude_deg: 1.44,
                latitude_deg: 43.6,
                height_m: 0.0,
            },
        }
    }

    fn system() -> System {
        System {
            id: 1,
            name: "demo".to_string(),
            constellations: Vec::new(),
        }
    }

    fn ephemeris() -> EphemerisResponse {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        EphemerisResponse::from_samples(
            Horizon {
                start,
                end: start + chrono::Duration::hours(1),
                step_s: 3600.0,
            },
            FloatDataFormat::default(),
            [(1, vec![[7000.0, 0.0, 0.0], [0.0, 7000.0, 0.0]])],
        )
    }

    fn window() -> EligibilityWindow {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 10, 0).unwrap();
        EligibilityWindow {
            satellite_id: 1,
            station_id: 1,
            start,
            end: start + chrono::Duration::minutes(5),
        }
    }

    fn write<T: serde::Serialize>(dir: &Path, file: MissionFile, value: &T) {
        let json = serde_json::to_string(value).expect("serialize");
        fs::write(dir.join(file.file_name()), json).expect("write");
    }

    fn changed(files: &[MissionFile]) -> BTreeSet<MissionFile> {
        files.iter().copied().collect()
    }

    #[test]
    fn file_names_map_back() {
        for file in MissionFile::ALL {
            let path = Path::new("/data/mission").join(file.file_name());
            assert_eq!(MissionFile::from_path(&path), Some(file));
        }
        assert_eq!(MissionFile::from_path(Path::new("/data/notes.txt")), None);
    }

    #[test]
    fn empty_directory_loads_empty_mission() {
        let dir = tempdir().expect("tempdir");
        let mission = MissionDir::new(dir.path()).load().expect("load");
        assert_eq!(mission, MissionSnapshot::default());
    }

    #[test]
    fn loads_present_files_only() {
        let dir = tempdir().expect("tempdir");
        write(dir.path(), MissionFile::Stations, &vec![station(1), station(2)]);
        write(dir.path(), MissionFile::System, &system());
        write(dir.path(), MissionFile::Ephemeris, &ephemeris());

        let mission = MissionDir::new(dir.path()).load().expect("load");
        assert_eq!(mission.stations.as_ref().map(Vec::len), Some(2));
        assert_eq!(mission.system, Some(system()));
        assert_eq!(mission.ephemeris, Some(ephemeris()));
        assert!(mission.topologies.is_none());
        assert!(mission.eligibilities.is_none());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("stations.json"), "{ not json").expect("write");
        let err = MissionDir::new(dir.path()).load().expect_err("should fail");
        assert!(matches!(err, MissionError::Parse { .. }));
        assert!(err.to_string().contains("stations.json"));
    }

    #[test]
    fn removed_file_becomes_remove_delta() {
        let dir = tempdir().expect("tempdir");
        write(dir.path(), MissionFile::Stations, &vec![station(1)]);
        let mission_dir = MissionDir::new(dir.path());
        let mut snapshot = mission_dir.load().expect("load");

        fs::remove_file(dir.path().join("stations.json")).expect("remove");
        let deltas = mission_dir.apply_changes(&mut snapshot, &changed(&[MissionFile::Stations]));
        assert_eq!(deltas, vec![Delta::RemoveStations]);
        assert!(snapshot.stations.is_none());
    }

    #[test]
    fn satellites_need_system_and_ephemeris() {
        let dir = tempdir().expect("tempdir");
        let mission_dir = MissionDir::new(dir.path());
        let mut snapshot = MissionSnapshot::default();

        write(dir.path(), MissionFile::System, &system());
        let deltas = mission_dir.apply_changes(&mut snapshot, &changed(&[MissionFile::System]));
        assert_eq!(deltas, vec![Delta::RemoveSatellites]);

        write(dir.path(), MissionFile::Ephemeris, &ephemeris());
        let deltas = mission_dir.apply_changes(&mut snapshot, &changed(&[MissionFile::Ephemeris]));
        assert_eq!(
            deltas,
            vec![Delta::SetSatellites {
                system: system(),
                ephemeris: ephemeris(),
            }]
        );
    }

    #[test]
    fn new_satellites_resend_eligibilities() {
        let dir = tempdir().expect("tempdir");
        write(dir.path(), MissionFile::System, &system());
        write(dir.path(), MissionFile::Ephemeris, &ephemeris());
        write(dir.path(), MissionFile::Eligibilities, &vec![window()]);
        let mission_dir = MissionDir::new(dir.path());
        let mut snapshot = mission_dir.load().expect("load");

        let deltas = mission_dir.apply_changes(&mut snapshot, &changed(&[MissionFile::Ephemeris]));
        assert_eq!(deltas.len(), 2);
        assert!(matches!(deltas[0], Delta::SetSatellites { .. }));
        assert_eq!(
            deltas[1],
            Delta::SetEligibilities {
                windows: vec![window()]
            }
        );
    }

    #[test]
    fn broken_update_keeps_previous_content() {
        let dir = tempdir().expect("tempdir");
        write(dir.path(), MissionFile::Stations, &vec![station(1)]);
        let mission_dir = MissionDir::new(dir.path());
        let mut snapshot = mission_dir.load().expect("load");

        fs::write(dir.path().join("stations.json"), "[{").expect("write");
        let deltas = mission_dir.apply_changes(&mut snapshot, &changed(&[MissionFile::Stations]));
        assert!(deltas.is_empty());
        assert_eq!(snapshot.stations, Some(vec![station(1)]));
    }
}
