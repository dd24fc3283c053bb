use crate::agent::{Agent, AgentState, Position, StickyNeighbor};
use crate::color::Color;
use crate::error::FieldError;
use crate::field::Field;
use crate::settings::FieldSettings;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// One agent as exchanged with persistence layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: usize,
    pub y: usize,
    pub color: Color,
    #[serde(default)]
    pub sticky_neighbor: Option<StickyNeighbor>,
    /// Explicit lifecycle state. When absent it is inferred from the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<AgentState>,
}

impl From<&Agent> for PointRecord {
    fn from(agent: &Agent) -> Self {
        Self {
            x: agent.x(),
            y: agent.y(),
            color: agent.color(),
            sticky_neighbor: agent.sticky_neighbor(),
            state: Some(agent.state()),
        }
    }
}

impl Field {
    /// Export every agent, in insertion order
    pub fn to_records(&self) -> Vec<PointRecord> {
        self.agents().iter().map(PointRecord::from).collect()
    }

    /// Rebuild a field from records with default settings, without replaying diffusion
    pub fn from_records(
        width: usize,
        height: usize,
        records: &[PointRecord],
    ) -> Result<Field, FieldError> {
        Self::from_records_with_settings(width, height, records, FieldSettings::default())
    }

    /// Rebuild a field from records.
    ///
    /// Records are validated as a whole: every position must be in bounds and
    /// unique, exactly one stuck record may lack a sticky neighbor (the root),
    /// and every link must resolve to another stuck record without looping.
    /// Any violation rejects the snapshot with `DataCorruption`.
    ///
    /// Records without an explicit state are stuck when they carry a link; the
    /// first link-less one is taken as the root and the rest as wandering.
    pub fn from_records_with_settings(
        width: usize,
        height: usize,
        records: &[PointRecord],
        settings: FieldSettings,
    ) -> Result<Field, FieldError> {
        if width == 0 || height == 0 || width.checked_mul(height).is_none() {
            return Err(FieldError::dimensions(format!(
                "cannot rebuild a {}x{} field",
                width, height
            )));
        }
        if records.is_empty() {
            return Err(FieldError::dimensions("snapshot holds no agents"));
        }

        let mut index: HashMap<Position, usize> = HashMap::with_capacity(records.len());
        let mut agents = Vec::with_capacity(records.len());
        let mut root = None;

        for (i, record) in records.iter().enumerate() {
            let pos = Position::new(record.x, record.y);
            if pos.x >= width || pos.y >= height {
                return Err(FieldError::corruption(
                    i,
                    format!("position ({}, {}) lies outside the field", pos.x, pos.y),
                ));
            }
            if let Some(first) = index.insert(pos, i) {
                return Err(FieldError::corruption(
                    i,
                    format!("position ({}, {}) already used by record {}", pos.x, pos.y, first),
                ));
            }

            let state = match (record.state, record.sticky_neighbor) {
                (Some(state), _) => state,
                (None, Some(_)) => AgentState::Stuck,
                (None, None) if root.is_none() => AgentState::Stuck,
                (None, None) => AgentState::Wandering,
            };
            match (state, record.sticky_neighbor) {
                (AgentState::Wandering, Some(_)) => {
                    return Err(FieldError::corruption(
                        i,
                        "wandering agent carries a sticky neighbor",
                    ));
                }
                (AgentState::Stuck, None) => {
                    if let Some(existing) = root {
                        return Err(FieldError::corruption(
                            i,
                            format!("second root (record {} is already the root)", existing),
                        ));
                    }
                    root = Some(i);
                }
                _ => {}
            }

            agents.push(Agent::from_parts(pos, state, record.color, record.sticky_neighbor));
        }

        let root = root.ok_or_else(|| FieldError::corruption(0, "no root record"))?;

        for (i, agent) in agents.iter().enumerate() {
            let Some(link) = agent.sticky_neighbor() else {
                continue;
            };
            match index.get(&link.position()) {
                None => {
                    return Err(FieldError::corruption(
                        i,
                        format!("sticky neighbor ({}, {}) is not in the snapshot", link.x, link.y),
                    ));
                }
                Some(&target) if !agents[target].is_stuck() => {
                    return Err(FieldError::corruption(
                        i,
                        format!("sticky neighbor ({}, {}) is not stuck", link.x, link.y),
                    ));
                }
                Some(_) => {}
            }
        }

        let distances = resolve_distances(&agents, &index, root)?;

        let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
        debug!(
            width,
            height,
            records = records.len(),
            root,
            "rebuilding field from records"
        );
        Ok(Field::assemble(
            width,
            height,
            agents,
            root,
            distances,
            settings,
            seed,
            ChaCha8Rng::seed_from_u64(seed),
        ))
    }
}

/// Root distance for every stuck agent, rejecting loops
fn resolve_distances(
    agents: &[Agent],
    index: &HashMap<Position, usize>,
    root: usize,
) -> Result<Vec<Option<usize>>, FieldError> {
    let mut distances = vec![None; agents.len()];
    let mut visiting = vec![false; agents.len()];
    distances[root] = Some(0);

    for start in 0..agents.len() {
        if !agents[start].is_stuck() || distances[start].is_some() {
            continue;
        }

        let mut chain = Vec::new();
        let mut current = start;
        let base = loop {
            if let Some(distance) = distances[current] {
                break distance;
            }
            if visiting[current] {
                return Err(FieldError::corruption(
                    start,
                    "sticky chain loops back on itself",
                ));
            }
            visiting[current] = true;
            chain.push(current);

            let next = agents[current]
                .sticky_neighbor()
                .and_then(|link| index.get(&link.position()).copied());
            let Some(next) = next else {
                return Err(FieldError::corruption(current, "sticky chain is broken"));
            };
            current = next;
        };

        for (hops, &idx) in chain.iter().rev().enumerate() {
            distances[idx] = Some(base + hops + 1);
        }
    }

    Ok(distances)
}

/// Failures reading or writing snapshot files
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode or decode snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Self-describing snapshot document: dimensions, settings and records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub version: u32,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub settings: FieldSettings,
    /// Ticks the captured field had advanced
    #[serde(default)]
    pub tick: u64,
    pub records: Vec<PointRecord>,
}

impl FieldSnapshot {
    pub const VERSION: u32 = 1;

    /// Capture a field; the settings record the seed actually used
    pub fn capture(field: &Field) -> Self {
        Self {
            version: Self::VERSION,
            width: field.get_width(),
            height: field.get_height(),
            settings: FieldSettings {
                seed: Some(field.seed()),
                ..field.settings().clone()
            },
            tick: field.tick(),
            records: field.to_records(),
        }
    }

    /// Rebuild the captured field; its tick counter resumes from the snapshot
    pub fn restore(&self) -> Result<Field, FieldError> {
        let mut field = Field::from_records_with_settings(
            self.width,
            self.height,
            &self.records,
            self.settings.clone(),
        )?;
        field.resume_at(self.tick);
        Ok(field)
    }

    /// Write the snapshot as JSON, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        let snapshot: FieldSnapshot = serde_json::from_str(&content)?;
        if snapshot.version != Self::VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology;
    use tempfile::NamedTempFile;

    fn record(x: usize, y: usize, link: Option<(usize, usize)>) -> PointRecord {
        PointRecord {
            x,
            y,
            color: Color::default(),
            sticky_neighbor: link.map(|(x, y)| StickyNeighbor { x, y }),
            state: None,
        }
    }

    fn assert_corrupt(result: Result<Field, FieldError>) {
        match result {
            Err(FieldError::DataCorruption { .. }) => {}
            other => panic!("expected DataCorruption, got {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_completed_field() {
        let mut field = Field::with_settings(40, 15, 15, FieldSettings::seeded(21)).unwrap();
        while field.next_state() {}

        let records = field.to_records();
        let restored = Field::from_records(15, 15, &records).unwrap();

        assert_eq!(restored.agents(), field.agents());
        assert_eq!(restored.root_index(), 0);
        assert!(restored.is_complete());
        for agent in restored.agents() {
            assert_eq!(
                restored.get_distance_from_root(agent),
                field.get_distance_from_root(agent)
            );
        }
        assert_eq!(topology::find_tallest(&restored), topology::find_tallest(&field));
    }

    #[test]
    fn test_round_trip_mid_run_keeps_wanderers() {
        let mut field = Field::with_settings(30, 20, 20, FieldSettings::seeded(5)).unwrap();
        for _ in 0..10 {
            field.next_state();
        }

        let mut restored =
            Field::from_records_with_settings(20, 20, &field.to_records(), FieldSettings::seeded(5))
                .unwrap();
        assert_eq!(restored.agents(), field.agents());
        assert_eq!(restored.wandering_count(), field.wandering_count());

        while restored.next_state() {}
        assert_eq!(restored.wandering_count(), 0);
    }

    #[test]
    fn test_states_inferred_when_missing() {
        let records = [
            record(2, 2, None),
            record(2, 3, Some((2, 2))),
            record(0, 0, None),
        ];
        let field = Field::from_records(5, 5, &records).unwrap();

        assert_eq!(field.root_index(), 0);
        assert_eq!(field.get_agent_at(1).unwrap().state(), AgentState::Stuck);
        assert_eq!(field.get_agent_at(2).unwrap().state(), AgentState::Wandering);
        assert_eq!(field.distance_at(1).unwrap(), Some(1));
    }

    #[test]
    fn test_root_may_sit_at_any_index() {
        let records = [
            record(1, 1, Some((1, 2))),
            record(1, 2, Some((1, 3))),
            record(1, 3, None),
        ];
        let field = Field::from_records(4, 4, &records).unwrap();
        assert_eq!(field.root_index(), 2);
        assert_eq!(field.distance_at(0).unwrap(), Some(2));
    }

    #[test]
    fn test_dangling_link_rejected() {
        let records = [record(5, 5, None), record(5, 6, Some((7, 7)))];
        match Field::from_records(10, 10, &records) {
            Err(FieldError::DataCorruption { record, .. }) => assert_eq!(record, 1),
            other => panic!("expected DataCorruption, got {:?}", other),
        }
    }

    #[test]
    fn test_link_to_wanderer_rejected() {
        let mut wanderer = record(4, 4, None);
        wanderer.state = Some(AgentState::Wandering);
        let records = [record(5, 5, None), wanderer, record(4, 3, Some((4, 4)))];
        assert_corrupt(Field::from_records(10, 10, &records));
    }

    #[test]
    fn test_cycle_rejected() {
        let records = [
            record(5, 5, None),
            record(1, 1, Some((2, 2))),
            record(2, 2, Some((1, 1))),
        ];
        assert_corrupt(Field::from_records(10, 10, &records));
    }

    #[test]
    fn test_structural_corruption_rejected() {
        // duplicate position
        assert_corrupt(Field::from_records(
            10,
            10,
            &[record(5, 5, None), record(5, 5, Some((5, 5)))],
        ));
        // out of bounds
        assert_corrupt(Field::from_records(10, 10, &[record(5, 5, None), record(10, 2, None)]));
        // no root
        let mut lone = record(3, 3, None);
        lone.state = Some(AgentState::Wandering);
        assert_corrupt(Field::from_records(10, 10, &[lone]));
        // two roots
        let mut second = record(1, 1, None);
        second.state = Some(AgentState::Stuck);
        assert_corrupt(Field::from_records(10, 10, &[record(5, 5, None), second]));
        // wandering with a link
        let mut linked = record(5, 4, Some((5, 5)));
        linked.state = Some(AgentState::Wandering);
        assert_corrupt(Field::from_records(10, 10, &[record(5, 5, None), linked]));
    }

    #[test]
    fn test_empty_records_rejected() {
        assert!(matches!(
            Field::from_records(10, 10, &[]),
            Err(FieldError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Field::from_records(0, 10, &[record(0, 0, None)]),
            Err(FieldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"[
            {"x": 5, "y": 5, "color": {"r": 255, "g": 0, "b": 0, "a": 100}, "sticky_neighbor": null},
            {"x": 5, "y": 6, "color": {"r": 255, "g": 0, "b": 0, "a": 100}, "sticky_neighbor": {"x": 5, "y": 5}},
            {"x": 1, "y": 1, "color": {"r": 255, "g": 0, "b": 0, "a": 100}}
        ]"#;
        let records: Vec<PointRecord> = serde_json::from_str(json).unwrap();
        let field = Field::from_records(10, 10, &records).unwrap();
        assert_eq!(field.stuck_count(), 2);
        assert_eq!(field.wandering_count(), 1);
    }

    #[test]
    fn test_snapshot_file_save_and_load() {
        let mut field = Field::with_settings(20, 12, 12, FieldSettings::seeded(77)).unwrap();
        while field.next_state() {}

        let snapshot = FieldSnapshot::capture(&field);
        assert_eq!(snapshot.settings.seed, Some(77));

        let temp_file = NamedTempFile::new().unwrap();
        snapshot.save_to_file(temp_file.path()).unwrap();

        let loaded = FieldSnapshot::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, snapshot);

        let restored = loaded.restore().unwrap();
        assert_eq!(restored.agents(), field.agents());
        assert_eq!(restored.seed(), 77);
        assert_eq!(restored.tick(), field.tick());
    }

    #[test]
    fn test_restored_field_keeps_counting_ticks() {
        let mut field = Field::with_settings(60, 30, 30, FieldSettings::seeded(13)).unwrap();
        for _ in 0..25 {
            field.next_state();
        }
        assert_eq!(field.tick(), 25);

        let snapshot = FieldSnapshot::capture(&field);
        assert_eq!(snapshot.tick, 25);

        let mut restored = snapshot.restore().unwrap();
        assert_eq!(restored.tick(), 25);
        restored.next_state();
        assert_eq!(restored.tick(), 26);

        // Documents written without a tick count start from zero
        let json = r#"{"version": 1, "width": 4, "height": 4,
            "records": [{"x": 2, "y": 2, "color": {"r": 255, "g": 0, "b": 0, "a": 100}}]}"#;
        let legacy: FieldSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(legacy.restore().unwrap().tick(), 0);
    }

    #[test]
    fn test_snapshot_file_errors() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();
        assert!(matches!(
            FieldSnapshot::load_from_file(temp_file.path()),
            Err(SnapshotError::Json(_))
        ));

        std::fs::write(
            temp_file.path(),
            r#"{"version": 9, "width": 1, "height": 1, "records": []}"#,
        )
        .unwrap();
        assert!(matches!(
            FieldSnapshot::load_from_file(temp_file.path()),
            Err(SnapshotError::UnsupportedVersion(9))
        ));

        assert!(matches!(
            FieldSnapshot::load_from_file(Path::new("/nonexistent/path/snapshot.json")),
            Err(SnapshotError::Io(_))
        ));
    }
}
