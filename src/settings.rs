use crate::agent::Position;
use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Lattice neighborhood used both for walking and for contact checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborhoodType {
    /// 4 neighbors (orthogonal only) - angular, cross-like aggregates
    VonNeumann,
    /// 8 neighbors (orthogonal + diagonal) - natural fractal aggregates
    #[default]
    Moore,
}

impl NeighborhoodType {
    pub fn short_name(&self) -> &str {
        match self {
            NeighborhoodType::VonNeumann => "VonNeumann",
            NeighborhoodType::Moore => "Moore",
        }
    }

    /// Neighbor offsets in the fixed scan order used for tie-breaking
    pub fn offsets(&self) -> &'static [(i32, i32)] {
        match self {
            NeighborhoodType::VonNeumann => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
            NeighborhoodType::Moore => &[
                (-1, -1), (0, -1), (1, -1),
                (-1, 0),          (1, 0),
                (-1, 1),  (0, 1),  (1, 1),
            ],
        }
    }
}

/// Where the root agent is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RootAnchor {
    /// Field center (width / 2, height / 2)
    #[default]
    Center,
    /// Middle of the last row, growing upward like a floor deposit
    BottomCenter,
    /// An explicit cell
    Point { x: usize, y: usize },
}

impl RootAnchor {
    pub fn name(&self) -> &str {
        match self {
            RootAnchor::Center => "Center",
            RootAnchor::BottomCenter => "Bottom Center",
            RootAnchor::Point { .. } => "Point",
        }
    }

    /// Resolve the anchor for a field, or None if it lies outside it
    pub fn resolve(&self, width: usize, height: usize) -> Option<Position> {
        if width == 0 || height == 0 {
            return None;
        }
        let pos = match *self {
            RootAnchor::Center => Position::new(width / 2, height / 2),
            RootAnchor::BottomCenter => Position::new(width / 2, height - 1),
            RootAnchor::Point { x, y } => Position::new(x, y),
        };
        (pos.x < width && pos.y < height).then_some(pos)
    }
}

/// Parameters that shape a field's growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    /// Neighborhood for random-walk moves and contact checks
    pub neighborhood: NeighborhoodType,
    /// Where the root is placed
    pub root_anchor: RootAnchor,
    /// Color assigned to every agent at construction
    pub agent_color: Color,
    /// RNG seed; None draws one from entropy (readable afterwards via `Field::seed`)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            neighborhood: NeighborhoodType::default(),
            root_anchor: RootAnchor::default(),
            agent_color: Color::default(),
            seed: None,
        }
    }
}

impl FieldSettings {
    /// Same settings with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_counts() {
        assert_eq!(NeighborhoodType::VonNeumann.offsets().len(), 4);
        assert_eq!(NeighborhoodType::Moore.offsets().len(), 8);
        assert!(!NeighborhoodType::Moore.offsets().contains(&(0, 0)));
    }

    #[test]
    fn test_anchor_resolution() {
        assert_eq!(RootAnchor::Center.resolve(10, 10), Some(Position::new(5, 5)));
        assert_eq!(RootAnchor::BottomCenter.resolve(10, 8), Some(Position::new(5, 7)));
        assert_eq!(RootAnchor::Point { x: 2, y: 3 }.resolve(10, 10), Some(Position::new(2, 3)));
        assert_eq!(RootAnchor::Point { x: 10, y: 0 }.resolve(10, 10), None);
        assert_eq!(RootAnchor::Center.resolve(0, 10), None);
    }

    #[test]
    fn test_missing_seed_defaults_to_none() {
        let json = r#"{
            "neighborhood": "VonNeumann",
            "root_anchor": { "Point": { "x": 4, "y": 2 } },
            "agent_color": { "r": 0, "g": 255, "b": 0, "a": 255 }
        }"#;
        let settings: FieldSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.seed, None);
        assert_eq!(settings.root_anchor, RootAnchor::Point { x: 4, y: 2 });
        assert_eq!(settings.agent_color, Color::new(0, 255, 0, 255));
    }
}
