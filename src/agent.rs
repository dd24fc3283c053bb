use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Lattice coordinate inside a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Apply a lattice offset, returning None when the result leaves the field
    pub fn offset(self, dx: i32, dy: i32, width: usize, height: usize) -> Option<Position> {
        let nx = self.x as i64 + dx as i64;
        let ny = self.y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
            return None;
        }
        Some(Position::new(nx as usize, ny as usize))
    }
}

/// Lifecycle of an agent. Wandering -> Stuck is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    Wandering,
    Stuck,
}

/// Position of the stuck agent a newly stuck agent bonded to.
///
/// This is a back-reference by coordinate, not an owning link: the referenced
/// agent is resolved through the field's occupancy index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StickyNeighbor {
    pub x: usize,
    pub y: usize,
}

impl StickyNeighbor {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

impl From<Position> for StickyNeighbor {
    fn from(pos: Position) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

/// A single particle in the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agent {
    position: Position,
    state: AgentState,
    color: Color,
    sticky_neighbor: Option<StickyNeighbor>,
}

impl Agent {
    pub(crate) fn wandering(position: Position, color: Color) -> Self {
        Self {
            position,
            state: AgentState::Wandering,
            color,
            sticky_neighbor: None,
        }
    }

    /// The attachment origin: stuck, with nothing to point at
    pub(crate) fn root(position: Position, color: Color) -> Self {
        Self {
            position,
            state: AgentState::Stuck,
            color,
            sticky_neighbor: None,
        }
    }

    pub(crate) fn from_parts(
        position: Position,
        state: AgentState,
        color: Color,
        sticky_neighbor: Option<StickyNeighbor>,
    ) -> Self {
        Self {
            position,
            state,
            color,
            sticky_neighbor,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn x(&self) -> usize {
        self.position.x
    }

    pub fn y(&self) -> usize {
        self.position.y
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn is_stuck(&self) -> bool {
        self.state == AgentState::Stuck
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn sticky_neighbor(&self) -> Option<StickyNeighbor> {
        self.sticky_neighbor
    }

    pub(crate) fn move_to(&mut self, position: Position) {
        debug_assert!(!self.is_stuck(), "stuck agents never move");
        self.position = position;
    }

    pub(crate) fn stick_to(&mut self, neighbor: Position) {
        debug_assert!(!self.is_stuck(), "attachment is irreversible");
        self.state = AgentState::Stuck;
        self.sticky_neighbor = Some(neighbor.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_rejects_out_of_bounds() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.offset(-1, 0, 10, 10), None);
        assert_eq!(origin.offset(0, -1, 10, 10), None);
        assert_eq!(origin.offset(1, 1, 10, 10), Some(Position::new(1, 1)));

        let corner = Position::new(9, 9);
        assert_eq!(corner.offset(1, 0, 10, 10), None);
        assert_eq!(corner.offset(0, 1, 10, 10), None);
    }

    #[test]
    fn test_stick_records_neighbor() {
        let mut agent = Agent::wandering(Position::new(3, 4), Color::default());
        assert_eq!(agent.sticky_neighbor(), None);

        agent.stick_to(Position::new(3, 5));
        assert!(agent.is_stuck());
        assert_eq!(agent.sticky_neighbor(), Some(StickyNeighbor { x: 3, y: 5 }));
    }

    #[test]
    fn test_root_is_stuck_without_neighbor() {
        let root = Agent::root(Position::new(5, 5), Color::default());
        assert_eq!(root.state(), AgentState::Stuck);
        assert!(root.sticky_neighbor().is_none());
    }
}
