//! Walks over the sticky-neighbor links of a field's aggregate.
//!
//! `Field` caches each agent's root distance when it sticks; the functions
//! here recompute it by following links, which is what reconstruction
//! validation and renderers needing whole chains rely on.

use crate::agent::Position;
use crate::field::{CellState, Field};

/// Hops from the agent at `index` back to the root, by walking links.
///
/// Returns None for wandering agents, out-of-range indices, and chains that
/// dangle or run longer than the agent count.
pub fn distance_by_walk(field: &Field, index: usize) -> Option<usize> {
    path_to_root(field, index).map(|path| path.len() - 1)
}

/// Positions visited from the agent at `index` to the root, both included
pub fn path_to_root(field: &Field, index: usize) -> Option<Vec<Position>> {
    let mut agent = field.get_agent_at(index).ok()?;
    if !agent.is_stuck() {
        return None;
    }

    let mut path = vec![agent.position()];
    while let Some(link) = agent.sticky_neighbor() {
        if path.len() > field.get_num_agents() {
            return None;
        }
        agent = field.agent_at_position(link.x, link.y)?;
        if !agent.is_stuck() {
            return None;
        }
        path.push(agent.position());
    }
    Some(path)
}

/// Longest sticky chain in the aggregate
pub fn find_tallest(field: &Field) -> usize {
    field
        .agents()
        .iter()
        .filter_map(|agent| field.get_distance_from_root(agent))
        .max()
        .unwrap_or(0)
}

/// Number of stuck cells, counted from the lattice
pub fn stuck_count(field: &Field) -> usize {
    count_cells(field, |state| state == CellState::Stuck)
}

/// Number of non-empty cells (wandering or stuck)
pub fn occupied_count(field: &Field) -> usize {
    count_cells(field, |state| state != CellState::Empty)
}

fn count_cells(field: &Field, predicate: impl Fn(CellState) -> bool) -> usize {
    let mut count = 0;
    for y in 0..field.get_height() {
        for x in 0..field.get_width() {
            if field.cell_state(x, y).is_some_and(&predicate) {
                count += 1;
            }
        }
    }
    count
}
