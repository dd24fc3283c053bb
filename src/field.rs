use crate::agent::{Agent, Position};
use crate::error::FieldError;
use crate::settings::FieldSettings;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::{debug, info, trace};

/// What a single lattice cell currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Empty,
    /// Holds a wandering agent
    Occupied,
    Stuck,
}

/// DLA field: a bounded lattice, its agents and the aggregate rooted at the anchor
#[derive(Debug, Clone)]
pub struct Field {
    width: usize,
    height: usize,
    /// Insertion order is creation order; indices are stable
    agents: Vec<Agent>,
    root: usize,
    /// Occupancy index: cell -> agent index (None = empty)
    cells: Vec<Option<usize>>,
    /// Root distance per agent, filled when the agent sticks
    distances: Vec<Option<usize>>,
    /// Indices of agents still wandering, ascending
    wandering: Vec<usize>,
    settings: FieldSettings,
    seed: u64,
    rng: ChaCha8Rng,
    tick: u64,
    complete: bool,
}

impl Field {
    /// Create a field with default settings and an entropy seed
    pub fn new(agent_count: usize, width: usize, height: usize) -> Result<Self, FieldError> {
        Self::with_settings(agent_count, width, height, FieldSettings::default())
    }

    /// Create a field, scattering `agent_count - 1` wandering agents over free cells
    pub fn with_settings(
        agent_count: usize,
        width: usize,
        height: usize,
        settings: FieldSettings,
    ) -> Result<Self, FieldError> {
        if agent_count == 0 {
            return Err(FieldError::dimensions("agent count must be at least 1"));
        }
        let root_pos = Self::check_bounds(width, height, &settings)?;
        let area = width * height;
        if agent_count > area {
            return Err(FieldError::dimensions(format!(
                "{} agents do not fit in a {}x{} field",
                agent_count, width, height
            )));
        }

        let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        // Sample distinct cells from everything except the root's cell
        let root_cell = root_pos.y * width + root_pos.x;
        let positions: Vec<Position> = index::sample(&mut rng, area - 1, agent_count - 1)
            .into_iter()
            .map(|i| {
                let cell = if i >= root_cell { i + 1 } else { i };
                Position::new(cell % width, cell / width)
            })
            .collect();

        Ok(Self::populate(width, height, root_pos, &positions, settings, seed, rng))
    }

    /// Create a field with wandering agents at designated cells, in the given order
    pub fn with_positions(
        width: usize,
        height: usize,
        positions: &[Position],
        settings: FieldSettings,
    ) -> Result<Self, FieldError> {
        let root_pos = Self::check_bounds(width, height, &settings)?;

        let mut seen = HashSet::with_capacity(positions.len() + 1);
        seen.insert(root_pos);
        for &pos in positions {
            if pos.x >= width || pos.y >= height {
                return Err(FieldError::dimensions(format!(
                    "start position ({}, {}) lies outside the {}x{} field",
                    pos.x, pos.y, width, height
                )));
            }
            if !seen.insert(pos) {
                return Err(FieldError::dimensions(format!(
                    "start position ({}, {}) is already taken",
                    pos.x, pos.y
                )));
            }
        }

        let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(Self::populate(width, height, root_pos, positions, settings, seed, rng))
    }

    fn check_bounds(
        width: usize,
        height: usize,
        settings: &FieldSettings,
    ) -> Result<Position, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::dimensions(format!(
                "width and height must be positive, got {}x{}",
                width, height
            )));
        }
        if width.checked_mul(height).is_none() {
            return Err(FieldError::dimensions(format!(
                "{}x{} field is too large",
                width, height
            )));
        }
        settings.root_anchor.resolve(width, height).ok_or_else(|| {
            FieldError::dimensions(format!(
                "root anchor {:?} lies outside the {}x{} field",
                settings.root_anchor, width, height
            ))
        })
    }

    fn populate(
        width: usize,
        height: usize,
        root_pos: Position,
        positions: &[Position],
        settings: FieldSettings,
        seed: u64,
        rng: ChaCha8Rng,
    ) -> Self {
        let color = settings.agent_color;
        let mut agents = Vec::with_capacity(positions.len() + 1);
        agents.push(Agent::root(root_pos, color));
        agents.extend(positions.iter().map(|&pos| Agent::wandering(pos, color)));

        let mut distances = vec![None; agents.len()];
        distances[0] = Some(0);

        Self::assemble(width, height, agents, 0, distances, settings, seed, rng)
    }

    /// Build the lookup structures around an already-validated agent list
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        width: usize,
        height: usize,
        agents: Vec<Agent>,
        root: usize,
        distances: Vec<Option<usize>>,
        settings: FieldSettings,
        seed: u64,
        rng: ChaCha8Rng,
    ) -> Self {
        let mut cells = vec![None; width * height];
        for (idx, agent) in agents.iter().enumerate() {
            cells[agent.y() * width + agent.x()] = Some(idx);
        }
        let wandering = agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| !agent.is_stuck())
            .map(|(idx, _)| idx)
            .collect();

        let mut field = Self {
            width,
            height,
            agents,
            root,
            cells,
            distances,
            wandering,
            settings,
            seed,
            rng,
            tick: 0,
            complete: false,
        };
        field.complete = !field.has_work();

        debug!(
            width,
            height,
            agents = field.agents.len(),
            wandering = field.wandering.len(),
            seed,
            "field assembled"
        );
        field
    }

    /// Continue counting ticks from a captured run
    pub(crate) fn resume_at(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Advance one tick. Returns true while work remains.
    pub fn next_state(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.tick += 1;

        let moved = self.move_wandering();
        let attached = self.attach_wandering();
        trace!(
            tick = self.tick,
            moved,
            attached,
            wandering = self.wandering.len(),
            "tick resolved"
        );

        if !self.has_work() {
            self.complete = true;
            info!(
                ticks = self.tick,
                stuck = self.stuck_count(),
                wandering = self.wandering.len(),
                "field complete"
            );
            return false;
        }
        true
    }

    /// Random-walk every wandering agent against the start-of-tick occupancy
    fn move_wandering(&mut self) -> usize {
        let offsets = self.settings.neighborhood.offsets();

        // (destination cell, agent index)
        let mut proposals: Vec<(usize, usize)> = Vec::with_capacity(self.wandering.len());
        for &idx in &self.wandering {
            let (dx, dy) = offsets[self.rng.gen_range(0..offsets.len())];
            let from = self.agents[idx].position();
            let Some(dest) = from.offset(dx, dy, self.width, self.height) else {
                continue;
            };
            let cell = dest.y * self.width + dest.x;
            if self.cells[cell].is_some() {
                continue;
            }
            proposals.push((cell, idx));
        }

        // Contested destinations: every claimant stays put
        proposals.sort_unstable();
        let mut moved = 0;
        let mut i = 0;
        while i < proposals.len() {
            let (cell, idx) = proposals[i];
            let mut j = i + 1;
            while j < proposals.len() && proposals[j].0 == cell {
                j += 1;
            }
            if j - i == 1 {
                let from = self.agents[idx].position();
                let old_cell = from.y * self.width + from.x;
                self.cells[old_cell] = None;
                self.cells[cell] = Some(idx);
                self.agents[idx].move_to(Position::new(cell % self.width, cell / self.width));
                moved += 1;
            }
            i = j;
        }
        moved
    }

    /// Stick every wandering agent touching the aggregate as it stood before this phase
    fn attach_wandering(&mut self) -> usize {
        let offsets = self.settings.neighborhood.offsets();
        let attachments: Vec<(usize, usize)> = self
            .wandering
            .iter()
            .filter_map(|&idx| {
                self.stuck_neighbor_of(self.agents[idx].position(), offsets)
                    .map(|neighbor| (idx, neighbor))
            })
            .collect();

        for &(idx, neighbor) in &attachments {
            let anchor = self.agents[neighbor].position();
            self.agents[idx].stick_to(anchor);
            self.distances[idx] = self.distances[neighbor].map(|d| d + 1);
            trace!(
                agent = idx,
                x = self.agents[idx].x(),
                y = self.agents[idx].y(),
                neighbor_x = anchor.x,
                neighbor_y = anchor.y,
                "agent stuck"
            );
        }

        if !attachments.is_empty() {
            let agents = &self.agents;
            self.wandering.retain(|&idx| !agents[idx].is_stuck());
        }
        attachments.len()
    }

    /// First stuck agent adjacent to `pos`, in the neighborhood's scan order
    fn stuck_neighbor_of(&self, pos: Position, offsets: &[(i32, i32)]) -> Option<usize> {
        offsets.iter().find_map(|&(dx, dy)| {
            let neighbor = pos.offset(dx, dy, self.width, self.height)?;
            let idx = self.cells[self.cell_index(neighbor)]?;
            self.agents[idx].is_stuck().then_some(idx)
        })
    }

    fn has_work(&self) -> bool {
        !self.wandering.is_empty() && self.has_free_frontier()
    }

    /// True if some in-bounds cell touching the aggregate is not yet stuck
    fn has_free_frontier(&self) -> bool {
        let offsets = self.settings.neighborhood.offsets();
        self.agents.iter().filter(|agent| agent.is_stuck()).any(|agent| {
            offsets.iter().any(|&(dx, dy)| {
                agent
                    .position()
                    .offset(dx, dy, self.width, self.height)
                    .is_some_and(|pos| self.cell_state_at(pos) != CellState::Stuck)
            })
        })
    }

    fn cell_index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }

    fn cell_state_at(&self, pos: Position) -> CellState {
        match self.cells[self.cell_index(pos)] {
            None => CellState::Empty,
            Some(idx) if self.agents[idx].is_stuck() => CellState::Stuck,
            Some(_) => CellState::Occupied,
        }
    }

    pub fn get_width(&self) -> usize {
        self.width
    }

    pub fn get_height(&self) -> usize {
        self.height
    }

    pub fn get_num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn get_agent_at(&self, index: usize) -> Result<&Agent, FieldError> {
        self.agents.get(index).ok_or(FieldError::IndexOutOfRange {
            index,
            len: self.agents.len(),
        })
    }

    /// All agents in insertion order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn root(&self) -> &Agent {
        &self.agents[self.root]
    }

    pub fn root_index(&self) -> usize {
        self.root
    }

    /// Index of the agent occupying (x, y), if any
    pub fn agent_index_at(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y * self.width + x]
    }

    pub fn agent_at_position(&self, x: usize, y: usize) -> Option<&Agent> {
        self.agent_index_at(x, y).map(|idx| &self.agents[idx])
    }

    /// Cell contents at (x, y); None outside the field
    pub fn cell_state(&self, x: usize, y: usize) -> Option<CellState> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cell_state_at(Position::new(x, y)))
    }

    /// Sticky-neighbor hops from `agent` to the root.
    ///
    /// Returns None for wandering agents and for agents that are not part of
    /// this field.
    pub fn get_distance_from_root(&self, agent: &Agent) -> Option<usize> {
        let idx = self.agent_index_at(agent.x(), agent.y())?;
        if self.agents[idx] != *agent {
            return None;
        }
        self.distances[idx]
    }

    /// Root distance by agent index
    pub fn distance_at(&self, index: usize) -> Result<Option<usize>, FieldError> {
        self.get_agent_at(index)?;
        Ok(self.distances[index])
    }

    pub fn stuck_count(&self) -> usize {
        self.agents.len() - self.wandering.len()
    }

    pub fn wandering_count(&self) -> usize {
        self.wandering.len()
    }

    /// Ticks advanced since construction or reconstruction
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed the field's RNG was built from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
