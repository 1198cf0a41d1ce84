use std::fmt;
use std::iter::Iterator;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

pub const ROWS: u8 = 3;
pub const COLS: u8 = 4;
/// Number of grid coordinates, including the blocked cell.
pub const N_STATES: usize = (ROWS * COLS) as usize;
pub const N_ACTIONS: usize = 4;

pub const START: State = State { row: 2, col: 0 };
pub const BLOCK: State = State { row: 1, col: 1 };
pub const WIN: State = State { row: 0, col: 3 };
pub const LOSE: State = State { row: 1, col: 3 };

/// Step limit agents apply to their episodes unless told otherwise.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Probability that a stochastic North is carried out as intended.
pub const NORTH_PROB: f64 = 0.8;
/// Probability that a stochastic North slips East, and again for West.
pub const SLIP_PROB: f64 = 0.1;


/// A coordinate on the grid. Row 0 is the top row.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct State {
    pub row: u8,
    pub col: u8,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl State {
    pub fn new(row: u8, col: u8) -> State {
        if row >= ROWS || col >= COLS {
            panic!("State ({}, {}) is outside the {}x{} grid.", row, col, ROWS, COLS)
        }
        State { row, col }
    }

    /// Row index into the action-value table.
    pub fn index(&self) -> usize {
        (self.row * COLS + self.col) as usize
    }

    pub fn from_index(i: usize) -> State {
        if i >= N_STATES {
            panic!("State index {} exceeds maximum of {}.", i, N_STATES - 1)
        }
        State { row: i as u8 / COLS, col: i as u8 % COLS }
    }

    /// Block is never occupied; everything else on the grid is.
    pub fn is_valid(&self) -> bool {
        self.row < ROWS && self.col < COLS && *self != BLOCK
    }

    /// Apply an action's displacement. None when it leaves the grid.
    fn displaced(&self, action: Action) -> Option<State> {
        let (dr, dc) = action.displacement();
        let row = self.row as i16 + dr as i16;
        let col = self.col as i16 + dc as i16;
        if row < 0 || col < 0 || row >= ROWS as i16 || col >= COLS as i16 {
            return None;
        }
        Some(State { row: row as u8, col: col as u8 })
    }
}


/// Iterates every grid coordinate in index order, blocked cell included.
pub struct StateIterator {
    next: usize,
}

impl StateIterator {
    pub fn new() -> StateIterator {
        StateIterator { next: 0 }
    }
}

impl Default for StateIterator {
    fn default() -> Self {
        StateIterator::new()
    }
}

impl Iterator for StateIterator {
    type Item = State;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= N_STATES {
            return None;
        }
        let state = State::from_index(self.next);
        self.next += 1;
        Some(state)
    }
}


#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Action {
    North,
    South,
    East,
    West,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Action::North => "North",
            Action::South => "South",
            Action::East => "East",
            Action::West => "West",
        };
        write!(f, "{}", name)
    }
}

impl Action {
    /// Fixed action order. Also the greedy tie-breaking order.
    pub const ALL: [Action; N_ACTIONS] =
        [Action::North, Action::South, Action::East, Action::West];

    pub fn index(&self) -> usize {
        match self {
            Action::North => 0,
            Action::South => 1,
            Action::East => 2,
            Action::West => 3,
        }
    }

    pub fn from_index(i: usize) -> Action {
        match Action::ALL.get(i) {
            Some(a) => *a,
            None => panic!("Invalid action index {}.", i),
        }
    }

    /// Row and column displacement.
    pub fn displacement(&self) -> (i8, i8) {
        match self {
            Action::North => (-1, 0),
            Action::South => (1, 0),
            Action::East => (0, 1),
            Action::West => (0, -1),
        }
    }

    pub fn arrow(&self) -> char {
        match self {
            Action::North => '^',
            Action::South => 'v',
            Action::East => '>',
            Action::West => '<',
        }
    }

    /// Effective directions and their probabilities for a requested action.
    pub fn outcomes(&self, stochastic: bool) -> Vec<(Action, f64)> {
        if stochastic && *self == Action::North {
            vec![
                (Action::North, NORTH_PROB),
                (Action::East, SLIP_PROB),
                (Action::West, SLIP_PROB),
            ]
        } else {
            vec![(*self, 1.0)]
        }
    }
}


/// One instance of the grid MDP.
///
/// Holds the agent's position and the reward collected so far. An
/// optional step limit truncates episodes that fail to reach a terminal
/// state.
#[derive(Debug, Clone)]
pub struct Environment {
    pub current_state: State,
    pub cum_reward: i32,
    pub stochastic: bool,
    /// Maximum number of transitions before the episode is truncated
    pub max_steps: Option<usize>,
    /// Transitions taken since the last reset
    pub steps: usize,
}

impl Environment {
    pub fn new(stochastic: bool) -> Environment {
        Environment {
            current_state: START,
            cum_reward: 0,
            stochastic,
            max_steps: None,
            steps: 0,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Environment {
        self.max_steps = Some(max_steps);
        self
    }

    /// Fresh instance at the start state with no reward collected.
    pub fn reset(&self) -> Environment {
        Environment {
            current_state: START,
            cum_reward: 0,
            stochastic: self.stochastic,
            max_steps: self.max_steps,
            steps: 0,
        }
    }

    /// Direction actually taken for a requested action.
    pub fn effective_action<R: Rng + ?Sized>(&self, action: Action, rng: &mut R) -> Action {
        let outcomes = action.outcomes(self.stochastic);
        if outcomes.len() == 1 {
            return outcomes[0].0;
        }
        let dist = WeightedIndex::new(outcomes.iter().map(|(_, p)| *p))
            .expect("Outcome weights are positive constants.");
        outcomes[dist.sample(rng)].0
    }

    /// Next state after taking `action` from the current state.
    ///
    /// Does not move the agent; call `update_state` with the result.
    pub fn step<R: Rng + ?Sized>(&self, action: Action, rng: &mut R) -> State {
        let effective = self.effective_action(action, rng);
        Environment::move_from(&self.current_state, effective)
    }

    /// Deterministic move. Leaving the grid or entering the block is a no-op.
    pub fn move_from(state: &State, action: Action) -> State {
        if !state.is_valid() {
            panic!("Cannot move from invalid state {}.", state)
        }
        match state.displaced(action) {
            Some(next) if next.is_valid() => next,
            _ => *state,
        }
    }

    /// Reward for entering `state`. Adds to the cumulative reward, so
    /// query it exactly once per transition.
    pub fn reward(&mut self, state: &State) -> i32 {
        let r = Environment::reward_of(state);
        self.cum_reward += r;
        r
    }

    pub fn reward_of(state: &State) -> i32 {
        if *state == WIN {
            1
        } else if *state == LOSE {
            -1
        } else {
            0
        }
    }

    pub fn is_terminal(state: &State) -> bool {
        *state == WIN || *state == LOSE
    }

    pub fn update_state(&mut self, next_state: State) {
        self.current_state = next_state;
        self.steps += 1;
    }

    pub fn is_truncated(&self) -> bool {
        match self.max_steps {
            Some(max) => self.steps >= max,
            None => false,
        }
    }

    pub fn is_done(&self) -> bool {
        Environment::is_terminal(&self.current_state) || self.is_truncated()
    }

    /// Board with the agent drawn at `position`.
    pub fn render(position: &State) -> String {
        let mut board = String::new();
        for row in 0..ROWS {
            let cells: Vec<String> = (0..COLS)
                .map(|col| {
                    let s = State { row, col };
                    let cell = if s == *position {
                        "*"
                    } else if s == WIN {
                        "WIN"
                    } else if s == LOSE {
                        "LOSE"
                    } else if s == BLOCK {
                        "BLOCK"
                    } else {
                        "0"
                    };
                    format!("{:>5}", cell)
                })
                .collect();
            board.push_str(&format!("[{}]\n", cells.join(" ")));
        }
        board.push_str(&"-".repeat(50));
        board
    }

    pub fn show_board(&self, next_state: &State) {
        println!("{}", Environment::render(next_state));
    }
}
