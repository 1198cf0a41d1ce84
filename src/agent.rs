use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::statistics::Statistics;
use tracing::warn;
use crate::grid::{Action, Environment, State, DEFAULT_MAX_STEPS, N_ACTIONS};

/// One transition: the state it started from, the requested action, and
/// the reward for the state it led to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: State,
    pub action: Action,
    pub reward: i32,
}

pub type Trajectory = Vec<Step>;

/// Cumulative reward and trajectory of every episode of a run.
#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    pub rewards: Vec<i32>,
    pub trajectories: Vec<Trajectory>,
}

impl RunHistory {
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn mean_reward(&self) -> f64 {
        self.rewards.iter().map(|&r| r as f64).mean()
    }

    pub fn reward_std_dev(&self) -> f64 {
        self.rewards.iter().map(|&r| r as f64).std_dev()
    }

    pub fn win_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.rewards.iter().filter(|&&r| r > 0).count() as f64 / self.len() as f64
    }

    pub fn mean_steps(&self) -> f64 {
        self.trajectories.iter().map(|t| t.len() as f64).mean()
    }
}


/// Something that acts in the grid world.
pub trait Agent {
    fn decide_action(&mut self, state: &State, eps: f64) -> Action;

    fn environment(&self) -> &Environment;

    fn environment_mut(&mut self) -> &mut Environment;

    fn rng(&mut self) -> &mut StdRng;

    /// Play one episode from a freshly reset environment.
    fn play_episode(&mut self, eps: f64, show_board: bool) -> Trajectory {
        let mut env = self.environment().reset();
        let mut trajectory = Trajectory::new();
        while !env.is_done() {
            let state = env.current_state;
            let action = self.decide_action(&state, eps);
            let next_state = env.step(action, self.rng());
            let reward = env.reward(&next_state);
            trajectory.push(Step { state, action, reward });
            if show_board {
                env.show_board(&next_state);
            }
            env.update_state(next_state);
        }
        if !Environment::is_terminal(&env.current_state) {
            warn!(steps = env.steps, state = %env.current_state, "episode truncated");
        }
        *self.environment_mut() = env;
        trajectory
    }

    /// Play `n_iter` episodes and collect their rewards and trajectories.
    fn run(&mut self, n_iter: usize, eps: f64, show_board: bool) -> RunHistory {
        let mut history = RunHistory::default();
        for _ in 0..n_iter {
            let trajectory = self.play_episode(eps, show_board);
            history.rewards.push(self.environment().cum_reward);
            history.trajectories.push(trajectory);
        }
        history
    }
}


pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}


/// Baseline that picks every action uniformly and never learns.
pub struct RandomAgent {
    pub env: Environment,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(stochastic: bool, seed: Option<u64>) -> RandomAgent {
        RandomAgent {
            env: Environment::new(stochastic).with_max_steps(DEFAULT_MAX_STEPS),
            rng: make_rng(seed),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> RandomAgent {
        self.env = self.env.with_max_steps(max_steps);
        self
    }
}

impl Agent for RandomAgent {
    fn decide_action(&mut self, _state: &State, _eps: f64) -> Action {
        Action::ALL[self.rng.gen_range(0..N_ACTIONS)]
    }

    fn environment(&self) -> &Environment {
        &self.env
    }

    fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
