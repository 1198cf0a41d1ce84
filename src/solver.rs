use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::{debug, info, warn};
use crate::agent::{make_rng, Agent, RunHistory, Trajectory};
use crate::error::TrainError;
use crate::grid::{Action, Environment, State, DEFAULT_MAX_STEPS, N_ACTIONS, N_STATES};
use crate::policy::Policy;


/// Training parameters for Monte Carlo control.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    /// Episodes sampled per estimation pass
    pub n_samp: usize,
    /// Discount rate
    pub gamma: f64,
    /// Exploration probability after the first, fully random, pass
    pub eps: f64,
    /// Multiply eps by eps_decay_rate after every pass
    pub eps_decay: bool,
    pub eps_decay_rate: f64,
    /// Stop once no action value changes by this much between passes
    pub tol: f64,
    /// Maximum number of estimation passes compared before giving up
    pub max_iter: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            n_samp: 10_000,
            gamma: 0.9,
            eps: 0.1,
            eps_decay: true,
            eps_decay_rate: 0.99,
            tol: 0.05,
            max_iter: 1000,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), TrainError> {
        fn invalid(name: &'static str, reason: String) -> Result<(), TrainError> {
            Err(TrainError::InvalidParameter { name, reason })
        }
        if self.n_samp == 0 {
            return invalid("n_samp", "must be positive".into());
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return invalid("gamma", format!("{} is not in [0, 1)", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.eps) {
            return invalid("eps", format!("{} is not in [0, 1]", self.eps));
        }
        if !(self.eps_decay_rate > 0.0 && self.eps_decay_rate <= 1.0) {
            return invalid("eps_decay_rate", format!("{} is not in (0, 1]", self.eps_decay_rate));
        }
        if !(self.tol > 0.0) {
            return invalid("tol", format!("{} is not positive", self.tol));
        }
        if self.max_iter == 0 {
            return invalid("max_iter", "must be positive".into());
        }
        Ok(())
    }
}


/// How a training run ended.
#[derive(Debug, Clone)]
pub enum TrainOutcome {
    /// No action value moved by `tol` or more between two passes.
    Converged { q: ndarray::Array2<f64>, iterations: usize },
    /// `max_iter` passes ran without settling. Holds the latest table.
    NotConverged { q: ndarray::Array2<f64>, iterations: usize },
}

impl TrainOutcome {
    pub fn q(&self) -> &ndarray::Array2<f64> {
        match self {
            TrainOutcome::Converged { q, .. } | TrainOutcome::NotConverged { q, .. } => q,
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            TrainOutcome::Converged { iterations, .. }
            | TrainOutcome::NotConverged { iterations, .. } => *iterations,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, TrainOutcome::Converged { .. })
    }
}


/// Average discounted returns per (state, action) over a batch of episodes.
///
/// Each trajectory is walked backwards accumulating `g = gamma * g + r`.
/// Within one episode the value written last wins, so a pair that occurs
/// more than once keeps the return that followed its earliest occurrence.
/// Episodes that visit a pair contribute one return each to its average.
/// Pairs no episode visited stay at zero.
pub fn estimate_returns(trajectories: &[Trajectory], gamma: f64) -> ndarray::Array2<f64> {
    let mut cum_returns = ndarray::Array2::<f64>::zeros((N_STATES, N_ACTIONS));
    let mut count = ndarray::Array2::<u32>::zeros((N_STATES, N_ACTIONS));
    for episode in trajectories {
        let mut returns = ndarray::Array2::<f64>::zeros((N_STATES, N_ACTIONS));
        let mut visited = ndarray::Array2::<u32>::zeros((N_STATES, N_ACTIONS));
        let mut g = 0.0;
        for step in episode.iter().rev() {
            g = gamma * g + step.reward as f64;
            let ix = [step.state.index(), step.action.index()];
            returns[ix] = g;
            visited[ix] = 1;
        }
        cum_returns += &returns;
        count += &visited;
    }
    ndarray::Zip::from(&cum_returns)
        .and(&count)
        .map_collect(|&total, &n| if n == 0 { 0.0 } else { total / n as f64 })
}


/// Learns action values from sampled episodes alone.
pub struct MonteCarloAgent {
    pub env: Environment,
    pub policy: Policy,
    rng: StdRng,
}

impl MonteCarloAgent {
    pub fn new(stochastic: bool, seed: Option<u64>) -> MonteCarloAgent {
        MonteCarloAgent {
            env: Environment::new(stochastic).with_max_steps(DEFAULT_MAX_STEPS),
            policy: Policy::new(),
            rng: make_rng(seed),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> MonteCarloAgent {
        self.env = self.env.with_max_steps(max_steps);
        self
    }

    pub fn av_func(&self) -> &ndarray::Array2<f64> {
        &self.policy.action_value
    }

    pub fn update_av_func(&mut self, av_func: ndarray::Array2<f64>) {
        self.policy = Policy::from_action_values(av_func);
    }

    /// Sample `n_samp` episodes with the current epsilon-greedy policy and
    /// estimate action values from them. Does not touch the stored table.
    pub fn est_av_func(&mut self, n_samp: usize, eps: f64, gamma: f64) -> ndarray::Array2<f64> {
        let history = self.run(n_samp, eps, false);
        debug!(episodes = history.len(), mean_reward = history.mean_reward(),
               mean_steps = history.mean_steps(), "sampled episodes");
        estimate_returns(&history.trajectories, gamma)
    }

    /// Alternate estimation and improvement until the action values settle.
    ///
    /// The first pass explores with eps = 1. Later passes use `config.eps`,
    /// decayed after every pass when enabled.
    pub fn train(&mut self, config: &TrainConfig) -> Result<TrainOutcome, TrainError> {
        config.validate()?;
        let mut eps = config.eps;
        let mut iterations = 1;
        self.update_av_func(ndarray::Array2::<f64>::zeros((N_STATES, N_ACTIONS)));
        let mut av_func = self.est_av_func(config.n_samp, 1.0, config.gamma);
        loop {
            let delta = self.policy.max_abs_diff(&av_func);
            info!(iteration = iterations, delta, eps, "estimation pass");
            debug!("old action values:\n{}", self.policy.action_value);
            debug!("new action values:\n{}", av_func);

            if delta < config.tol {
                info!(iterations, "converged");
                return Ok(TrainOutcome::Converged { q: self.av_func().clone(), iterations });
            }
            if iterations >= config.max_iter {
                warn!(iterations, delta, "no convergence within iteration limit");
                self.update_av_func(av_func);
                return Ok(TrainOutcome::NotConverged { q: self.av_func().clone(), iterations });
            }

            self.update_av_func(av_func);
            av_func = self.est_av_func(config.n_samp, eps, config.gamma);

            if config.eps_decay {
                eps *= config.eps_decay_rate;
            }
            iterations += 1;
        }
    }

    /// Follow the greedy policy for `n_iter` episodes.
    pub fn evaluate(&mut self, n_iter: usize, show_board: bool) -> RunHistory {
        self.run(n_iter, 0.0, show_board)
    }
}

impl Agent for MonteCarloAgent {
    fn decide_action(&mut self, state: &State, eps: f64) -> Action {
        self.policy.decide_action(state, eps, &mut self.rng)
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
