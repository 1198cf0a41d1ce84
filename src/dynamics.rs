use crate::grid::{Action, Environment, State, StateIterator, N_ACTIONS, N_STATES};

/// Rewards along the last axis of the dynamics tensor.
pub const REWARDS: [i32; 3] = [0, 1, -1];

pub fn reward_index(r: i32) -> usize {
    match REWARDS.iter().position(|&x| x == r) {
        Some(i) => i,
        None => panic!("Reward {} is not produced by the grid.", r),
    }
}

/// Exact transition probabilities p(s', r | s, a).
///
/// Indexes are [current state, action, next state, reward index]. Rows for
/// the blocked cell and both terminal states are left at zero.
pub fn calc_dynamics(stochastic: bool) -> ndarray::Array4<f64> {
    let mut dynamics =
        ndarray::Array4::<f64>::zeros((N_STATES, N_ACTIONS, N_STATES, REWARDS.len()));
    for s in StateIterator::new() {
        if !s.is_valid() || Environment::is_terminal(&s) {
            continue;
        }
        for a in Action::ALL {
            for (effective, p) in a.outcomes(stochastic) {
                let next = Environment::move_from(&s, effective);
                let r = reward_index(Environment::reward_of(&next));
                dynamics[[s.index(), a.index(), next.index(), r]] += p;
            }
        }
    }
    dynamics
}

pub fn show_dynamics(dynamics: &ndarray::Array4<f64>) {
    println!("{:>8} {:>6} {:>8} {:>7} {:>8}", "state", "action", "next", "reward", "prob");
    for ((s, a, s2, r), p) in dynamics.indexed_iter() {
        if *p == 0.0 {
            continue;
        }
        println!("{:>8} {:>6} {:>8} {:>7} {:>8.3}",
                 State::from_index(s).to_string(), Action::from_index(a).to_string(),
                 State::from_index(s2).to_string(), REWARDS[r], p);
    }
}
