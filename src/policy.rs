use rand::Rng;
use crate::grid::{Action, Environment, State, StateIterator, COLS, N_ACTIONS, N_STATES};

/// Epsilon-greedy policy derived from an action-value table.
///
/// The table has one row per grid coordinate and one column per action,
/// in `Action::ALL` order. Rows for the blocked cell and terminal states
/// stay at zero.
#[derive(Debug, Clone)]
pub struct Policy {
    pub action_value: ndarray::Array2<f64>,
}

impl Policy {
    pub fn new() -> Policy {
        Policy::from_action_values(ndarray::Array2::<f64>::zeros((N_STATES, N_ACTIONS)))
    }

    pub fn from_action_values(action_value: ndarray::Array2<f64>) -> Policy {
        if action_value.dim() != (N_STATES, N_ACTIONS) {
            panic!("Action-value table must be {}x{}, got {:?}.",
                   N_STATES, N_ACTIONS, action_value.dim())
        }
        Policy { action_value }
    }

    pub fn get_value(&self, s: &State, a: Action) -> f64 {
        self.action_value[[s.index(), a.index()]]
    }

    /// Highest valued action. Ties go to the earliest action in `Action::ALL`.
    pub fn greedy_action(&self, s: &State) -> Action {
        let mut best = Action::North;
        for a in Action::ALL {
            if self.get_value(s, a) > self.get_value(s, best) {
                best = a;
            }
        }
        best
    }

    pub fn decide_action<R: Rng + ?Sized>(&self, s: &State, eps: f64, rng: &mut R) -> Action {
        if rng.gen::<f64>() >= eps {
            self.greedy_action(s)
        } else {
            Action::ALL[rng.gen_range(0..N_ACTIONS)]
        }
    }

    /// Largest absolute element-wise difference from another table.
    pub fn max_abs_diff(&self, other: &ndarray::Array2<f64>) -> f64 {
        (&self.action_value - other)
            .iter()
            .fold(0.0, |m: f64, d| m.max(d.abs()))
    }

    /// Greedy action per cell, with terminal and blocked cells blank.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for s in StateIterator::new() {
            let cell = if !s.is_valid() {
                '#'
            } else if Environment::is_terminal(&s) {
                if Environment::reward_of(&s) > 0 { 'W' } else { 'L' }
            } else {
                self.greedy_action(&s).arrow()
            };
            out.push(cell);
            out.push(if s.col == COLS - 1 { '\n' } else { ' ' });
        }
        out
    }

    pub fn show(&self) {
        print!("{:>8}:", "state");
        for a in Action::ALL {
            print!("{:>9}", a.to_string());
        }
        println!();
        for s in StateIterator::new() {
            print!("{:>8} | ", s.to_string());
            for v in self.action_value.row(s.index()) {
                print!("{:8.4} ", v);
            }
            println!();
        }
        println!("\n{}", self.render());
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::START;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::{ChiSquared, ContinuousCDF};
    use test_case::test_case;

    #[test]
    fn build_default_policy() {
        // Act
        let dpolicy = Policy::new();
        // Assert
        assert_eq!(dpolicy.action_value.dim(), (12, 4));
        assert_eq!(dpolicy.action_value.sum(), 0.0);
    }

    #[test]
    #[should_panic]
    fn wrong_shape_panics() {
        Policy::from_action_values(ndarray::Array2::<f64>::zeros((11, 4)));
    }

    #[test_case([0.0, 0.0, 0.0, 0.0], Action::North; "All tied")]
    #[test_case([0.1, 0.5, 0.2, -0.3], Action::South; "Clear maximum")]
    #[test_case([-0.5, -0.2, -0.2, -0.9], Action::South; "Negative tie")]
    #[test_case([0.0, 0.0, 0.3, 0.3], Action::East; "Tie after north")]
    fn test_greedy_action(row: [f64; 4], expected: Action) {
        // Arrange
        let mut policy = Policy::new();
        for (i, v) in row.iter().enumerate() {
            policy.action_value[[START.index(), i]] = *v;
        }
        // Act / Assert
        assert_eq!(policy.greedy_action(&START), expected);
    }

    #[test]
    fn zero_epsilon_is_greedy() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut policy = Policy::new();
        policy.action_value[[START.index(), Action::West.index()]] = 0.4;
        for _ in 0..1000 {
            assert_eq!(policy.decide_action(&START, 0.0, &mut rng), Action::West);
        }
    }

    #[test]
    fn unit_epsilon_is_uniform() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(31415);
        let mut policy = Policy::new();
        policy.action_value[[START.index(), Action::East.index()]] = 1.0;
        let n = 8000;
        let mut counts = [0usize; N_ACTIONS];
        // Act
        for _ in 0..n {
            counts[policy.decide_action(&START, 1.0, &mut rng).index()] += 1;
        }
        // Assert
        let expected = n as f64 / N_ACTIONS as f64;
        let chi2: f64 = counts.iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        let dist = ChiSquared::new((N_ACTIONS - 1) as f64).unwrap();
        assert!(dist.cdf(chi2) < 0.999, "chi-square statistic {} too large", chi2);
    }

    #[test]
    fn max_abs_diff_picks_largest_change() {
        let policy = Policy::new();
        let mut other = ndarray::Array2::<f64>::zeros((N_STATES, N_ACTIONS));
        other[[3, 1]] = -0.7;
        other[[8, 0]] = 0.2;
        assert_eq!(policy.max_abs_diff(&other), 0.7);
    }

    #[test]
    fn render_marks_special_cells() {
        let text = Policy::new().render();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows, vec!["^ ^ ^ W", "^ # ^ L", "^ ^ ^ ^"]);
    }
}
