//! Monte Carlo control for a 3x4 grid world with one blocked cell and two
//! terminal cells.

pub mod agent;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod grid;
pub mod policy;
pub mod solver;
