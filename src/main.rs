use std::path::{Path, PathBuf};
use std::process::ExitCode;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use gridmc::agent::{Agent, RandomAgent, RunHistory};
use gridmc::config::GridConfig;
use gridmc::dynamics;
use gridmc::error::AppError;
use gridmc::solver::{MonteCarloAgent, TrainOutcome};


/// Command line argument parser.
#[derive(Parser, Debug)]
#[command(about = "Learn a grid world policy with Monte Carlo control", long_about = None)]
pub struct Args {
    /// Path to configuration TOML file.
    config_path: PathBuf,

    /// Logging verbosity (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands
}


#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the exact transition probabilities.
    Dynamics,
    /// Play episodes with uniformly random actions.
    Random {
        n_iter: usize,
        #[arg(long)]
        show_board: bool,
        /// Write per-episode results to a CSV file.
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Train with Monte Carlo control and print the learned policy.
    Train {
        /// Greedy episodes to play with the learned action values.
        #[arg(long, default_value_t = 0)]
        eval: usize,
        #[arg(long)]
        show_board: bool,
        /// Write per-episode results of the evaluation to a CSV file.
        #[arg(long)]
        history: Option<PathBuf>,
    },
}


fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt().with_max_level(args.log_level).init();
    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}


fn execute(args: &Args) -> Result<(), AppError> {
    info!(path = %args.config_path.display(), "reading config file");
    let config = GridConfig::load(&args.config_path)?;

    match &args.command {
        Commands::Dynamics => {
            dynamics::show_dynamics(&dynamics::calc_dynamics(config.stochastic));
        }
        Commands::Random { n_iter, show_board, history } => {
            let mut agent = RandomAgent::new(config.stochastic, config.seed)
                .with_max_steps(config.max_steps);
            let hist = agent.run(*n_iter, 1.0, *show_board);
            show_summary(&hist);
            if let Some(path) = history {
                write_history(path, &hist)?;
            }
        }
        Commands::Train { eval, show_board, history } => {
            let mut agent = MonteCarloAgent::new(config.stochastic, config.seed)
                .with_max_steps(config.max_steps);
            let outcome = agent.train(&config.train)?;
            match &outcome {
                TrainOutcome::Converged { iterations, .. } =>
                    println!("Converged after {} iterations.", iterations),
                TrainOutcome::NotConverged { iterations, .. } =>
                    println!("Did not converge within {} iterations.", iterations),
            }
            agent.policy.show();
            if *eval > 0 {
                let hist = agent.evaluate(*eval, *show_board);
                show_summary(&hist);
                if let Some(path) = history {
                    write_history(path, &hist)?;
                }
            }
        }
    }
    Ok(())
}


fn show_summary(hist: &RunHistory) {
    println!("Episodes:      {}", hist.len());
    println!("Mean reward:   {:.3} (std dev {:.3})", hist.mean_reward(), hist.reward_std_dev());
    println!("Win rate:      {:.3}", hist.win_rate());
    println!("Mean length:   {:.2}", hist.mean_steps());
}


fn write_history(path: &Path, hist: &RunHistory) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["episode", "cumulative_reward", "steps"])?;
    for (i, (r, trajectory)) in hist.rewards.iter().zip(&hist.trajectories).enumerate() {
        writer.write_record(&[i.to_string(), r.to_string(), trajectory.len().to_string()])?;
    }
    writer.flush()?;
    info!(path = %path.display(), episodes = hist.len(), "wrote history");
    Ok(())
}
