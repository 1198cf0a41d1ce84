use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("Invalid training parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unable to read configuration file: {0}")]
    Config(#[from] config_file::ConfigFileError),
    #[error("Unable to write history: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Train(#[from] TrainError),
}
