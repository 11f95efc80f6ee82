use thiserror::Error;

pub type PodResult<T> = Result<T, PodError>;

/// Every fallible engine operation returns this, never a string: a
/// collaborator shell matches on the kind instead of parsing a message.
#[derive(Error, Debug)]
pub enum PodError {
    #[error("inverse kinematics could not solve for the target: {0}")]
    Unreachable(String),

    #[error("received frame of length {actual}, expected {expected}")]
    MalformedFrame { actual: usize, expected: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no gait defined for {num_legs}-legged pod with gait {gait:?}")]
    UnsupportedCombination { num_legs: usize, gait: String },

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("toml deserialize error")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("toml serialize error")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("config error")]
    Config(#[from] config::ConfigError),
}
