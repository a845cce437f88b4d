mod bindings;
mod description;
mod parse;
mod v1;

use thiserror::Error;

pub use bindings::{Bindings, BindingsBuilder, ConfigError};
pub use description::{
    AnalogDescription, ButtonMode, DigitalDescription, DigitalInput,
    MacroDescription, OperationDescription, OperationKind, ScriptStep,
    ShiftConditions, ShiftDescription, Value,
};
pub use parse::{load_bindings, parse_bindings};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("yaml deserialize error: {0}")]
    YamlDeserializeError(#[from] serde_yaml::Error),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("v1 bindings error: {0}")]
    V1ProfileError(#[from] v1::Error),
    #[error("invalid bindings: {0}")]
    Config(#[from] ConfigError),
    #[error("path error: {0}")]
    PathError(#[from] std::io::Error),
}
