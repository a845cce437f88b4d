use thiserror::Error;

use super::task::TaskError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Device(#[from] opshift_device::Error),
    #[error("task of macro {operation} failed: {source}")]
    Task {
        operation: &'static str,
        #[source]
        source: TaskError,
    },
}
