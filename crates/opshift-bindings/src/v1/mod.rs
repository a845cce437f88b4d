mod parse;
mod profile;
mod shift_expr;

use thiserror::Error;

pub(crate) use profile::BindingsV1;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown device \"{0}\"")]
    UnknownDevice(String),
    #[error("unknown operation \"{0}\"")]
    UnknownOperation(String),
    #[error("unknown shift \"{0}\"")]
    UnknownShift(String),
    #[error("invalid mode \"{1}\" for {0}")]
    InvalidMode(String, String),
    #[error("invalid kind \"{1}\" for {0}")]
    InvalidKind(String, String),
    #[error("{0} must have at most one of button, pov, axis_range and axis")]
    AmbiguousInput(String),
    #[error("{0} has no input: one of button, pov or axis_range is required")]
    MissingInput(String),
    #[error("{0}: analog options need an axis binding")]
    AnalogOptionsOnDigital(String),
    #[error("invalid shift condition for {0}: {1}")]
    InvalidCondition(String, String),
    #[error("script value for {1} in macro {0} must be true, false or a number")]
    InvalidScriptValue(String, String),
}
