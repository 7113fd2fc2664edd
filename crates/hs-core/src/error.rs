use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid time-series identifier: {what}")]
    ParseIdent { what: String },

    #[error("Invalid data interval: {what}")]
    ParseInterval { what: String },

    #[error("Invalid date: {what}")]
    ParseDate { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
