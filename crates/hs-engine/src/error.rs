use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Pipeline-fatal errors. A single command's FAILURE never surfaces here;
/// it lands in the run report instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine invariant violated: {what}")]
    Invariant { what: &'static str },
}
