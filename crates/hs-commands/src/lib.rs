//! hs-commands: concrete pipeline command implementations.
//!
//! Each command is a small struct embedding [`hs_engine::CommandBase`] and
//! implementing the [`hs_engine::Command`] protocol. Numeric work is
//! delegated to the pure collaborators in [`transforms`].

pub mod analyze_pattern;
pub mod common;
pub mod copy;
pub mod create_ensemble;
pub mod fill_constant;
pub mod lag_k;
pub mod new_table;
pub mod new_time_series;
pub mod registry;
pub mod scale;
pub mod transforms;

pub use analyze_pattern::AnalyzePattern;
pub use copy::Copy;
pub use create_ensemble::CreateEnsemble;
pub use fill_constant::FillConstant;
pub use lag_k::LagK;
pub use new_table::NewTable;
pub use new_time_series::NewTimeSeries;
pub use registry::{instantiate, FactoryError};
pub use scale::Scale;
