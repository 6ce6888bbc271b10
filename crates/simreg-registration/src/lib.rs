pub mod metric;
pub mod optimizer;
pub mod gradient;
pub mod registration;
pub mod multires;
pub mod config;
pub mod error;
pub mod validation;
pub mod progress;

pub use error::{RegistrationError, Result};
pub use config::{MomentTransition, ParameterMask, RegistrationConfig};
pub use multires::{
    register, LevelSummary, MultiResolutionRegistration, RegistrationResult, RegistrationSchedule,
    RegistrationStage,
};
pub use progress::{ProgressCallback, ProgressTracker, ConsoleProgressCallback, HistoryCallback, ProgressInfo};
