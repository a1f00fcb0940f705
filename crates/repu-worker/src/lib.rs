//! Alpha Requestor Worker
//!
//! Runs one verified task per agreement:
//! - [`factor`] builds the task and checks provider output
//! - [`protocol`] is the per-agreement state machine
//! - [`executor`] is the seam to the remote runtime
//! - [`driver`] feeds the state machine through an executor

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod factor;
pub mod protocol;
pub mod queue;

pub use config::ProtocolConfig;
pub use driver::run_agreement;
pub use error::{ExecutorError, ProtocolError};
pub use executor::{ProcessExecutor, RemoteExecutor};
pub use factor::{parse_factor_output, prepare_task_data, Factorization, FactorizationCheck};
pub use protocol::{BatchResult, Phase, Step, TaskOutcome, TaskProtocol};
pub use queue::{AgreementTasks, TaskQueue, TaskSource};
