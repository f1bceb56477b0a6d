#![forbid(unsafe_code)]

mod client_defaults;
mod error;
mod identity;
mod models;
mod runner;

pub use error::Error;
pub use identity::{IdentityClient, IdentityClientBuilder, Operation};
pub use models::{AuthContext, TestCase};
pub use runner::{IterationResult, LogReporter, ReportSink, Runner};
