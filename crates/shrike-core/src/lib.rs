pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod roster;
pub mod session;

pub use config::Credentials;
pub use error::{Error, Result};
pub use pipeline::{RowOutcome, RunOptions, RunSummary};
pub use roster::{ChannelRecord, Roster, FAILED_MARKER};
pub use session::{SessionDriver, SessionError};
