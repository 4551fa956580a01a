//! Run coordinator: one pass over the intake directory.
//!
//! A run
//! - takes the single-instance lock (or reports `Skipped`)
//! - scans the intake directory for video candidates
//! - drives each candidate through the replacement protocol in order
//! - notifies per-file successes and a final summary
//! - asks the media server to rescan when anything was replaced
//!
//! # Example
//!
//! ```ignore
//! use squeeze_core::coordinator::{RunCoordinator, RunReport};
//!
//! let coordinator = RunCoordinator::new(config, engine, placer)
//!     .with_notifier(Arc::new(DiscordNotifier::new(url)));
//!
//! match coordinator.run().await? {
//!     RunReport::Completed(summary) => println!("{}", summary.message()),
//!     RunReport::Skipped => println!("another run is active"),
//! }
//! ```

mod runner;
mod types;

pub use runner::{RunCoordinator, NO_VIDEOS_MESSAGE};
pub use types::{format_gb, success_message, CoordinatorError, RunReport, RunSummary};
