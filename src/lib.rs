//! # ParaSync - Profile-based directory sync over ssh/scp
//!
//! ParaSync keeps a directory in step between a local machine and a remote
//! one reachable over SSH, by shelling out to the stock `ssh`/`scp`
//! programs. Connection parameters live in named profiles; the engine
//! offers four strategies: connectivity test, mirror push, mirror pull and
//! a non-destructive two-way merge, plus a passwordless-key bootstrap.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parasync::config::Profile;
//! use parasync::progress::{CancelFlag, Reporter};
//! use parasync::strategies;
//! use parasync::transport::ProcessTransport;
//!
//! #[tokio::main]
//! async fn main() {
//!     let profile = Profile {
//!         name: "work".into(),
//!         host: "10.211.55.2".into(),
//!         user: "me".into(),
//!         local_path: "/home/me/work".into(),
//!         remote_path: "/Users/me/work".into(),
//!         ..Profile::default()
//!     };
//!     let (reporter, _events) = Reporter::channel();
//!     let outcome = strategies::two_way_merge(
//!         &ProcessTransport,
//!         &profile,
//!         &reporter,
//!         &CancelFlag::new(),
//!     )
//!     .await;
//!     println!("{}", outcome.message);
//! }
//! ```

pub mod bootstrap;
pub mod command;
pub mod config;
pub mod diff;
pub mod discover;
pub mod error;
pub mod listing;
pub mod logging;
pub mod progress;
pub mod runner;
pub mod strategies;
pub mod transport;
pub mod trash;
pub mod watch;

// Re-export commonly used types
pub use config::{AppDirs, Profile, ProfileStore};
pub use error::{SyncError, TransportError};
pub use progress::{CancelFlag, Event, Outcome, Reporter};
pub use transport::{CmdOutput, Invocation, ProcessTransport, Transport};

// vim: ts=4
