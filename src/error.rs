//! Error types for parasync operations

use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised by the transport gateway itself.
///
/// A remote command that runs and exits non-zero is NOT an error here; it
/// comes back as a normal `CmdOutput`. These variants cover the cases where
/// the external program could not be run to completion at all.
#[derive(Debug)]
pub enum TransportError {
	/// Required external program absent from PATH
	ToolMissing { program: String },

	/// Invocation exceeded its timeout bound
	Timeout { program: String, secs: u64 },

	/// Subprocess spawn failed for a reason other than a missing program
	Spawn { program: String, source: io::Error },

	/// I/O failure while collecting subprocess output
	Io { program: String, source: io::Error },
}

impl fmt::Display for TransportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransportError::ToolMissing { program } => {
				write!(f, "Required command not found in PATH: {}", program)
			}
			TransportError::Timeout { program, secs } => {
				write!(f, "{} timed out after {}s", program, secs)
			}
			TransportError::Spawn { program, source } => {
				write!(f, "Failed to spawn '{}': {}", program, source)
			}
			TransportError::Io { program, source } => {
				write!(f, "I/O error talking to '{}': {}", program, source)
			}
		}
	}
}

impl Error for TransportError {}

/// Errors raised outside of a running strategy: profile store access,
/// key file handling, local filesystem preparation.
#[derive(Debug)]
pub enum SyncError {
	/// Profile store file could not be read or written
	StoreIo { path: String, source: io::Error },

	/// Profile store file is not valid JSON
	StoreCorrupted { path: String, message: String },

	/// Profile validation failed (empty name, bad port, ...)
	InvalidProfile { message: String },

	/// No profile with the requested name
	ProfileNotFound { name: String },

	/// Local path required by the operation does not exist
	PathNotFound { path: String },

	/// Key or other local file access failed
	Io(io::Error),

	/// Transport-level failure (nested)
	Transport(TransportError),

	/// Generic error message
	Other { message: String },
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::StoreIo { path, source } => {
				write!(f, "Profile store {}: {}", path, source)
			}
			SyncError::StoreCorrupted { path, message } => {
				write!(f, "Profile store {} is corrupted: {}", path, message)
			}
			SyncError::InvalidProfile { message } => {
				write!(f, "Invalid profile: {}", message)
			}
			SyncError::ProfileNotFound { name } => {
				write!(f, "Profile not found: {}", name)
			}
			SyncError::PathNotFound { path } => {
				write!(f, "Local path not found: {}", path)
			}
			SyncError::Io(e) => write!(f, "I/O error: {}", e),
			SyncError::Transport(e) => write!(f, "Transport error: {}", e),
			SyncError::Other { message } => write!(f, "{}", message),
		}
	}
}

impl Error for SyncError {}

impl From<io::Error> for SyncError {
	fn from(e: io::Error) -> Self {
		SyncError::Io(e)
	}
}

impl From<TransportError> for SyncError {
	fn from(e: TransportError) -> Self {
		SyncError::Transport(e)
	}
}

impl From<String> for SyncError {
	fn from(e: String) -> Self {
		SyncError::Other { message: e }
	}
}

// vim: ts=4
