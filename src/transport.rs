//! Transport gateway: runs external programs (ssh, scp, ssh-keygen) and
//! captures their result.
//!
//! The gateway has no awareness of sync semantics. A command that runs to
//! completion with a non-zero exit status is a normal [`CmdOutput`];
//! only "the program could not be run at all" conditions (missing tool,
//! spawn failure, timeout) surface as [`TransportError`]. Retries are a
//! strategy decision, never taken here.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::TransportError;

/// A single request to run an external program.
///
/// Constructed per operation, never persisted.
#[derive(Debug, Clone)]
pub struct Invocation {
	pub program: String,
	pub args: Vec<String>,
	pub cwd: Option<PathBuf>,
	pub timeout: Option<Duration>,
}

impl Invocation {
	pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
		Invocation { program: program.into(), args, cwd: None, timeout: None }
	}

	pub fn with_timeout(mut self, secs: u64) -> Self {
		self.timeout = Some(Duration::from_secs(secs));
		self
	}

	#[allow(dead_code)]
	pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
		self.cwd = Some(cwd);
		self
	}

	/// Rendering used for log lines, roughly what a user would type.
	pub fn display_line(&self) -> String {
		let mut line = self.program.clone();
		for arg in &self.args {
			line.push(' ');
			line.push_str(arg);
		}
		line
	}
}

/// Captured result of a completed invocation. Immutable once produced.
#[derive(Debug, Clone)]
pub struct CmdOutput {
	/// Exit status, 0 = success by convention
	pub status: i32,
	pub stdout: String,
	pub stderr: String,
}

impl CmdOutput {
	pub fn ok(&self) -> bool {
		self.status == 0
	}

	/// Best human-readable failure text: stderr if any, else stdout.
	pub fn error_text(&self) -> &str {
		if self.stderr.trim().is_empty() {
			self.stdout.trim()
		} else {
			self.stderr.trim()
		}
	}
}

/// Opaque command execution seam.
///
/// Strategies only ever talk to the remote side through this trait, which
/// lets tests substitute scripted transports for the real subprocess one.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn run(&self, inv: &Invocation) -> Result<CmdOutput, TransportError>;
}

/// Production transport: spawns the program as a child process.
pub struct ProcessTransport;

#[async_trait]
impl Transport for ProcessTransport {
	async fn run(&self, inv: &Invocation) -> Result<CmdOutput, TransportError> {
		let mut cmd = tokio::process::Command::new(&inv.program);
		cmd.args(&inv.args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		if let Some(cwd) = &inv.cwd {
			cmd.current_dir(cwd);
		}

		let child = cmd.spawn().map_err(|e| {
			if e.kind() == io::ErrorKind::NotFound {
				TransportError::ToolMissing { program: inv.program.clone() }
			} else {
				TransportError::Spawn { program: inv.program.clone(), source: e }
			}
		})?;

		let collected = match inv.timeout {
			Some(bound) => timeout(bound, child.wait_with_output())
				.await
				// Dropping the future kills the child (kill_on_drop)
				.map_err(|_| TransportError::Timeout {
					program: inv.program.clone(),
					secs: bound.as_secs(),
				})?,
			None => child.wait_with_output().await,
		};

		let output =
			collected.map_err(|e| TransportError::Io { program: inv.program.clone(), source: e })?;

		Ok(CmdOutput {
			status: output.status.code().unwrap_or(-1),
			stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn missing_program_is_tool_missing() {
		let inv = Invocation::new("parasync-no-such-tool-xyzzy", vec![]);
		match ProcessTransport.run(&inv).await {
			Err(TransportError::ToolMissing { program }) => {
				assert_eq!(program, "parasync-no-such-tool-xyzzy");
			}
			other => panic!("expected ToolMissing, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn nonzero_exit_is_a_normal_result() {
		let inv = Invocation::new("sh", vec!["-c".into(), "echo out; echo err >&2; exit 3".into()]);
		let out = ProcessTransport.run(&inv).await.unwrap();
		assert_eq!(out.status, 3);
		assert!(!out.ok());
		assert_eq!(out.stdout.trim(), "out");
		assert_eq!(out.error_text(), "err");
	}

	#[tokio::test]
	async fn timeout_is_reported_distinctly() {
		let inv = Invocation::new("sh", vec!["-c".into(), "sleep 5".into()]).with_timeout(1);
		match ProcessTransport.run(&inv).await {
			Err(TransportError::Timeout { secs, .. }) => assert_eq!(secs, 1),
			other => panic!("expected Timeout, got {:?}", other),
		}
	}
}

// vim: ts=4
