//! Transfer strategies: the four operations a caller can run against a
//! profile endpoint.
//!
//! Every strategy is a fixed sequence of steps over the transport gateway
//! and the listers. Steps run strictly in order because later steps depend
//! on state left by earlier ones. Nothing here retries: a transport-level
//! failure aborts the strategy at the step where it happened, and partial
//! completion is surfaced in the outcome message, never rolled back.

use std::collections::BTreeSet;
use std::path::Path;

use crate::command;
use crate::config::Profile;
use crate::diff::{self, DirDiff};
use crate::error::{SyncError, TransportError};
use crate::listing;
use crate::progress::{CancelFlag, Outcome, Reporter};
use crate::transport::{CmdOutput, Invocation, Transport};
use crate::trash;

/// Sentinel echoed by the connectivity test.
pub const SSH_OK: &str = "SSH_OK";

const TEST_TIMEOUT_SECS: u64 = 15;
const PREPARE_TIMEOUT_SECS: u64 = 30;
const MKDIR_TIMEOUT_SECS: u64 = 15;
/// Per-entry bound for mirror push copies
const PUSH_COPY_TIMEOUT_SECS: u64 = 600;
/// Per-entry bound for merge copies
const MERGE_COPY_TIMEOUT_SECS: u64 = 300;
/// Bound for the single bulk pull copy
const PULL_COPY_TIMEOUT_SECS: u64 = 600;

/// Why a connectivity test failed. The bootstrap flow branches on this:
/// an auth rejection means key setup can help, an unreachable host means
/// it cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
	AuthRejected,
	Unreachable,
	Other,
}

/// Classify a failed ssh invocation from its captured error text.
pub fn classify_connect_failure(out: &CmdOutput) -> ConnectFailure {
	let err = out.error_text();
	if err.contains("Permission denied") || err.contains("Too many authentication failures") {
		return ConnectFailure::AuthRejected;
	}
	let unreachable = [
		"Connection refused",
		"Connection timed out",
		"Operation timed out",
		"No route to host",
		"Network is unreachable",
		"Could not resolve hostname",
	];
	if unreachable.iter().any(|pat| err.contains(pat)) {
		return ConnectFailure::Unreachable;
	}
	ConnectFailure::Other
}

/// Log the command line and run it through the transport.
async fn run_logged(
	transport: &dyn Transport,
	reporter: &Reporter,
	inv: &Invocation,
) -> Result<CmdOutput, TransportError> {
	reporter.log(format!("$ {}", inv.display_line()));
	transport.run(inv).await
}

fn ssh_invocation(profile: &Profile, remote_cmd: &str, timeout_secs: u64) -> Invocation {
	let mut args = command::ssh_args(profile, true);
	args.push(command::remote_target(profile));
	args.push(remote_cmd.to_string());
	Invocation::new("ssh", args).with_timeout(timeout_secs)
}

/// Run a trivial remote echo and check for the sentinel.
///
/// Success iff the command exits 0 and the sentinel appears in stdout.
/// No retry; the failure message names the failure class so callers can
/// branch on it.
pub async fn test_connection(
	transport: &dyn Transport,
	profile: &Profile,
	reporter: &Reporter,
) -> Outcome {
	reporter.progress(format!("Testing SSH to {}...", profile.host));

	let mut args = command::ssh_args(profile, true);
	args.push(command::remote_target(profile));
	args.push("echo".into());
	args.push(SSH_OK.into());
	let inv = Invocation::new("ssh", args).with_timeout(TEST_TIMEOUT_SECS);

	match run_logged(transport, reporter, &inv).await {
		Ok(out) if out.ok() && out.stdout.contains(SSH_OK) => {
			Outcome::ok(format!("Connected to {}", command::remote_target(profile)))
		}
		Ok(out) => match classify_connect_failure(&out) {
			ConnectFailure::AuthRejected => {
				Outcome::fail("Authentication rejected: passwordless SSH is not set up")
			}
			ConnectFailure::Unreachable => {
				Outcome::fail(format!("Host unreachable: {}", out.error_text()))
			}
			ConnectFailure::Other => {
				Outcome::fail(format!("Connection failed: {}", out.error_text()))
			}
		},
		Err(TransportError::Timeout { .. }) => {
			Outcome::fail(format!("Host unreachable: no answer within {}s", TEST_TIMEOUT_SECS))
		}
		Err(e) => Outcome::fail(format!("Connection failed: {}", e)),
	}
}

/// Non-mutating preview of what a mirror push would change: `to_add` is
/// what would be copied over, `to_delete` what would be displaced into the
/// remote trash, `to_overwrite` what exists on both sides.
///
/// One listing round trip per side and nothing else; reading the preview
/// the other way around describes a pull.
pub async fn preview_diff(
	transport: &dyn Transport,
	profile: &Profile,
) -> Result<DirDiff, SyncError> {
	let local_files = listing::local_entries(Path::new(&profile.local_path));
	let remote_files = listing::remote_entries(transport, profile, &profile.remote_path).await?;
	Ok(diff::diff(&local_files, &remote_files))
}

/// Mirror push, local → remote. Destructive on the remote side, but the
/// prior remote contents are displaced into the remote trash area, never
/// deleted.
pub async fn mirror_push(
	transport: &dyn Transport,
	profile: &Profile,
	reporter: &Reporter,
	cancel: &CancelFlag,
) -> Outcome {
	let local = Path::new(&profile.local_path);
	if !local.exists() {
		return Outcome::fail(format!("Local path not found: {}", profile.local_path));
	}

	if profile.ensure_remote_dir {
		// One round trip: trash current contents, recreate the directory.
		// If this fails the destination is in an unknown state, so abort
		// before touching any file contents.
		reporter.progress("Moving old remote files to trash...");
		let prep = ssh_invocation(
			profile,
			&command::prepare_mirror_cmd(&profile.remote_path),
			PREPARE_TIMEOUT_SECS,
		);
		match run_logged(transport, reporter, &prep).await {
			Ok(out) if out.ok() => {}
			Ok(out) => {
				return Outcome::fail(format!(
					"Failed to prepare remote folder: {}",
					out.error_text()
				))
			}
			Err(e) => return Outcome::fail(format!("Failed to prepare remote folder: {}", e)),
		}
	}

	let entries = listing::local_entries(local);
	if entries.is_empty() {
		return Outcome::ok("Pushed: (empty source)");
	}

	// Entries go up one by one so a failure names the exact entry.
	let total = entries.len();
	for (i, name) in entries.iter().enumerate() {
		if cancel.is_cancelled() {
			return Outcome::fail(format!(
				"Cancelled after {} of {} entries; already-copied entries were kept",
				i, total
			));
		}
		reporter.progress(format!("Copying {} ({}/{})...", name, i + 1, total));

		let mut args = command::scp_args(profile);
		args.push(local.join(name).display().to_string());
		args.push(command::scp_remote_operand(profile, &format!("{}/", profile.remote_path)));
		let inv = Invocation::new("scp", args).with_timeout(PUSH_COPY_TIMEOUT_SECS);

		match run_logged(transport, reporter, &inv).await {
			Ok(out) if out.ok() => {}
			Ok(out) => {
				return Outcome::fail(format!("Push failed on {}: {}", name, out.error_text()))
			}
			Err(e) => return Outcome::fail(format!("Push failed on {}: {}", name, e)),
		}
	}

	Outcome::ok(format!("Pushed {} entries to {}", total, profile.host))
}

/// Mirror pull, remote → local. Destructive on the local side; prior local
/// contents go to the local trash, with numeric suffixes on name
/// collisions.
pub async fn mirror_pull(
	transport: &dyn Transport,
	profile: &Profile,
	trash_dir: &Path,
	reporter: &Reporter,
) -> Outcome {
	let local = Path::new(&profile.local_path);

	reporter.progress("Moving old local files to trash...");
	match trash::displace_contents(local, trash_dir) {
		Ok(moved) if moved > 0 => {
			reporter.log(format!("Moved {} entries to {}", moved, trash_dir.display()))
		}
		Ok(_) => {}
		Err(e) => return Outcome::fail(format!("Failed to move local files to trash: {}", e)),
	}
	if let Err(e) = std::fs::create_dir_all(local) {
		return Outcome::fail(format!("Failed to recreate {}: {}", local.display(), e));
	}

	// One bulk copy for everything under the remote path
	reporter.progress(format!("Pulling files from {}...", profile.host));
	let mut args = command::scp_args(profile);
	args.push(format!(
		"{}:{}/*",
		command::remote_target(profile),
		command::shell_quote(&profile.remote_path)
	));
	args.push(local.display().to_string());
	let inv = Invocation::new("scp", args).with_timeout(PULL_COPY_TIMEOUT_SECS);

	match run_logged(transport, reporter, &inv).await {
		Ok(out) if out.ok() => {
			Outcome::ok(format!("Pulled from {} into {}", profile.host, local.display()))
		}
		// scp reports an empty remote directory as "no such file"; the
		// local side was already prepared, so that is an empty result, not
		// a failure
		Ok(out) if out.stderr.contains("No such file") || out.stderr.trim().is_empty() => {
			Outcome::ok("Pulled: (remote folder empty)")
		}
		Ok(out) => Outcome::fail(format!("Pull failed: {}", out.error_text())),
		Err(e) => Outcome::fail(format!("Pull failed: {}", e)),
	}
}

async fn merge_copy_to_remote(
	transport: &dyn Transport,
	profile: &Profile,
	reporter: &Reporter,
	name: &str,
) -> Result<(), Outcome> {
	let mut args = command::scp_args(profile);
	args.push(Path::new(&profile.local_path).join(name).display().to_string());
	args.push(command::scp_remote_operand(profile, &format!("{}/", profile.remote_path)));
	let inv = Invocation::new("scp", args).with_timeout(MERGE_COPY_TIMEOUT_SECS);

	match run_logged(transport, reporter, &inv).await {
		Ok(out) if out.ok() => Ok(()),
		Ok(out) => {
			Err(Outcome::fail(format!("Failed to copy {} to remote: {}", name, out.error_text())))
		}
		Err(e) => Err(Outcome::fail(format!("Failed to copy {} to remote: {}", name, e))),
	}
}

async fn merge_copy_to_local(
	transport: &dyn Transport,
	profile: &Profile,
	reporter: &Reporter,
	name: &str,
) -> Result<(), Outcome> {
	let mut args = command::scp_args(profile);
	args.push(command::scp_remote_operand(
		profile,
		&format!("{}/{}", profile.remote_path, name),
	));
	args.push(profile.local_path.clone());
	let inv = Invocation::new("scp", args).with_timeout(MERGE_COPY_TIMEOUT_SECS);

	match run_logged(transport, reporter, &inv).await {
		Ok(out) if out.ok() => Ok(()),
		Ok(out) => {
			Err(Outcome::fail(format!("Failed to copy {} to local: {}", name, out.error_text())))
		}
		Err(e) => Err(Outcome::fail(format!("Failed to copy {} to local: {}", name, e))),
	}
}

/// Two-way merge: copy names missing from each side, delete nothing.
///
/// Entries present on both sides are left exactly as they are on both
/// sides; content-level conflict detection is out of scope by design, so
/// the overlap set is never acted on.
pub async fn two_way_merge(
	transport: &dyn Transport,
	profile: &Profile,
	reporter: &Reporter,
	cancel: &CancelFlag,
) -> Outcome {
	let local = Path::new(&profile.local_path);
	if let Err(e) = std::fs::create_dir_all(local) {
		return Outcome::fail(format!("Failed to create {}: {}", local.display(), e));
	}

	// Two independent snapshots; they are not atomic with respect to each
	// other and the strategy has to tolerate that
	let local_files = listing::local_entries(local);
	reporter.progress("Checking remote files...");
	let remote_files =
		match listing::remote_entries(transport, profile, &profile.remote_path).await {
			Ok(files) => files,
			Err(e) => return Outcome::fail(format!("Failed to list remote folder: {}", e)),
		};

	// Only the source-only side of each diff is acted on
	let local_only: BTreeSet<String> = diff::diff(&local_files, &remote_files).to_add;
	let remote_only: BTreeSet<String> = diff::diff(&remote_files, &local_files).to_add;

	let mkdir = ssh_invocation(
		profile,
		&command::mkdir_cmd(&profile.remote_path),
		MKDIR_TIMEOUT_SECS,
	);
	match run_logged(transport, reporter, &mkdir).await {
		Ok(out) if out.ok() => {}
		Ok(out) => {
			return Outcome::fail(format!("Failed to create remote folder: {}", out.error_text()))
		}
		Err(e) => return Outcome::fail(format!("Failed to create remote folder: {}", e)),
	}

	if !local_only.is_empty() {
		reporter.progress(format!("Copying {} entries to {}...", local_only.len(), profile.host));
		for name in &local_only {
			if cancel.is_cancelled() {
				return Outcome::fail("Cancelled during merge; copied entries were kept");
			}
			if let Err(outcome) = merge_copy_to_remote(transport, profile, reporter, name).await {
				return outcome;
			}
		}
	}

	if !remote_only.is_empty() {
		reporter.progress(format!(
			"Copying {} entries from {}...",
			remote_only.len(),
			profile.host
		));
		for name in &remote_only {
			if cancel.is_cancelled() {
				return Outcome::fail("Cancelled during merge; copied entries were kept");
			}
			if let Err(outcome) = merge_copy_to_local(transport, profile, reporter, name).await {
				return outcome;
			}
		}
	}

	if local_only.is_empty() && remote_only.is_empty() {
		Outcome::ok("Already in sync")
	} else {
		Outcome::ok(format!(
			"Synced: +{} to remote, +{} to local",
			local_only.len(),
			remote_only.len()
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn output(status: i32, stdout: &str, stderr: &str) -> CmdOutput {
		CmdOutput { status, stdout: stdout.into(), stderr: stderr.into() }
	}

	#[test]
	fn permission_denied_is_auth_rejected() {
		let out = output(255, "", "me@host: Permission denied (publickey,password).");
		assert_eq!(classify_connect_failure(&out), ConnectFailure::AuthRejected);
	}

	#[test]
	fn connection_refused_is_unreachable() {
		let out = output(255, "", "ssh: connect to host 10.0.0.9 port 22: Connection refused");
		assert_eq!(classify_connect_failure(&out), ConnectFailure::Unreachable);
	}

	#[test]
	fn resolve_failure_is_unreachable() {
		let out = output(255, "", "ssh: Could not resolve hostname nowhere: Name or service not known");
		assert_eq!(classify_connect_failure(&out), ConnectFailure::Unreachable);
	}

	#[test]
	fn unknown_failure_is_other() {
		let out = output(1, "", "some unexpected message");
		assert_eq!(classify_connect_failure(&out), ConnectFailure::Other);
	}
}

// vim: ts=4
