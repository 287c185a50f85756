//! Command-line construction for the external ssh/scp programs.
//!
//! Everything that interpolates a path into a remote shell fragment goes
//! through [`shell_quote`], so paths containing spaces, quotes or `$` are
//! passed to the remote side verbatim instead of being re-interpreted.

use crate::config::Profile;

/// Remote holding area for content displaced by a mirror push.
pub const REMOTE_TRASH: &str = "~/.parasync_trash";

/// Connect timeout passed to ssh/scp via `-o ConnectTimeout`.
const CONNECT_TIMEOUT_SECS: u32 = 10;

/// Quote a string for a POSIX shell.
///
/// Single-quotes the whole argument and escapes embedded single quotes with
/// the `'\''` dance. The result is safe to splice into a remote command
/// string no matter what the input contains.
pub fn shell_quote(s: &str) -> String {
	if s.is_empty() {
		return "''".to_string();
	}
	let mut quoted = String::with_capacity(s.len() + 2);
	quoted.push('\'');
	for ch in s.chars() {
		if ch == '\'' {
			quoted.push_str("'\\''");
		} else {
			quoted.push(ch);
		}
	}
	quoted.push('\'');
	quoted
}

/// `user@host` target string for ssh/scp.
pub fn remote_target(profile: &Profile) -> String {
	format!("{}@{}", profile.user, profile.host)
}

fn common_options(args: &mut Vec<String>, batch_mode: bool) {
	if batch_mode {
		args.push("-o".into());
		args.push("BatchMode=yes".into());
	}
	args.push("-o".into());
	args.push(format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS));
	args.push("-o".into());
	args.push("StrictHostKeyChecking=accept-new".into());
}

/// Base argument list for an ssh invocation (target and remote command are
/// appended by the caller).
///
/// `batch_mode` makes ssh fail fast instead of prompting; machine-triggered
/// operations always set it, the interactive key-install step does not.
pub fn ssh_args(profile: &Profile, batch_mode: bool) -> Vec<String> {
	let mut args = Vec::new();
	common_options(&mut args, batch_mode);
	args.push("-p".into());
	args.push(profile.port.to_string());
	if !profile.identity_file.is_empty() {
		args.push("-i".into());
		args.push(profile.identity_file.clone());
	}
	args
}

/// Base argument list for a recursive scp invocation.
pub fn scp_args(profile: &Profile) -> Vec<String> {
	let mut args = Vec::new();
	common_options(&mut args, true);
	args.push("-r".into());
	args.push("-P".into());
	args.push(profile.port.to_string());
	if !profile.identity_file.is_empty() {
		args.push("-i".into());
		args.push(profile.identity_file.clone());
	}
	args
}

/// Remote operand for scp (`user@host:'path'`). The path is quoted because
/// the remote shell expands it a second time.
pub fn scp_remote_operand(profile: &Profile, path: &str) -> String {
	format!("{}:{}", remote_target(profile), shell_quote(path))
}

/// Non-recursive listing of one remote directory.
///
/// A missing directory must look exactly like an empty one: the listing
/// error is suppressed and the fallback emits nothing, so only ssh-level
/// failures (auth, network) produce a non-zero exit.
pub fn list_dir_cmd(path: &str) -> String {
	format!("ls -1 {} 2>/dev/null || echo ''", shell_quote(path))
}

/// Idempotent remote directory creation.
pub fn mkdir_cmd(path: &str) -> String {
	format!("mkdir -p {}", shell_quote(path))
}

/// One-round-trip mirror preparation: create the trash area, displace any
/// current destination contents (hidden entries included) into it, then
/// (re)create the destination.
///
/// The three globs cover plain names, `.name` and `..name`. An unmatched
/// glob makes `mv` exit non-zero even after moving everything else, so its
/// status is discarded and the `ls -A` emptiness check afterwards decides
/// whether the displacement actually worked.
pub fn prepare_mirror_cmd(dest: &str) -> String {
	let q = shell_quote(dest);
	format!(
		"mkdir -p {trash} && \
		 if [ -d {q} ]; then \
		 mv {q}/* {q}/.[!.]* {q}/..?* {trash}/ 2>/dev/null; \
		 [ -z \"$(ls -A {q} 2>/dev/null)\" ]; fi && \
		 mkdir -p {q}",
		trash = REMOTE_TRASH,
		q = q
	)
}

/// Duplicate-safe authorized_keys install with restrictive permissions.
///
/// The `grep -qxF` containment check skips the append when the exact key
/// line is already present, so repeated setups do not grow the file.
pub fn install_key_cmd(pubkey: &str, sentinel: &str) -> String {
	let k = shell_quote(pubkey);
	format!(
		"mkdir -p ~/.ssh && chmod 700 ~/.ssh && \
		 grep -qxF {k} ~/.ssh/authorized_keys 2>/dev/null || \
		 echo {k} >> ~/.ssh/authorized_keys && \
		 chmod 600 ~/.ssh/authorized_keys && echo {sentinel}",
		k = k,
		sentinel = sentinel
	)
}


// vim: ts=4
