//! Passwordless-authentication bootstrap: key generation, remote install,
//! verification.
//!
//! The whole flow only reports success if the final passwordless
//! connectivity check passes. A key that installed fine but does not
//! verify is a partial failure with the verification error attached.

use std::path::PathBuf;

use crate::command;
use crate::config::{AppDirs, Profile};
use crate::progress::{Outcome, Reporter};
use crate::strategies;
use crate::transport::{Invocation, Transport};

/// Sentinel echoed by the remote install command.
pub const KEY_INSTALLED: &str = "KEY_INSTALLED";

const KEYGEN_TIMEOUT_SECS: u64 = 30;
const INSTALL_TIMEOUT_SECS: u64 = 60;

fn public_key_path(key_path: &PathBuf) -> PathBuf {
	let mut p = key_path.clone().into_os_string();
	p.push(".pub");
	PathBuf::from(p)
}

/// Generate (if absent), install and verify a passwordless key pair.
pub async fn setup_passwordless(
	transport: &dyn Transport,
	profile: &Profile,
	dirs: &AppDirs,
	reporter: &Reporter,
) -> Outcome {
	let key_path = &dirs.key_path;
	let pub_path = public_key_path(key_path);

	if !key_path.exists() {
		reporter.progress("Generating SSH key...");
		if let Some(parent) = key_path.parent() {
			if let Err(e) = std::fs::create_dir_all(parent) {
				return Outcome::fail(format!("Failed to generate key: {}", e));
			}
		}
		let inv = Invocation::new(
			"ssh-keygen",
			vec![
				"-t".into(),
				"ed25519".into(),
				"-C".into(),
				"parasync".into(),
				"-f".into(),
				key_path.display().to_string(),
				"-N".into(),
				String::new(),
			],
		)
		.with_timeout(KEYGEN_TIMEOUT_SECS);
		reporter.log(format!("$ {}", inv.display_line()));
		match transport.run(&inv).await {
			Ok(out) if out.ok() => {}
			Ok(out) => {
				return Outcome::fail(format!("Failed to generate key: {}", out.error_text()))
			}
			Err(e) => return Outcome::fail(format!("Failed to generate key: {}", e)),
		}
	}

	let pubkey = match std::fs::read_to_string(&pub_path) {
		Ok(k) => k.trim().to_string(),
		Err(e) => {
			return Outcome::fail(format!("Failed to read {}: {}", pub_path.display(), e))
		}
	};

	// Interactive ssh (no batch mode): this step may legitimately prompt
	// for the remote password, since the key is not installed yet
	reporter.progress("Installing key on remote (enter password if prompted)...");
	let mut args = command::ssh_args(profile, false);
	args.push(command::remote_target(profile));
	args.push(command::install_key_cmd(&pubkey, KEY_INSTALLED));
	let inv = Invocation::new("ssh", args).with_timeout(INSTALL_TIMEOUT_SECS);
	reporter.log(format!("$ {}", inv.display_line()));
	match transport.run(&inv).await {
		Ok(out) if out.ok() && out.stdout.contains(KEY_INSTALLED) => {}
		Ok(out) => return Outcome::fail(format!("Failed to install key: {}", out.error_text())),
		Err(e) => return Outcome::fail(format!("Failed to install key: {}", e)),
	}

	// Success of this verification is the only condition under which the
	// whole bootstrap reports success
	reporter.progress("Verifying passwordless login...");
	let mut verified = profile.clone();
	verified.identity_file = key_path.display().to_string();
	let check = strategies::test_connection(transport, &verified, reporter).await;
	if check.success {
		Outcome::ok("Setup complete: passwordless SSH verified")
	} else {
		Outcome::fail(format!("Key installed but verification failed: {}", check.message))
	}
}


// vim: ts=4
