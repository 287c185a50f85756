//! Debounced filesystem-change-triggered push.
//!
//! Each change event (re)starts a fixed quiet-period timer; only when the
//! timer fires with no intervening event does a push run. A push already
//! in flight for the endpoint suppresses the trigger entirely — dropped,
//! not queued.

use notify::{RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::Profile;
use crate::error::SyncError;
use crate::logging::*;
use crate::progress::{CancelFlag, Reporter};
use crate::runner::ActiveOps;
use crate::strategies;
use crate::transport::Transport;

/// Quiet period after the last change before a push fires.
pub const DEBOUNCE: Duration = Duration::from_secs(2);

/// Timer-reset debounce over a change-event stream.
///
/// Consumes events until `quiet` elapses with none arriving, then returns
/// true. Returns false when the stream closes, before or after events.
pub async fn quiet_period<T>(rx: &mut mpsc::UnboundedReceiver<T>, quiet: Duration) -> bool {
	if rx.recv().await.is_none() {
		return false;
	}
	loop {
		match timeout(quiet, rx.recv()).await {
			// Another change: restart the quiet period
			Ok(Some(_)) => continue,
			Ok(None) => return false,
			Err(_) => return true,
		}
	}
}

/// Watch the profile's local path and auto-push after every quiet period.
///
/// Runs until the watcher fails or the process is stopped.
pub async fn watch_and_push(
	transport: Arc<dyn Transport>,
	profile: Profile,
	ops: ActiveOps,
) -> Result<(), SyncError> {
	if !Path::new(&profile.local_path).exists() {
		return Err(SyncError::PathNotFound { path: profile.local_path.clone() });
	}

	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
		if let Ok(event) = res {
			let _ = tx.send(event);
		}
	})
	.map_err(|e| SyncError::Other { message: format!("Watcher setup failed: {}", e) })?;
	watcher
		.watch(Path::new(&profile.local_path), RecursiveMode::Recursive)
		.map_err(|e| SyncError::Other { message: format!("Cannot watch {}: {}", profile.local_path, e) })?;

	info!("Watching {} (push after {:?} of quiet)", profile.local_path, DEBOUNCE);

	while quiet_period(&mut rx, DEBOUNCE).await {
		trigger_push(&transport, &profile, &ops).await;
	}

	Ok(())
}

/// Fire one auto-push unless the endpoint is busy.
///
/// The push runs detached so the quiet-period loop keeps consuming change
/// events while it is in flight; a trigger that lands during that window
/// is dropped here. Returns whether a push was started.
async fn trigger_push(transport: &Arc<dyn Transport>, profile: &Profile, ops: &ActiveOps) -> bool {
	if ops.is_busy(&profile.name) {
		// Drop the trigger: the running operation will pick up the
		// final state on the next change anyway
		debug!("Change detected but an operation is in flight; skipping");
		return false;
	}
	info!("Auto-pushing (change detected)...");

	let transport = Arc::clone(transport);
	let push_profile = profile.clone();
	let running = ops.spawn(&profile.name, move |reporter: Reporter| async move {
		let cancel = CancelFlag::new();
		strategies::mirror_push(transport.as_ref(), &push_profile, &reporter, &cancel).await
	});
	match running {
		Some(running) => {
			let _ = crate::progress::drain_to_log(running.events);
			tokio::spawn(async move {
				match running.handle.await {
					Ok(outcome) if outcome.success => info!("{}", outcome.message),
					Ok(outcome) => warn!("Auto-push failed: {}", outcome.message),
					Err(e) => warn!("Auto-push task failed: {}", e),
				}
			});
			true
		}
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tempfile::TempDir;

	use crate::error::TransportError;
	use crate::transport::{CmdOutput, Invocation};

	#[derive(Default)]
	struct CountingTransport {
		calls: AtomicUsize,
	}

	#[async_trait]
	impl Transport for CountingTransport {
		async fn run(&self, _inv: &Invocation) -> Result<CmdOutput, TransportError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(CmdOutput { status: 0, stdout: String::new(), stderr: String::new() })
		}
	}

	fn watch_profile(local: &TempDir) -> Profile {
		Profile {
			name: "watched".into(),
			host: "10.211.55.2".into(),
			user: "me".into(),
			local_path: local.path().display().to_string(),
			remote_path: "/dst".into(),
			ensure_remote_dir: false,
			..Profile::default()
		}
	}

	#[tokio::test]
	async fn busy_endpoint_drops_the_trigger() {
		let local = TempDir::new().unwrap();
		let ops = ActiveOps::new();
		let _token = ops.try_begin("watched").unwrap();

		let counting = Arc::new(CountingTransport::default());
		let transport: Arc<dyn Transport> = counting.clone();
		assert!(!trigger_push(&transport, &watch_profile(&local), &ops).await);
		assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn free_endpoint_starts_a_push() {
		let local = TempDir::new().unwrap();
		let ops = ActiveOps::new();
		let transport: Arc<dyn Transport> = Arc::new(CountingTransport::default());
		assert!(trigger_push(&transport, &watch_profile(&local), &ops).await);
	}

	#[tokio::test(start_paused = true)]
	async fn quiet_period_waits_out_bursts() {
		let (tx, mut rx) = mpsc::unbounded_channel();
		let quiet = Duration::from_secs(2);

		let waiter = tokio::spawn(async move { quiet_period(&mut rx, quiet).await });

		// A burst of changes inside the window keeps resetting the timer
		for _ in 0..3 {
			tx.send(()).unwrap();
			tokio::time::sleep(Duration::from_secs(1)).await;
		}
		assert!(!waiter.is_finished());

		// Quiet period elapses with no further events
		tokio::time::sleep(Duration::from_secs(3)).await;
		assert!(waiter.await.unwrap());
	}

	#[tokio::test(start_paused = true)]
	async fn closed_stream_never_fires() {
		let (tx, mut rx) = mpsc::unbounded_channel::<()>();
		drop(tx);
		assert!(!quiet_period(&mut rx, Duration::from_secs(2)).await);
	}

	#[tokio::test(start_paused = true)]
	async fn one_event_fires_after_the_delay() {
		let (tx, mut rx) = mpsc::unbounded_channel();
		tx.send(()).unwrap();
		let fired = tokio::spawn(async move { quiet_period(&mut rx, Duration::from_secs(2)).await });
		tokio::time::sleep(Duration::from_secs(3)).await;
		assert!(fired.await.unwrap());
	}
}

// vim: ts=4
