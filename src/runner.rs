//! Single-flight execution of strategies.
//!
//! At most one strategy invocation may run per profile endpoint at any
//! time. The registry hands out an RAII token via check-and-set; while a
//! token for an endpoint is alive, further requests are rejected, not
//! queued. Strategies run on their own tokio task so the caller's control
//! loop stays responsive.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::progress::{Event, Outcome, Reporter};

/// Registry of endpoints with an operation in flight.
#[derive(Clone, Default)]
pub struct ActiveOps {
	inner: Arc<Mutex<HashSet<String>>>,
}

/// RAII token: the endpoint stays busy until this is dropped.
pub struct OpToken {
	endpoint: String,
	inner: Arc<Mutex<HashSet<String>>>,
}

impl Drop for OpToken {
	fn drop(&mut self) {
		if let Ok(mut set) = self.inner.lock() {
			set.remove(&self.endpoint);
		}
	}
}

/// A strategy running in the background: its event stream plus a handle
/// resolving to the terminal outcome.
pub struct RunningOp {
	pub events: mpsc::UnboundedReceiver<Event>,
	pub handle: JoinHandle<Outcome>,
}

impl ActiveOps {
	pub fn new() -> Self {
		ActiveOps::default()
	}

	/// Check-and-set: claim the endpoint, or None if already busy.
	pub fn try_begin(&self, endpoint: &str) -> Option<OpToken> {
		let mut set = self.inner.lock().ok()?;
		if set.contains(endpoint) {
			return None;
		}
		set.insert(endpoint.to_string());
		Some(OpToken { endpoint: endpoint.to_string(), inner: Arc::clone(&self.inner) })
	}

	pub fn is_busy(&self, endpoint: &str) -> bool {
		self.inner.lock().map(|set| set.contains(endpoint)).unwrap_or(false)
	}

	/// Spawn a strategy for `endpoint` on a new task.
	///
	/// Returns None without running anything when the endpoint is busy.
	/// The claim is released when the strategy future finishes, success or
	/// not.
	pub fn spawn<Fut>(
		&self,
		endpoint: &str,
		make: impl FnOnce(Reporter) -> Fut,
	) -> Option<RunningOp>
	where
		Fut: Future<Output = Outcome> + Send + 'static,
	{
		let token = self.try_begin(endpoint)?;
		let (reporter, events) = Reporter::channel();
		let fut = make(reporter);
		let handle = tokio::spawn(async move {
			let outcome = fut.await;
			drop(token);
			outcome
		});
		Some(RunningOp { events, handle })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn second_request_on_busy_endpoint_is_rejected() {
		let ops = ActiveOps::new();
		let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

		let running = ops
			.spawn("work", move |_reporter| async move {
				let _ = release_rx.await;
				Outcome::ok("done")
			})
			.expect("first spawn accepted");

		assert!(ops.is_busy("work"));
		assert!(ops.spawn("work", |_r| async { Outcome::ok("second") }).is_none());
		// A different endpoint is unaffected
		assert!(ops.try_begin("other").is_some());

		release_tx.send(()).unwrap();
		let outcome = running.handle.await.unwrap();
		assert!(outcome.success);
		assert!(!ops.is_busy("work"));
	}

	#[tokio::test]
	async fn endpoint_frees_up_after_completion() {
		let ops = ActiveOps::new();
		let first = ops.spawn("work", |_r| async { Outcome::ok("one") }).unwrap();
		first.handle.await.unwrap();
		assert!(ops.spawn("work", |_r| async { Outcome::ok("two") }).is_some());
	}

	#[tokio::test]
	async fn events_flow_from_spawned_strategy() {
		let ops = ActiveOps::new();
		let mut running = ops
			.spawn("work", |reporter| async move {
				reporter.progress("step");
				Outcome::ok("done")
			})
			.unwrap();

		assert_eq!(running.events.recv().await, Some(Event::Progress("step".into())));
		assert!(running.handle.await.unwrap().success);
	}
}

// vim: ts=4
