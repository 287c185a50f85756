//! Progress events, terminal outcomes and cooperative cancellation.
//!
//! Cross-component communication is a stream of discrete event messages
//! over a channel plus one terminal [`Outcome`], instead of ad-hoc shared
//! mutable state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One message emitted while a strategy runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	/// Step-level status suitable for a status line
	Progress(String),
	/// Raw detail, e.g. the command line about to run
	Log(String),
}

/// Terminal value of a strategy invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
	pub success: bool,
	pub message: String,
}

impl Outcome {
	pub fn ok(message: impl Into<String>) -> Self {
		Outcome { success: true, message: message.into() }
	}

	pub fn fail(message: impl Into<String>) -> Self {
		Outcome { success: false, message: message.into() }
	}
}

/// Sender side of the event stream.
///
/// A dropped receiver must not abort a running strategy, so send failures
/// are ignored.
#[derive(Clone)]
pub struct Reporter {
	tx: Option<mpsc::UnboundedSender<Event>>,
}

impl Reporter {
	/// Reporter delivering into a channel; returns the receiving end too.
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Reporter { tx: Some(tx) }, rx)
	}

	/// Reporter that discards everything. Used by tests and fire-and-forget
	/// callers.
	pub fn sink() -> Self {
		Reporter { tx: None }
	}

	pub fn progress(&self, message: impl Into<String>) {
		if let Some(tx) = &self.tx {
			let _ = tx.send(Event::Progress(message.into()));
		}
	}

	pub fn log(&self, message: impl Into<String>) {
		if let Some(tx) = &self.tx {
			let _ = tx.send(Event::Log(message.into()));
		}
	}
}

/// Forward a drained event stream to the tracing subscriber.
///
/// Progress lines go out at info, command echoes at debug.
pub fn drain_to_log(mut rx: mpsc::UnboundedReceiver<Event>) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		while let Some(event) = rx.recv().await {
			match event {
				Event::Progress(msg) => tracing::info!("{}", msg),
				Event::Log(msg) => tracing::debug!("{}", msg),
			}
		}
	})
}

/// Cooperative cancellation flag.
///
/// Strategies check it between per-entry copy steps; an in-flight transport
/// call is not preemptible, so cancellation takes effect at the next entry
/// boundary.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		CancelFlag::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn reporter_delivers_in_order() {
		let (reporter, mut rx) = Reporter::channel();
		reporter.progress("step 1");
		reporter.log("$ ssh ...");
		reporter.progress("step 2");

		assert_eq!(rx.recv().await, Some(Event::Progress("step 1".into())));
		assert_eq!(rx.recv().await, Some(Event::Log("$ ssh ...".into())));
		assert_eq!(rx.recv().await, Some(Event::Progress("step 2".into())));
	}

	#[test]
	fn dropped_receiver_does_not_panic() {
		let (reporter, rx) = Reporter::channel();
		drop(rx);
		reporter.progress("nobody listening");
	}

	#[test]
	fn cancel_flag_is_shared() {
		let flag = CancelFlag::new();
		let clone = flag.clone();
		assert!(!flag.is_cancelled());
		clone.cancel();
		assert!(flag.is_cancelled());
	}
}

// vim: ts=4
