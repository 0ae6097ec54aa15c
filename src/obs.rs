//! Optional observability helpers for the request pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `vote_client.request` with the `method` and
//!   `stage` fields, and warn-level events for every [`Diagnostic`].
//! - Enable `metrics` to increment `vote_client_request_total` (labeled by `outcome`) and
//!   `vote_client_diagnostic_total` (labeled by `kind`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Conditions the pipeline reports without altering the call outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Diagnostic {
	/// The transport aborted the request on timeout; the upstream may be exhausted.
	Timeout,
	/// The failure message mentions a rate limit; throttling is in effect.
	Throttled,
	/// The token store failed and the call proceeded without credentials.
	StorageFallback,
}
impl Diagnostic {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Diagnostic::Timeout => "timeout",
			Diagnostic::Throttled => "throttled",
			Diagnostic::StorageFallback => "storage_fallback",
		}
	}

	/// Returns the operator-facing description logged with the diagnostic.
	pub const fn description(self) -> &'static str {
		match self {
			Diagnostic::Timeout => "Request timed out; the upstream may be exhausting resources.",
			Diagnostic::Throttled => "Upstream reports a rate limit; throttling is in effect.",
			Diagnostic::StorageFallback =>
				"Token store is unreadable; request continues without credentials.",
		}
	}
}
impl Display for Diagnostic {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to the pipeline.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Vetoed before dispatch.
	Rejected,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
			CallOutcome::Rejected => "rejected",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Receiver for [`Diagnostic`] events raised by interceptors and the token accessor.
pub trait DiagnosticSink
where
	Self: Send + Sync,
{
	/// Records `diagnostic`; `detail` carries the message of the triggering failure.
	fn emit(&self, diagnostic: Diagnostic, detail: &str);
}

/// Default sink forwarding diagnostics to `tracing` and `metrics` (when enabled).
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;
impl DiagnosticSink for TracingSink {
	fn emit(&self, diagnostic: Diagnostic, detail: &str) {
		log_diagnostic(diagnostic, detail);
		record_diagnostic(diagnostic);
	}
}

/// Sink that keeps every diagnostic in memory, for tests and health probes.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<(Diagnostic, String)>>>);
impl RecordingSink {
	/// Returns the diagnostics recorded so far.
	pub fn recorded(&self) -> Vec<(Diagnostic, String)> {
		self.0.lock().clone()
	}

	/// Returns only the diagnostic kinds recorded so far.
	pub fn kinds(&self) -> Vec<Diagnostic> {
		self.0.lock().iter().map(|(kind, _)| *kind).collect()
	}
}
impl DiagnosticSink for RecordingSink {
	fn emit(&self, diagnostic: Diagnostic, detail: &str) {
		self.0.lock().push((diagnostic, detail.to_owned()));
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_sink_keeps_order() {
		let sink = RecordingSink::default();

		sink.emit(Diagnostic::Timeout, "timed out");
		sink.emit(Diagnostic::Throttled, "rate limit");

		assert_eq!(sink.kinds(), vec![Diagnostic::Timeout, Diagnostic::Throttled]);
		assert_eq!(sink.recorded()[0].1, "timed out");
	}

	#[test]
	fn tracing_sink_is_noop_safe() {
		TracingSink.emit(Diagnostic::StorageFallback, "store offline");
	}
}
