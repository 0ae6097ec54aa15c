// self
use crate::obs::{CallOutcome, Diagnostic};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("vote_client_request_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a diagnostic via the global metrics recorder (when enabled).
pub fn record_diagnostic(diagnostic: Diagnostic) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("vote_client_diagnostic_total", "kind" => diagnostic.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = diagnostic;
	}
}
