// self
use crate::{_prelude::*, obs::Diagnostic};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by the client pipeline.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the HTTP method + stage.
	pub fn new(method: &str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("vote_client.request", method, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs `diagnostic` at warn level (debug for storage fallbacks) when tracing is enabled.
pub fn log_diagnostic(diagnostic: Diagnostic, detail: &str) {
	#[cfg(feature = "tracing")]
	{
		match diagnostic {
			Diagnostic::StorageFallback => tracing::debug!(
				kind = diagnostic.as_str(),
				detail,
				"{}",
				diagnostic.description()
			),
			_ => tracing::warn!(
				kind = diagnostic.as_str(),
				detail,
				"{}",
				diagnostic.description()
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (diagnostic, detail);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn log_diagnostic_noop_without_tracing() {
		log_diagnostic(Diagnostic::Throttled, "429");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new("GET", "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
