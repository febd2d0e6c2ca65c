//! Optional observability helpers for cache fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit a structured span named `token_cache.fetch` plus start, success
//!   (with elapsed time), and failure events.
//! - Enable `metrics` to increment the `scm_token_cache_fetch_total` counter for every
//!   attempt/success/failure, labeled by `outcome`.

// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFetch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFetch<F> = F;

/// Outcome labels recorded for each fetch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
	/// Entry to the fetch helper.
	Attempt,
	/// Successful completion, cached or freshly fetched.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchOutcome::Attempt => "attempt",
			FetchOutcome::Success => "success",
			FetchOutcome::Failure => "failure",
		}
	}
}
impl Display for FetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a fetch outcome via the global metrics recorder (when enabled).
pub fn record_fetch_outcome(outcome: FetchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("scm_token_cache_fetch_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// A span builder used by the cache fetch path.
#[derive(Clone, Debug)]
pub struct FetchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FetchSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_cache.fetch", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFetch<Fut>
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

/// Emits a cache-hit event (no-op unless `tracing` is enabled).
pub(crate) fn cache_hit() {
	#[cfg(feature = "tracing")]
	tracing::debug!("Returning cached token.");
}

/// Emits a fetch-start event carrying the target endpoint.
pub(crate) fn fetch_started(endpoint: &Url) {
	#[cfg(feature = "tracing")]
	tracing::info!(%endpoint, "Fetching a new token: cache is expired or a refresh was forced.");
	#[cfg(not(feature = "tracing"))]
	let _ = endpoint;
}

/// Emits a fetch-success event carrying the elapsed round-trip time.
pub(crate) fn fetch_succeeded(elapsed: std::time::Duration, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		elapsed_ms = elapsed.as_millis() as u64,
		%expires_at,
		"New token fetched successfully."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (elapsed, expires_at);
}

/// Emits a fetch-failure event carrying the error.
pub(crate) fn fetch_failed(error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(%error, "Token fetch failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}
