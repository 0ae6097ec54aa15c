//! Sliding-window rate limiting that bounds outbound call volume per client.
//!
//! The limiter keeps the instants of recently accepted attempts and refuses a new attempt once
//! the trailing window already holds `max_requests` of them. Rejected attempts are never
//! recorded, so the window frees up as soon as its oldest entry ages out.

// std
use std::collections::VecDeque;
// self
use crate::{_prelude::*, error::ConfigError};

/// Source of the current instant used by the limiter.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for deterministic tests and simulations.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(instant)))
	}

	/// Moves the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Advances the clock by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Window length and request budget for a [`SlidingWindowLimiter`].
///
/// Deserialization goes through [`RateLimitPolicy::new`], so a loaded configuration can never
/// carry an empty window or a zero budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy", into = "RawPolicy")]
pub struct RateLimitPolicy {
	window: Duration,
	max_requests: usize,
}
impl RateLimitPolicy {
	/// Default window: one minute.
	pub const DEFAULT_WINDOW: Duration = Duration::seconds(60);
	/// Default budget: sixty attempts per window.
	pub const DEFAULT_MAX_REQUESTS: usize = 60;

	/// Creates a policy, rejecting empty windows and zero budgets.
	pub fn new(window: Duration, max_requests: usize) -> Result<Self, ConfigError> {
		if !window.is_positive() || max_requests == 0 {
			return Err(ConfigError::InvalidRateLimit);
		}

		Ok(Self { window, max_requests })
	}

	/// Trailing span in which attempts are counted.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Maximum accepted attempts inside one window.
	pub fn max_requests(&self) -> usize {
		self.max_requests
	}
}
impl Default for RateLimitPolicy {
	fn default() -> Self {
		Self { window: Self::DEFAULT_WINDOW, max_requests: Self::DEFAULT_MAX_REQUESTS }
	}
}
impl TryFrom<RawPolicy> for RateLimitPolicy {
	type Error = ConfigError;

	fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
		Self::new(raw.window, raw.max_requests)
	}
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct RawPolicy {
	#[serde(with = "crate::config::duration_millis")]
	window: Duration,
	max_requests: usize,
}
impl Default for RawPolicy {
	fn default() -> Self {
		RateLimitPolicy::default().into()
	}
}
impl From<RateLimitPolicy> for RawPolicy {
	fn from(policy: RateLimitPolicy) -> Self {
		Self { window: policy.window, max_requests: policy.max_requests }
	}
}

/// Result of [`SlidingWindowLimiter::check_and_record`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The attempt was recorded and may proceed.
	Accept,
	/// The window is full; the attempt was not recorded.
	Reject(RetryHint),
}
impl RateLimitDecision {
	/// Returns `true` for [`RateLimitDecision::Accept`].
	pub fn is_accept(&self) -> bool {
		matches!(self, Self::Accept)
	}
}

/// Advises callers when the window will admit another attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryHint {
	/// Instant at which the oldest counted attempt leaves the window.
	pub earliest_retry_at: OffsetDateTime,
	/// Time remaining until `earliest_retry_at`, measured from the rejected attempt.
	pub wait: Duration,
}

/// In-process sliding-window limiter owned by a single client.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
	policy: RateLimitPolicy,
	window: Mutex<VecDeque<OffsetDateTime>>,
}
impl SlidingWindowLimiter {
	/// Creates an empty limiter for `policy`.
	pub fn new(policy: RateLimitPolicy) -> Self {
		Self { policy, window: Mutex::new(VecDeque::new()) }
	}

	/// Returns the policy this limiter enforces.
	pub fn policy(&self) -> RateLimitPolicy {
		self.policy
	}

	/// Prunes expired attempts and records `now` if the window still has room.
	///
	/// Entries at or before `now - window` are discarded. When `max_requests` entries survive,
	/// the attempt is rejected and left out of the window.
	pub fn check_and_record(&self, now: OffsetDateTime) -> RateLimitDecision {
		let mut window = self.window.lock();

		Self::prune(&mut window, now - self.policy.window);

		if window.len() >= self.policy.max_requests {
			// Wall clocks may step backwards, so insertion order says nothing about age.
			let oldest = window.iter().min().copied().unwrap_or(now);
			let earliest_retry_at = oldest + self.policy.window;
			let wait = earliest_retry_at - now;

			return RateLimitDecision::Reject(RetryHint {
				earliest_retry_at,
				wait: if wait.is_negative() { Duration::ZERO } else { wait },
			});
		}

		window.push_back(now);

		RateLimitDecision::Accept
	}

	/// Returns the number of attempts still counted at `now` without recording anything.
	pub fn len_at(&self, now: OffsetDateTime) -> usize {
		let mut window = self.window.lock();

		Self::prune(&mut window, now - self.policy.window);

		window.len()
	}

	/// Forgets every recorded attempt.
	pub fn reset(&self) {
		self.window.lock().clear();
	}

	fn prune(window: &mut VecDeque<OffsetDateTime>, window_start: OffsetDateTime) {
		// Entries are retained only when strictly newer than the window start.
		window.retain(|instant| *instant > window_start);
	}
}
impl Default for SlidingWindowLimiter {
	fn default() -> Self {
		Self::new(RateLimitPolicy::default())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const T: OffsetDateTime = macros::datetime!(2025-11-10 12:00 UTC);

	#[test]
	fn accepts_up_to_budget_then_rejects_at_same_instant() {
		let limiter = SlidingWindowLimiter::default();

		for attempt in 0..60 {
			assert!(
				limiter.check_and_record(T).is_accept(),
				"Attempt {attempt} should fit inside the window."
			);
		}

		match limiter.check_and_record(T) {
			RateLimitDecision::Reject(hint) => {
				assert_eq!(hint.earliest_retry_at, T + Duration::seconds(60));
				assert_eq!(hint.wait, Duration::seconds(60));
			},
			other => panic!("Expected rejection, got {other:?}."),
		}
		assert_eq!(limiter.len_at(T), 60, "Rejected attempts must not be recorded.");
		assert!(limiter.check_and_record(T + Duration::seconds(61)).is_accept());
	}

	#[test]
	fn spread_out_attempts_below_budget_are_accepted() {
		let limiter = SlidingWindowLimiter::default();

		for second in 0..59 {
			let now = T + Duration::milliseconds(second * 1_000);

			assert!(limiter.check_and_record(now).is_accept());
		}
	}

	#[test]
	fn lower_window_edge_is_exclusive() {
		let limiter =
			SlidingWindowLimiter::new(RateLimitPolicy::new(Duration::seconds(60), 1).unwrap());

		assert!(limiter.check_and_record(T).is_accept());
		assert!(!limiter.check_and_record(T + Duration::milliseconds(59_999)).is_accept());
		// At exactly `T + 60s` the first entry sits on the window start and is discarded.
		assert!(limiter.check_and_record(T + Duration::seconds(60)).is_accept());
	}

	#[test]
	fn sliding_window_frees_slots_as_entries_expire() {
		let limiter =
			SlidingWindowLimiter::new(RateLimitPolicy::new(Duration::seconds(10), 3).unwrap());

		assert!(limiter.check_and_record(T).is_accept());
		assert!(limiter.check_and_record(T + Duration::seconds(4)).is_accept());
		assert!(limiter.check_and_record(T + Duration::seconds(8)).is_accept());
		assert!(!limiter.check_and_record(T + Duration::seconds(9)).is_accept());
		assert!(limiter.check_and_record(T + Duration::seconds(11)).is_accept());
		assert_eq!(limiter.len_at(T + Duration::seconds(11)), 3);
		assert!(!limiter.check_and_record(T + Duration::seconds(12)).is_accept());
	}

	#[test]
	fn reset_clears_window() {
		let limiter =
			SlidingWindowLimiter::new(RateLimitPolicy::new(Duration::seconds(60), 1).unwrap());

		assert!(limiter.check_and_record(T).is_accept());

		limiter.reset();

		assert!(limiter.check_and_record(T).is_accept());
	}

	#[test]
	fn degenerate_policies_are_rejected() {
		assert!(matches!(
			RateLimitPolicy::new(Duration::ZERO, 60),
			Err(ConfigError::InvalidRateLimit)
		));
		assert!(matches!(
			RateLimitPolicy::new(Duration::seconds(60), 0),
			Err(ConfigError::InvalidRateLimit)
		));
	}

	#[test]
	fn retry_hint_uses_oldest_entry_after_clock_steps_back() {
		let limiter =
			SlidingWindowLimiter::new(RateLimitPolicy::new(Duration::seconds(60), 2).unwrap());

		assert!(limiter.check_and_record(T + Duration::seconds(10)).is_accept());
		assert!(limiter.check_and_record(T).is_accept());

		match limiter.check_and_record(T + Duration::seconds(20)) {
			RateLimitDecision::Reject(hint) => {
				assert_eq!(hint.earliest_retry_at, T + Duration::seconds(60));
				assert_eq!(hint.wait, Duration::seconds(40));
			},
			other => panic!("Expected rejection, got {other:?}."),
		}
	}

	#[test]
	fn huge_budget_builds_without_preallocating() {
		let policy: RateLimitPolicy =
			serde_json::from_str("{\"max_requests\":18446744073709551615}")
				.expect("A huge but valid budget should deserialize.");
		let limiter = SlidingWindowLimiter::new(policy);

		assert_eq!(policy.max_requests(), usize::MAX);
		assert_eq!(policy.window(), RateLimitPolicy::DEFAULT_WINDOW);
		assert!(limiter.check_and_record(T).is_accept());
	}

	#[test]
	fn deserialization_rejects_degenerate_policies() {
		for payload in [
			"{\"max_requests\":0}",
			"{\"window\":0}",
			"{\"window\":-1000,\"max_requests\":5}",
		] {
			let err = serde_json::from_str::<RateLimitPolicy>(payload)
				.expect_err("Degenerate policies should fail to deserialize.");

			assert!(err.to_string().contains(&ConfigError::InvalidRateLimit.to_string()));
		}
	}

	#[test]
	fn manual_clock_advances() {
		let clock = ManualClock::new(T);

		clock.advance(Duration::seconds(61));

		assert_eq!(clock.now(), T + Duration::seconds(61));

		clock.set(T);

		assert_eq!(clock.now(), T);
	}

	#[test]
	fn policy_serializes_window_in_millis() {
		let payload = serde_json::to_string(&RateLimitPolicy::default())
			.expect("Default policy should serialize to JSON.");

		assert_eq!(payload, "{\"window\":60000,\"max_requests\":60}");
	}
}
