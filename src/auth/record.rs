//! Cached token record and expiry helpers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Safety margin subtracted from every provider-reported token lifetime.
///
/// A reported lifetime shorter than the margin yields a record that is already expired;
/// the next access simply refreshes again.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(180);

/// Access token plus the instant after which the cache must stop handing it out.
///
/// Records are created or overwritten only by a successful fetch and live until the
/// next successful fetch supersedes them.
#[derive(Clone)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the token was obtained, as observed on the local clock.
	pub issued_at: OffsetDateTime,
	/// Expiry instant: `issued_at` plus the provider lifetime minus [`EXPIRY_MARGIN`].
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Builds a record from a provider-reported lifetime, applying [`EXPIRY_MARGIN`].
	pub fn issued(
		access_token: impl Into<String>,
		lifetime: Duration,
		issued_at: OffsetDateTime,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			issued_at,
			expires_at: issued_at + lifetime - EXPIRY_MARGIN,
		}
	}

	/// Convenience helper that stamps the record with the current clock.
	pub fn issued_now(access_token: impl Into<String>, lifetime: Duration) -> Self {
		Self::issued(access_token, lifetime, OffsetDateTime::now_utc())
	}

	/// Returns `true` once the provided instant passes the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Formats the `Authorization` header value carrying the token.
	pub fn authorization_header(&self) -> String {
		format!("Bearer {}", self.access_token.expose())
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
