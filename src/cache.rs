//! Token cache manager: expiry checks, cached reads, and forced refreshes.
//!
//! [`TokenCache`] holds at most one [`TokenRecord`], checks expiry on each access, and
//! only calls the provider when the cached record is missing, expired, or a refresh is
//! forced. Refreshes serialize through a singleflight guard so concurrent callers
//! piggy-back on the same in-flight exchange instead of stampeding the token endpoint.
//! Retry and backoff stay with the caller; [`TokenCache::is_expired`] and
//! [`TokenCache::fetch_token`] are the primitives a caller composes a policy from.

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, TokenRecord},
	http::{RawTokenResponse, TokenExchangeRequest, TokenHttpClient},
	obs::{self, FetchOutcome, FetchSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Cache specialized for the crate's default reqwest transport.
pub type ReqwestTokenCache = TokenCache<ReqwestHttpClient>;

/// Decides whether a cached token is usable and obtains a fresh one when it is not.
///
/// The cache owns exactly one record slot; callers share the cache behind an [`Arc`]
/// and pass their credentials per call, so independent caches (e.g. one per tenant)
/// are just independent values.
pub struct TokenCache<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client wrapper used for every outbound token request.
	pub http_client: Arc<C>,
	/// Token endpoint receiving the client-credentials grant.
	pub endpoint: Url,
	record: RwLock<Option<TokenRecord>>,
	refresh_guard: AsyncMutex<()>,
}
impl<C> TokenCache<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a cache that reuses the caller-provided transport.
	pub fn with_http_client(endpoint: Url, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			endpoint,
			record: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// Returns a snapshot of the cached record, if any.
	pub fn cached(&self) -> Option<TokenRecord> {
		self.record.read().clone()
	}

	/// Returns `true` if no record exists or the provided instant passes its expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.record.read().as_ref().is_none_or(|record| record.is_expired_at(instant))
	}

	/// Returns `true` if no record exists or the current time passes its expiry.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns the cached token, refreshing first when the record is expired or absent.
	///
	/// Yields the raw token string alongside a ready-to-send `Authorization` value.
	pub async fn get_or_refresh(
		&self,
		credentials: &ClientCredentials,
	) -> Result<(String, String)> {
		let record = self.fetch_record(credentials, false).await?;

		Ok((record.access_token.expose().to_owned(), record.authorization_header()))
	}

	/// Obtains an access token, reusing the cached record unless `force` is set.
	///
	/// `force == true` always performs the exchange; `force == false` returns the cached
	/// token untouched when it is still live. A failed exchange leaves the previous
	/// record in place.
	pub async fn fetch_token(
		&self,
		credentials: &ClientCredentials,
		force: bool,
	) -> Result<String> {
		let record = self.fetch_record(credentials, force).await?;

		Ok(record.access_token.expose().to_owned())
	}

	async fn fetch_record(
		&self,
		credentials: &ClientCredentials,
		force: bool,
	) -> Result<TokenRecord> {
		let span = FetchSpan::new("fetch_token");

		obs::record_fetch_outcome(FetchOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;

				if !force {
					let current =
						self.record.read().as_ref().filter(|record| !record.is_expired()).cloned();

					if let Some(current) = current {
						obs::cache_hit();

						return Ok(current);
					}
				}

				obs::fetch_started(&self.endpoint);

				let started = Instant::now();
				let request = TokenExchangeRequest::client_credentials(&self.endpoint, credentials);
				let response = self.http_client.post_form(request).await?;
				let record = decode_token_response(response)?;

				obs::fetch_succeeded(started.elapsed(), record.expires_at);

				*self.record.write() = Some(record.clone());

				Ok(record)
			})
			.await;

		match &result {
			Ok(_) => obs::record_fetch_outcome(FetchOutcome::Success),
			Err(error) => {
				obs::fetch_failed(error);
				obs::record_fetch_outcome(FetchOutcome::Failure);
			},
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl TokenCache<ReqwestHttpClient> {
	/// Creates a cache for the provided token endpoint.
	///
	/// The cache provisions its own reqwest-backed transport so callers do not need to
	/// pass HTTP handles explicitly. Use [`TokenCache::with_http_client`] to supply a
	/// tuned client instead.
	pub fn new(endpoint: Url) -> Self {
		Self::with_http_client(endpoint, ReqwestHttpClient::default())
	}
}
impl<C> Debug for TokenCache<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("endpoint", &self.endpoint.as_str())
			.field("record", &self.cached())
			.finish()
	}
}

/// Success payload returned by the provider token endpoint. Extra fields such as
/// `token_type` are tolerated and ignored.
#[derive(Debug, Deserialize)]
struct TokenEndpointBody {
	access_token: String,
	expires_in: i64,
}

fn decode_token_response(response: RawTokenResponse) -> Result<TokenRecord> {
	if !response.is_success() {
		return Err(Error::Fetch { status: response.status, reason: response.reason });
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
	let body: TokenEndpointBody = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::MalformedResponse { source })?;

	Ok(TokenRecord::issued_now(body.access_token, Duration::seconds(body.expires_in)))
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use super::*;
	use crate::http::HttpFuture;

	struct ScriptedClient {
		responses: Mutex<VecDeque<RawTokenResponse>>,
		calls: AtomicUsize,
	}
	impl ScriptedClient {
		fn with_responses(responses: impl IntoIterator<Item = RawTokenResponse>) -> Arc<Self> {
			Arc::new(Self {
				responses: Mutex::new(responses.into_iter().collect()),
				calls: AtomicUsize::new(0),
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl TokenHttpClient for ScriptedClient {
		fn post_form<'a>(
			&'a self,
			_request: TokenExchangeRequest<'a>,
		) -> HttpFuture<'a, RawTokenResponse> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let next = self
				.responses
				.lock()
				.pop_front()
				.expect("Scripted client ran out of responses.");

			Box::pin(async move { Ok(next) })
		}
	}

	fn success(token: &str, expires_in: i64) -> RawTokenResponse {
		RawTokenResponse {
			status: 200,
			reason: "OK".into(),
			body: format!(
				"{{\"access_token\":\"{token}\",\"token_type\":\"bearer\",\"expires_in\":{expires_in}}}"
			)
			.into_bytes(),
		}
	}

	fn unauthorized() -> RawTokenResponse {
		RawTokenResponse { status: 401, reason: "Unauthorized".into(), body: vec![] }
	}

	fn build_cache(client: Arc<ScriptedClient>) -> TokenCache<ScriptedClient> {
		let endpoint = Url::parse("https://auth.example.com/oauth2/access_token")
			.expect("Test endpoint should parse successfully.");

		TokenCache::with_http_client(endpoint, client)
	}

	fn credentials() -> ClientCredentials {
		ClientCredentials::new("client-id", "client-secret", "1422370951")
	}

	#[test]
	fn empty_cache_counts_as_expired() {
		let cache = build_cache(ScriptedClient::with_responses([]));

		assert!(cache.is_expired());
		assert!(cache.cached().is_none());
	}

	#[test]
	fn expiry_check_follows_the_record() {
		let cache = build_cache(ScriptedClient::with_responses([]));
		let now = OffsetDateTime::now_utc();

		*cache.record.write() = Some(TokenRecord::issued("live", Duration::hours(1), now));

		assert!(!cache.is_expired_at(now));
		assert!(cache.is_expired_at(now + Duration::hours(1)));
	}

	#[tokio::test]
	async fn fetch_applies_the_safety_margin() {
		let client = ScriptedClient::with_responses([success("abc123", 3_600)]);
		let cache = build_cache(client.clone());
		let before = OffsetDateTime::now_utc();
		let token = cache.fetch_token(&credentials(), false).await.expect("Fetch should succeed.");
		let after = OffsetDateTime::now_utc();
		let record = cache.cached().expect("A record should be cached after a successful fetch.");

		assert_eq!(token, "abc123");
		assert_eq!(client.calls(), 1);
		assert!(record.expires_at >= before + Duration::seconds(3_600 - 180));
		assert!(record.expires_at <= after + Duration::seconds(3_600 - 180));
	}

	#[tokio::test]
	async fn live_record_is_returned_without_a_network_call() {
		let client = ScriptedClient::with_responses([success("abc123", 3_600)]);
		let cache = build_cache(client.clone());

		cache.fetch_token(&credentials(), false).await.expect("Initial fetch should succeed.");

		let token = cache.fetch_token(&credentials(), false).await.expect("Hit should succeed.");

		assert_eq!(token, "abc123");
		assert_eq!(client.calls(), 1);
	}

	#[tokio::test]
	async fn force_bypasses_a_live_record() {
		let client =
			ScriptedClient::with_responses([success("first", 3_600), success("second", 3_600)]);
		let cache = build_cache(client.clone());

		cache.fetch_token(&credentials(), false).await.expect("Initial fetch should succeed.");

		let token =
			cache.fetch_token(&credentials(), true).await.expect("Forced fetch should succeed.");

		assert_eq!(token, "second");
		assert_eq!(client.calls(), 2);
	}

	#[tokio::test]
	async fn short_lifetime_forces_a_refresh_on_next_access() {
		let client = ScriptedClient::with_responses([success("first", 60), success("second", 60)]);
		let cache = build_cache(client.clone());

		cache.fetch_token(&credentials(), false).await.expect("Initial fetch should succeed.");

		assert!(cache.is_expired());

		cache.fetch_token(&credentials(), false).await.expect("Refetch should succeed.");

		assert_eq!(client.calls(), 2);
	}

	#[tokio::test]
	async fn failed_fetch_keeps_the_previous_record() {
		let client = ScriptedClient::with_responses([success("abc123", 3_600), unauthorized()]);
		let cache = build_cache(client.clone());

		cache.fetch_token(&credentials(), false).await.expect("Initial fetch should succeed.");

		let error = cache
			.fetch_token(&credentials(), true)
			.await
			.expect_err("Rejected fetch should surface to the caller.");

		assert!(matches!(error, Error::Fetch { status: 401, .. }));
		assert_eq!(error.status(), Some(401));
		assert_eq!(
			cache.cached().expect("Previous record should survive the failure.").access_token.expose(),
			"abc123",
		);
	}

	#[tokio::test]
	async fn failed_fetch_leaves_an_empty_cache_empty() {
		let cache = build_cache(ScriptedClient::with_responses([unauthorized()]));
		let error = cache
			.fetch_token(&credentials(), false)
			.await
			.expect_err("Rejected fetch should surface to the caller.");

		assert!(matches!(error, Error::Fetch { status: 401, .. }));
		assert!(cache.cached().is_none());
	}

	#[tokio::test]
	async fn missing_fields_map_to_a_malformed_response() {
		let body = RawTokenResponse {
			status: 200,
			reason: "OK".into(),
			body: b"{\"token_type\":\"bearer\"}".to_vec(),
		};
		let cache = build_cache(ScriptedClient::with_responses([body]));
		let error = cache
			.fetch_token(&credentials(), false)
			.await
			.expect_err("Malformed success bodies should be rejected.");

		assert!(matches!(error, Error::MalformedResponse { .. }));
		assert!(cache.cached().is_none());
	}

	#[tokio::test]
	async fn get_or_refresh_formats_the_authorization_header() {
		let cache = build_cache(ScriptedClient::with_responses([success("abc123", 3_600)]));
		let (token, header) =
			cache.get_or_refresh(&credentials()).await.expect("Refresh should succeed.");

		assert_eq!(token, "abc123");
		assert_eq!(header, "Bearer abc123");
	}

	#[tokio::test]
	async fn concurrent_refreshers_coalesce_into_one_exchange() {
		let client = ScriptedClient::with_responses([success("abc123", 3_600)]);
		let cache = Arc::new(build_cache(client.clone()));
		let creds = credentials();
		let (first, second) = tokio::join!(
			cache.get_or_refresh(&creds),
			cache.get_or_refresh(&creds),
		);
		let (first, _) = first.expect("First concurrent call should succeed.");
		let (second, _) = second.expect("Second concurrent call should succeed.");

		assert_eq!(first, "abc123");
		assert_eq!(second, "abc123");
		assert_eq!(client.calls(), 1);
	}
}
