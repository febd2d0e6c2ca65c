//! Transport primitives for the token exchange.
//!
//! The module exposes [`TokenHttpClient`] so downstream crates can drive the cache with a
//! custom HTTP stack. Implementations post the form-encoded grant with HTTP basic auth and
//! hand back the raw status, reason phrase, and body bytes; decoding and error
//! classification stay with the cache.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, auth::ClientCredentials, error::TransportError};

/// Production token endpoint of the upstream identity provider.
pub const TOKEN_ENDPOINT: &str = "https://auth.apps.paloaltonetworks.com/oauth2/access_token";

/// Future type returned by [`TokenHttpClient`] implementations.
pub type HttpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Form-encoded token request dispatched to the provider endpoint.
#[derive(Clone, Debug)]
pub struct TokenExchangeRequest<'a> {
	/// Token endpoint receiving the POST.
	pub endpoint: &'a Url,
	/// Credentials applied as HTTP basic auth, never placed in the body.
	pub credentials: &'a ClientCredentials,
	/// Form body pairs (`grant_type`, `scope`).
	pub form: Vec<(&'static str, String)>,
}
impl<'a> TokenExchangeRequest<'a> {
	/// Builds the client-credentials exchange for the given endpoint and credentials.
	pub fn client_credentials(endpoint: &'a Url, credentials: &'a ClientCredentials) -> Self {
		Self {
			endpoint,
			credentials,
			form: vec![
				("grant_type", "client_credentials".into()),
				("scope", credentials.scope()),
			],
		}
	}
}

/// Raw response captured from the token endpoint before any JSON decoding.
#[derive(Clone, Debug)]
pub struct RawTokenResponse {
	/// HTTP status code.
	pub status: u16,
	/// Reason phrase associated with the status, when the transport knows one.
	pub reason: String,
	/// Unparsed response body bytes.
	pub body: Vec<u8>,
}
impl RawTokenResponse {
	/// Returns `true` for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing the token exchange.
///
/// The trait is the cache's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a cache can be shared across tasks, and the futures they
/// return must be `Send` for the lifetime of the in-flight request. Timeouts and
/// connection tuning belong to the transport, not to the cache.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes the token exchange and captures the raw response.
	fn post_form<'a>(
		&'a self,
		request: TokenExchangeRequest<'a>,
	) -> HttpFuture<'a, RawTokenResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token
/// endpoints return results directly instead of delegating to another URI. Configure
/// any custom [`ReqwestClient`] accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn post_form<'a>(
		&'a self,
		request: TokenExchangeRequest<'a>,
	) -> HttpFuture<'a, RawTokenResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client
				.post(request.endpoint.clone())
				.basic_auth(
					&request.credentials.client_id,
					Some(request.credentials.client_secret.expose()),
				)
				.form(&request.form)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status();
			let reason = status.canonical_reason().unwrap_or_default().to_owned();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(RawTokenResponse { status: status.as_u16(), reason, body })
		})
	}
}
