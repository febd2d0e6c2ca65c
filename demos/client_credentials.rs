//! Demonstrates acquiring and reusing a client-credentials bearer token against a mock
//! identity provider with the default reqwest transport.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use scm_token_cache::{auth::ClientCredentials, cache::TokenCache};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let cache = TokenCache::new(Url::parse(&server.url("/oauth2/access_token"))?);
	let credentials = ClientCredentials::new("demo-client", "super-secret", "1422370951");
	let (token, header) = cache.get_or_refresh(&credentials).await?;
	let (reused, _) = cache.get_or_refresh(&credentials).await?;

	println!("Access token: {token}.");
	println!("Authorization header: {header}.");

	assert_eq!(reused, token);

	token_mock.assert_async().await;

	Ok(())
}
