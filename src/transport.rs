//! Transport primitives for signed resource calls.
//!
//! [`ResourceTransport`] is the client's only dependency on an HTTP stack: it takes a fully
//! built and signed [`http::Request`] and hands back the raw [`http::Response`]. Status
//! classification, decoding, and instrumentation stay in [`crate::client`], so custom transports
//! only have to move bytes.

// std
#[cfg(feature = "reqwest")] use std::{ops::Deref, time::Duration};
// self
#[cfg(feature = "reqwest")] use crate::{config::ResourceConfig, error::ConfigError, obs};
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ResourceTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<http::Response<Vec<u8>>, TransportError>> + 'a + Send>>;

/// Executes signed requests against a remote resource.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared behind an
/// `Arc` by every resource handle, and the returned future must be `Send` so callers can drive
/// it from any executor thread.
pub trait ResourceTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the response regardless of its status code.
	fn execute(&self, request: http::Request<String>) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the certificate and timeout settings in `config`.
	pub fn from_config(config: &ResourceConfig) -> Result<Self, ConfigError> {
		let mut builder =
			ReqwestClient::builder().danger_accept_invalid_certs(config.accept_invalid_certs);

		if config.accept_invalid_certs {
			obs::trace_insecure_transport(&config.base_url);
		}
		if let Some(secs) = config.timeout_secs {
			builder = builder.timeout(Duration::from_secs(secs));
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ResourceTransport for ReqwestTransport {
	fn execute(&self, request: http::Request<String>) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.0.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = http::Response::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn from_config_builds_with_timeout_and_insecure_flag() {
		let config = ResourceConfig::new("https://localhost:8443/accounting")
			.accept_invalid_certs(true)
			.timeout_secs(5);

		assert!(ReqwestTransport::from_config(&config).is_ok());
	}
}
