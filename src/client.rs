//! Signed request client for remote resources.
//!
//! [`RemoteResource`] joins paths onto a base URL, encodes bodies according to its [`Flavor`],
//! signs every request, and rejects any status outside the 2xx class:
//!
//! - [`Form`] sends parameters as form fields and hands back the raw response.
//! - [`Json`] wraps parameters into a single `data` form field (OAuth 1.0 cannot sign a raw
//!   JSON body) and decodes the reply as JSON.

mod encoding;

pub use encoding::*;

// std
use std::marker::PhantomData;
// crates.io
use http::{HeaderMap, HeaderValue, Method, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
#[cfg(feature = "reqwest")] use crate::{config::ResourceConfig, transport::ReqwestTransport};
use crate::{
	_prelude::*,
	auth::CredentialPair,
	error::{ConfigError, TransportError},
	obs::{self, OpKind, OpOutcome, OpSpan},
	sign::{OAuthSigner, RequestSigner, SignatureMethod},
	transport::ResourceTransport,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Resource that decodes replies as JSON.
pub type RemoteJsonResource<T> = RemoteResource<Json, T>;
/// Form resource backed by reqwest.
#[cfg(feature = "reqwest")]
pub type ReqwestResource = RemoteResource<Form, ReqwestTransport>;
/// JSON resource backed by reqwest.
#[cfg(feature = "reqwest")]
pub type ReqwestJsonResource = RemoteResource<Json, ReqwestTransport>;

/// Handle to a remote resource reachable under `base_url`.
///
/// The default signer is built from the consumer (and optional token) credentials on first use
/// and reused afterwards; inject a different one with [`RemoteResource::with_signer`].
pub struct RemoteResource<F, T>
where
	F: Flavor,
	T: ?Sized + ResourceTransport,
{
	base_url: String,
	consumer: CredentialPair,
	token: Option<CredentialPair>,
	signature_method: SignatureMethod,
	injected_signer: Option<Arc<dyn RequestSigner>>,
	default_signer: OnceLock<OAuthSigner>,
	transport: Arc<T>,
	_flavor: PhantomData<F>,
}
impl<F, T> RemoteResource<F, T>
where
	F: Flavor,
	T: ?Sized + ResourceTransport,
{
	/// Creates a resource that sends requests through `transport`.
	pub fn with_transport(
		base_url: impl Into<String>,
		consumer: CredentialPair,
		transport: Arc<T>,
	) -> Self {
		Self {
			base_url: base_url.into(),
			consumer,
			token: None,
			signature_method: SignatureMethod::default(),
			injected_signer: None,
			default_signer: OnceLock::new(),
			transport,
			_flavor: PhantomData,
		}
	}

	/// Signs on behalf of `token` as well as the consumer.
	pub fn with_token(mut self, token: CredentialPair) -> Self {
		self.token = Some(token);
		self.default_signer = OnceLock::new();

		self
	}

	/// Overrides the HMAC flavor used by the default signer.
	pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;
		self.default_signer = OnceLock::new();

		self
	}

	/// Replaces the default OAuth signer.
	pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
		self.injected_signer = Some(signer);

		self
	}

	/// Base URL every path is joined onto.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Sends a `GET` for `path`, appending `query` as a query string.
	///
	/// The request declares `Content-Type: application/json` even though it carries no body.
	pub async fn get(&self, path: &str, query: Option<&Params>) -> Result<F::Output> {
		let uri = self.get_uri(path, query)?;

		self.request(Method::GET, &uri, content_type(JSON_CONTENT_TYPE), String::new()).await
	}

	/// Submits `body` with `POST`.
	pub async fn post(&self, path: &str, body: Option<&Params>) -> Result<F::Output> {
		self.submit(Method::POST, path, body).await
	}

	/// Submits `body` with `PUT`.
	pub async fn put(&self, path: &str, body: Option<&Params>) -> Result<F::Output> {
		self.submit(Method::PUT, path, body).await
	}

	/// Sends `body` form-encoded with an arbitrary method.
	pub async fn submit(
		&self,
		method: Method,
		path: &str,
		body: Option<&Params>,
	) -> Result<F::Output> {
		let body = F::encode_body(body)?;
		let uri = join_url(&self.base_url, path);

		self.request(method, &uri, content_type(FORM_CONTENT_TYPE), body).await
	}

	/// Signs and sends a fully specified request, decoding the reply per the flavor.
	///
	/// `uri` is used verbatim; it is not joined onto the base URL.
	pub async fn request(
		&self,
		method: Method,
		uri: &str,
		headers: HeaderMap,
		body: String,
	) -> Result<F::Output> {
		let response = self.call(method, uri, headers, body).await?;

		F::decode(response)
	}

	fn get_uri(&self, path: &str, query: Option<&Params>) -> Result<String> {
		let uri = join_url(&self.base_url, path);

		match query {
			Some(query) => append_query(&uri, query),
			None => Ok(uri),
		}
	}

	fn signer(&self) -> &dyn RequestSigner {
		match &self.injected_signer {
			Some(signer) => signer.as_ref(),
			None => self.default_signer.get_or_init(|| {
				OAuthSigner::new(self.consumer.clone())
					.with_token(self.token.clone())
					.with_method(self.signature_method)
			}),
		}
	}

	async fn call(
		&self,
		method: Method,
		uri: &str,
		headers: HeaderMap,
		body: String,
	) -> Result<http::Response<Vec<u8>>> {
		const KIND: OpKind = OpKind::RemoteRequest;

		let span = OpSpan::new(KIND, "remote_request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut request = http::Request::builder()
					.method(method.clone())
					.uri(uri)
					.body(body)
					.map_err(ConfigError::from)?;

				*request.headers_mut() = headers;

				let request = self.signer().sign(request)?;
				let response = self.transport.execute(request).await?;
				let status = response.status();

				if !status.is_success() {
					return Err(TransportError::status(&method, uri, status.as_u16()).into());
				}

				Ok(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}
impl<T> RemoteResource<Json, T>
where
	T: ?Sized + ResourceTransport,
{
	/// Sends a `GET` and decodes the JSON reply straight into `D`.
	///
	/// Unlike [`RemoteResource::get`], an empty body is a decode error here.
	pub async fn get_as<D>(&self, path: &str, query: Option<&Params>) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let uri = self.get_uri(path, query)?;
		let response =
			self.call(Method::GET, &uri, content_type(JSON_CONTENT_TYPE), String::new()).await?;

		decode_json(&response)
	}
}
#[cfg(feature = "reqwest")]
impl<F> RemoteResource<F, ReqwestTransport>
where
	F: Flavor,
{
	/// Builds a reqwest-backed resource from validated settings.
	pub fn from_config(config: &ResourceConfig, consumer: CredentialPair) -> Result<Self> {
		config.validate()?;

		let transport = ReqwestTransport::from_config(config)?;

		Ok(Self::with_transport(config.base_url.clone(), consumer, Arc::new(transport))
			.with_signature_method(config.signature_method))
	}
}
impl<F, T> Debug for RemoteResource<F, T>
where
	F: Flavor,
	T: ?Sized + ResourceTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RemoteResource")
			.field("base_url", &self.base_url)
			.field("consumer", &self.consumer)
			.field("token", &self.token)
			.field("signature_method", &self.signature_method)
			.field("custom_signer", &self.injected_signer.is_some())
			.finish()
	}
}

fn content_type(value: &'static str) -> HeaderMap {
	let mut headers = HeaderMap::new();

	headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));

	headers
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::test_credentials, transport::TransportFuture};

	/// Records the last request and answers with a fixed status and body.
	struct RecordingTransport {
		status: u16,
		body: &'static [u8],
		seen: Mutex<Option<http::Request<String>>>,
	}
	impl RecordingTransport {
		fn answering(status: u16, body: &'static [u8]) -> Arc<Self> {
			Arc::new(Self { status, body, seen: Mutex::new(None) })
		}
	}
	impl ResourceTransport for RecordingTransport {
		fn execute(&self, request: http::Request<String>) -> TransportFuture<'_> {
			Box::pin(async move {
				*self.seen.lock() = Some(request);

				let mut response = http::Response::new(self.body.to_vec());

				*response.status_mut() = http::StatusCode::from_u16(self.status)
					.expect("Fixture status should be valid.");

				Ok(response)
			})
		}
	}

	struct StaticSigner;
	impl RequestSigner for StaticSigner {
		fn sign(
			&self,
			mut request: http::Request<String>,
		) -> Result<http::Request<String>, crate::sign::SignError> {
			request
				.headers_mut()
				.insert(http::header::AUTHORIZATION, HeaderValue::from_static("Static"));

			Ok(request)
		}
	}

	#[tokio::test]
	async fn non_success_status_becomes_transport_error() {
		let transport = RecordingTransport::answering(404, b"");
		let resource: RemoteResource<Form, _> =
			RemoteResource::with_transport("http://h/api/", test_credentials(), transport);
		let err = resource.get("/missing", None).await.expect_err("404 should be rejected.");

		assert_eq!(
			err.to_string(),
			"Request GET 'http://h/api/missing' failed as (404 - Not Found)."
		);
	}

	#[tokio::test]
	async fn redirects_are_not_success() {
		let transport = RecordingTransport::answering(302, b"");
		let resource: RemoteResource<Form, _> =
			RemoteResource::with_transport("http://h", test_credentials(), transport);
		let err = resource.post("items", None).await.expect_err("302 should be rejected.");

		assert!(matches!(err, Error::Transport(TransportError::Status { status: 302, .. })));
	}

	#[tokio::test]
	async fn default_signer_adds_oauth_header_with_token() {
		let transport = RecordingTransport::answering(200, b"{}");
		let resource: RemoteJsonResource<_> =
			RemoteResource::with_transport("http://h", test_credentials(), transport.clone())
				.with_token(CredentialPair::new("session", "s3cret"));

		resource.get("items", None).await.expect("200 should succeed.");

		let seen = transport.seen.lock().take().expect("Transport should see the request.");
		let header = seen
			.headers()
			.get(http::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.expect("Request should be signed.");

		assert!(header.starts_with("OAuth "));
		assert!(header.contains("oauth_consumer_key=\"warehouse\""));
		assert!(header.contains("oauth_token=\"session\""));
		assert_eq!(
			seen.headers().get(CONTENT_TYPE),
			Some(&HeaderValue::from_static("application/json"))
		);
	}

	#[tokio::test]
	async fn injected_signer_replaces_default() {
		let transport = RecordingTransport::answering(204, b"");
		let resource: RemoteResource<Form, _> =
			RemoteResource::with_transport("http://h", test_credentials(), transport.clone())
				.with_signer(Arc::new(StaticSigner));

		resource.put("items/1", None).await.expect("204 should succeed.");

		let seen = transport.seen.lock().take().expect("Transport should see the request.");

		assert_eq!(
			seen.headers().get(http::header::AUTHORIZATION),
			Some(&HeaderValue::from_static("Static"))
		);
		assert_eq!(seen.method(), Method::PUT);
	}
}
