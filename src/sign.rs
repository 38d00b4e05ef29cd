//! Request signing: the [`RequestSigner`] capability plus the default OAuth 1.0 HMAC signer.
//!
//! [`OAuthSigner`] follows RFC 5849: it gathers the URL query, any form-encoded body, and the
//! `oauth_*` protocol parameters, normalizes them into a signature base string, signs that with
//! HMAC keyed by the consumer (and optional token) secret, and emits an `Authorization: OAuth`
//! header. A JSON body never contributes parameters, which is why the request client wraps JSON
//! payloads into a single form field instead.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use http::{
	HeaderValue, Method, Request,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
use sha2::Sha256;
use time::OffsetDateTime;
use url::form_urlencoded;
// self
use crate::{_prelude::*, auth::CredentialPair};

/// RFC 3986 unreserved characters; everything else is percent-encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
const NONCE_LEN: usize = 32;
const OAUTH_VERSION: &str = "1.0";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Attaches a signature to an outbound request before it reaches the transport.
///
/// Implementations receive the fully built request (method, URI, headers, encoded body) and
/// return it with whatever headers the signing protocol requires.
pub trait RequestSigner
where
	Self: Send + Sync,
{
	/// Signs `request`, returning it with authorization state attached.
	fn sign(&self, request: Request<String>) -> Result<Request<String>, SignError>;
}

/// Failures raised while signing.
#[derive(Debug, ThisError)]
pub enum SignError {
	/// The request URI is not an absolute URL.
	#[error("Request URI `{uri}` cannot be signed.")]
	InvalidUri {
		/// Offending URI.
		uri: String,
		/// Underlying parse failure.
		#[source]
		source: url::ParseError,
	},
	/// The HMAC key could not be initialized.
	#[error("Signing key is invalid.")]
	InvalidKey,
	/// The computed header contains characters HTTP does not allow.
	#[error(transparent)]
	InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

/// HMAC flavor used by [`OAuthSigner`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// `HMAC-SHA1`, the method mandated by OAuth 1.0.
	#[default]
	#[serde(rename = "HMAC-SHA1")]
	HmacSha1,
	/// `HMAC-SHA256`.
	#[serde(rename = "HMAC-SHA256")]
	HmacSha256,
}
impl SignatureMethod {
	/// Returns the protocol identifier sent as `oauth_signature_method`.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
			SignatureMethod::HmacSha256 => "HMAC-SHA256",
		}
	}

	fn digest(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, SignError> {
		match self {
			SignatureMethod::HmacSha1 => {
				let mut mac =
					Hmac::<Sha1>::new_from_slice(key).map_err(|_| SignError::InvalidKey)?;

				mac.update(message);

				Ok(mac.finalize().into_bytes().to_vec())
			},
			SignatureMethod::HmacSha256 => {
				let mut mac =
					Hmac::<Sha256>::new_from_slice(key).map_err(|_| SignError::InvalidKey)?;

				mac.update(message);

				Ok(mac.finalize().into_bytes().to_vec())
			},
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Percent-encodes `value` per RFC 3986 (space becomes `%20`).
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED).to_string()
}

/// OAuth 1.0 signer built from consumer credentials and an optional token.
#[derive(Clone, Debug)]
pub struct OAuthSigner {
	consumer: CredentialPair,
	token: Option<CredentialPair>,
	method: SignatureMethod,
}
impl OAuthSigner {
	/// Creates a signer for the consumer using `HMAC-SHA1`.
	pub fn new(consumer: CredentialPair) -> Self {
		Self { consumer, token: None, method: SignatureMethod::default() }
	}

	/// Signs on behalf of a token as well (`oauth_token`).
	pub fn with_token(mut self, token: Option<CredentialPair>) -> Self {
		self.token = token;

		self
	}

	/// Overrides the signature method.
	pub fn with_method(mut self, method: SignatureMethod) -> Self {
		self.method = method;

		self
	}

	/// Builds the `Authorization` header value for a request using a fixed nonce and timestamp.
	pub fn authorization(
		&self,
		request: &Request<String>,
		nonce: &str,
		timestamp: i64,
	) -> Result<String, SignError> {
		let mut protocol = self.protocol_params(nonce, timestamp);
		let base = signature_base_string(request, &protocol)?;
		let signature = self.signature(&base)?;

		protocol.push(("oauth_signature", signature));
		protocol.sort();

		let fields = protocol
			.iter()
			.map(|(key, value)| format!("{key}=\"{}\"", percent_encode(value)))
			.collect::<Vec<_>>()
			.join(", ");

		Ok(format!("OAuth realm=\"\", {fields}"))
	}

	/// Signs a base string with `consumer_secret&token_secret`, returning base64.
	pub fn signature(&self, base_string: &str) -> Result<String, SignError> {
		let token_secret = self.token.as_ref().map(|token| token.secret.expose()).unwrap_or("");
		let key = format!(
			"{}&{}",
			percent_encode(self.consumer.secret.expose()),
			percent_encode(token_secret)
		);

		Ok(STANDARD.encode(self.method.digest(key.as_bytes(), base_string.as_bytes())?))
	}

	fn protocol_params(&self, nonce: &str, timestamp: i64) -> Vec<(&'static str, String)> {
		let mut params = vec![
			("oauth_consumer_key", self.consumer.key.clone()),
			("oauth_nonce", nonce.to_owned()),
			("oauth_signature_method", self.method.as_str().to_owned()),
			("oauth_timestamp", timestamp.to_string()),
			("oauth_version", OAUTH_VERSION.to_owned()),
		];

		if let Some(token) = &self.token {
			params.push(("oauth_token", token.key.clone()));
		}

		params
	}
}
impl RequestSigner for OAuthSigner {
	fn sign(&self, mut request: Request<String>) -> Result<Request<String>, SignError> {
		let nonce = rand::rng()
			.sample_iter(Alphanumeric)
			.take(NONCE_LEN)
			.map(char::from)
			.collect::<String>();
		let timestamp = OffsetDateTime::now_utc().unix_timestamp();
		let header = self.authorization(&request, &nonce, timestamp)?;

		request.headers_mut().insert(AUTHORIZATION, HeaderValue::from_str(&header)?);

		Ok(request)
	}
}

/// Builds `METHOD&enc(base_uri)&enc(normalized_params)` for a request.
pub fn signature_base_string(
	request: &Request<String>,
	protocol: &[(&'static str, String)],
) -> Result<String, SignError> {
	let uri = request.uri().to_string();
	let url = Url::parse(&uri).map_err(|source| SignError::InvalidUri { uri, source })?;
	let mut params = url
		.query_pairs()
		.map(|(key, value)| (percent_encode(&key), percent_encode(&value)))
		.collect::<Vec<_>>();

	if is_form_encoded(request) {
		params.extend(
			form_urlencoded::parse(request.body().as_bytes())
				.map(|(key, value)| (percent_encode(&key), percent_encode(&value))),
		);
	}

	params.extend(protocol.iter().map(|(key, value)| (percent_encode(key), percent_encode(value))));
	params.sort();

	let normalized =
		params.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&");

	Ok(format!(
		"{}&{}&{}",
		normalized_method(request.method()),
		percent_encode(&base_uri(&url)),
		percent_encode(&normalized)
	))
}

fn normalized_method(method: &Method) -> String {
	method.as_str().to_ascii_uppercase()
}

fn base_uri(url: &Url) -> String {
	let host = url.host_str().unwrap_or_default();

	match url.port() {
		Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
		None => format!("{}://{host}{}", url.scheme(), url.path()),
	}
}

fn is_form_encoded(request: &Request<String>) -> bool {
	request
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE))
}
