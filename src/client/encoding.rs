//! URL joining, query/body encoding, and response decoding for the two resource flavors.

// std
use std::io;
// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Value, ser::Formatter as JsonFormatter};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError},
	sign::percent_encode,
};

/// Request parameters, iterated in key order.
pub type Params = serde_json::Map<String, Value>;

/// Form field that carries the JSON document for [`Json`] bodies.
pub const JSON_FIELD: &str = "data";

/// Body encoding and response decoding for one kind of remote resource.
pub trait Flavor
where
	Self: 'static + Send + Sync,
{
	/// Value returned to callers for a successful response.
	type Output: Send;

	/// Encodes `body` into a form-urlencoded string.
	fn encode_body(body: Option<&Params>) -> Result<String>;

	/// Turns a 2xx response into the caller-facing value.
	fn decode(response: http::Response<Vec<u8>>) -> Result<Self::Output>;
}

/// Sends parameters as form fields and returns the raw response.
#[derive(Clone, Copy, Debug, Default)]
pub struct Form;
impl Flavor for Form {
	type Output = http::Response<Vec<u8>>;

	fn encode_body(body: Option<&Params>) -> Result<String> {
		body.map(encode_params).transpose().map(Option::unwrap_or_default)
	}

	fn decode(response: http::Response<Vec<u8>>) -> Result<Self::Output> {
		Ok(response)
	}
}

/// Wraps parameters as a JSON document inside the `data` form field and decodes JSON replies.
///
/// An empty response body decodes to an empty JSON string.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json;
impl Flavor for Json {
	type Output = Value;

	fn encode_body(body: Option<&Params>) -> Result<String> {
		let Some(params) = body else {
			return Ok(String::new());
		};

		Ok(format!("{JSON_FIELD}={}", percent_encode(&to_spaced_json(params)?)))
	}

	fn decode(response: http::Response<Vec<u8>>) -> Result<Self::Output> {
		if response.body().is_empty() {
			return Ok(Value::String(String::new()));
		}

		decode_json(&response)
	}
}

/// Decodes a JSON body into `T`, keeping the failing path for diagnostics.
pub fn decode_json<T>(response: &http::Response<Vec<u8>>) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		DecodeError::Json { source, status: response.status().as_u16() }.into()
	})
}

/// Joins `base` and `path` with exactly one slash between them; an empty path yields `base`.
pub fn join_url(base: &str, path: &str) -> String {
	if path.is_empty() {
		return base.to_owned();
	}

	let base = base.trim_end_matches('/');
	let path = path.trim_start_matches('/');

	format!("{base}/{path}")
}

/// Appends the encoded `query` to `url`, using `&` when a query string is already present.
pub fn append_query(url: &str, query: &Params) -> Result<String> {
	let encoded = encode_params(query)?;

	if encoded.is_empty() {
		return Ok(url.to_owned());
	}

	let separator = if url.contains('?') { '&' } else { '?' };

	Ok(format!("{url}{separator}{encoded}"))
}

/// Encodes parameters as `k=v` pairs joined by `&` with RFC 3986 percent-encoding.
///
/// Strings are sent as-is, numbers and booleans as their text, `null` as an empty value, and
/// arrays or objects as JSON documents.
pub fn encode_params(params: &Params) -> Result<String> {
	let pairs = params
		.iter()
		.map(|(key, value)| {
			Ok(format!("{}={}", percent_encode(key), percent_encode(&render(value)?)))
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(pairs.join("&"))
}

fn render(value: &Value) -> Result<String> {
	Ok(match value {
		Value::Null => String::new(),
		Value::String(text) => text.clone(),
		Value::Bool(_) | Value::Number(_) => value.to_string(),
		Value::Array(_) | Value::Object(_) => to_spaced_json(value)?,
	})
}

/// Serializes with `", "` and `": "` separators, the layout the resource servers expect.
fn to_spaced_json<T>(value: &T) -> Result<String>
where
	T: ?Sized + Serialize,
{
	let mut buf = Vec::new();
	let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);

	value.serialize(&mut serializer).map_err(ConfigError::BodyEncoding)?;

	Ok(String::from_utf8_lossy(&buf).into_owned())
}

struct SpacedFormatter;
impl JsonFormatter for SpacedFormatter {
	fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		if first { Ok(()) } else { writer.write_all(b", ") }
	}

	fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		if first { Ok(()) } else { writer.write_all(b", ") }
	}

	fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		writer.write_all(b": ")
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn params(value: Value) -> Params {
		match value {
			Value::Object(map) => map,
			_ => panic!("Fixture must be a JSON object."),
		}
	}

	#[test]
	fn join_url_uses_exactly_one_slash() {
		assert_eq!(join_url("http://h/a/", "/b"), "http://h/a/b");
		assert_eq!(join_url("http://h/a", "b"), "http://h/a/b");
		assert_eq!(join_url("http://h/a//", "//b/c"), "http://h/a/b/c");
		assert_eq!(join_url("http://h/a/", ""), "http://h/a/");
	}

	#[test]
	fn append_query_picks_separator() {
		let query = params(json!({ "page": 2, "q": "a b" }));

		assert_eq!(
			append_query("http://h/items", &query).expect("Query should encode."),
			"http://h/items?page=2&q=a%20b"
		);
		assert_eq!(
			append_query("http://h/items?x=1", &query).expect("Query should encode."),
			"http://h/items?x=1&page=2&q=a%20b"
		);
		assert_eq!(
			append_query("http://h/items", &Params::new()).expect("Empty query should encode."),
			"http://h/items"
		);
	}

	#[test]
	fn form_bodies_encode_fields() {
		let body =
			Form::encode_body(Some(&params(json!({ "x": 1 })))).expect("Body should encode.");

		assert_eq!(body, "x=1");
		assert_eq!(Form::encode_body(None).expect("Empty body should encode."), "");
	}

	#[test]
	fn form_values_render_by_type() {
		let body = Form::encode_body(Some(&params(json!({
			"flag": true,
			"list": [1, 2],
			"none": null,
			"text": "a+b",
		}))))
		.expect("Body should encode.");

		assert_eq!(body, "flag=true&list=%5B1%2C%202%5D&none=&text=a%2Bb");
	}

	#[test]
	fn json_bodies_wrap_a_spaced_document() {
		let body =
			Json::encode_body(Some(&params(json!({ "x": 1 })))).expect("Body should encode.");

		assert_eq!(body, "data=%7B%22x%22%3A%201%7D");
	}

	#[test]
	fn json_decode_maps_empty_body_to_empty_string() {
		let value =
			Json::decode(http::Response::new(Vec::new())).expect("Empty body should decode.");

		assert_eq!(value, Value::String(String::new()));
	}

	#[test]
	fn json_decode_reports_status_on_malformed_body() {
		let mut response = http::Response::new(b"{not json".to_vec());

		*response.status_mut() = http::StatusCode::CREATED;

		let err = Json::decode(response).expect_err("Malformed JSON should fail to decode.");

		assert!(matches!(err, Error::Decode(DecodeError::Json { status: 201, .. })));
	}
}
