//! Demonstrates issuing consumer and access-token credentials from the in-memory store and using
//! them to sign JSON calls against a (mocked) remote resource.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use consumer_keyring::{
	auth::{ConsumerName, TokenType, UserId},
	client::ReqwestJsonResource,
	config::ResourceConfig,
	issue::Registry,
	store::{KeyStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn KeyStore> = Arc::new(MemoryStore::default());
	let registry = Registry::new(store);
	let consumer = registry
		.create_consumer(
			ConsumerName::new("warehouse")?,
			Some("Inventory sync"),
			Some(UserId::new("alice")?),
		)
		.await?;
	let issued_at = time::OffsetDateTime::now_utc().unix_timestamp();
	let token = registry.create_token(&consumer, TokenType::Access, issued_at, None).await?;
	let server = MockServer::start_async().await;
	let stock_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/accounting/inventory/stock")
				.header_exists("authorization")
				.body("data=%7B%22delta%22%3A%20-2%2C%20%22sku%22%3A%20%22A-1%22%7D");
			then.status(200).header("content-type", "application/json").body("{\"stock\": 5}");
		})
		.await;
	let resource = ReqwestJsonResource::from_config(
		&ResourceConfig::new(server.url("/accounting")),
		consumer.credentials.clone(),
	)?
	.with_token(token.credentials);
	let body = json!({ "sku": "A-1", "delta": -2 });
	let reply = resource.post("inventory/stock", body.as_object()).await?;

	println!("Consumer {} ({}) updated stock: {reply}.", consumer.name, consumer.id);

	stock_mock.assert_async().await;

	Ok(())
}
