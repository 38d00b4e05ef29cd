// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use consumer_keyring::{
	_preludet::*,
	auth::{
		Consumer, ConsumerName, CredentialPair, CredentialTable, RecordId, Resource, ResourceName,
		Token, TokenIdentity, TokenType, UserId,
	},
	issue::{LOOKUPS_AFTER_CONFLICT, Registry},
	store::{Checkpoint, KeyStore, MemoryStore, StoreFuture},
};

const TIMESTAMP: i64 = 1_318_622_958;

/// Wraps a memory store and reports "no match" for the first `hidden` token lookups, so the
/// registry believes it is racing another caller that inserted first.
struct RacingStore {
	inner: MemoryStore,
	hidden: AtomicUsize,
	lookups: AtomicUsize,
}
impl RacingStore {
	fn hiding(inner: MemoryStore, hidden: usize) -> Self {
		Self { inner, hidden: AtomicUsize::new(hidden), lookups: AtomicUsize::new(0) }
	}
}
impl KeyStore for RacingStore {
	fn find_consumer<'a>(&'a self, name: &'a ConsumerName) -> StoreFuture<'a, Option<Consumer>> {
		self.inner.find_consumer(name)
	}

	fn insert_consumer<'a>(
		&'a self,
		checkpoint: &'a Checkpoint,
		name: ConsumerName,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Consumer> {
		self.inner.insert_consumer(checkpoint, name, credentials)
	}

	fn update_consumer_profile<'a>(
		&'a self,
		id: RecordId,
		description: Option<&'a str>,
		owner: Option<UserId>,
	) -> StoreFuture<'a, Consumer> {
		self.inner.update_consumer_profile(id, description, owner)
	}

	fn find_tokens<'a>(&'a self, identity: &'a TokenIdentity) -> StoreFuture<'a, Vec<Token>> {
		self.lookups.fetch_add(1, Ordering::SeqCst);

		let hide = self
			.hidden
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
			.is_ok();

		if hide {
			return Box::pin(async { Ok(Vec::new()) });
		}

		self.inner.find_tokens(identity)
	}

	fn insert_token<'a>(
		&'a self,
		checkpoint: &'a Checkpoint,
		identity: TokenIdentity,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Token> {
		self.inner.insert_token(checkpoint, identity, credentials)
	}

	fn credentials_exist<'a>(
		&'a self,
		table: CredentialTable,
		pair: &'a CredentialPair,
	) -> StoreFuture<'a, bool> {
		self.inner.credentials_exist(table, pair)
	}

	fn find_resource<'a>(&'a self, name: &'a ResourceName) -> StoreFuture<'a, Option<Resource>> {
		self.inner.find_resource(name)
	}

	fn begin_checkpoint(&self) -> StoreFuture<'_, Checkpoint> {
		self.inner.begin_checkpoint()
	}

	fn commit_checkpoint(&self, checkpoint: Checkpoint) -> StoreFuture<'_, ()> {
		self.inner.commit_checkpoint(checkpoint)
	}

	fn rollback_checkpoint(&self, checkpoint: Checkpoint) -> StoreFuture<'_, ()> {
		self.inner.rollback_checkpoint(checkpoint)
	}
}

async fn warehouse(registry: &Registry) -> Consumer {
	registry
		.create_consumer(consumer_name("warehouse"), None, None)
		.await
		.expect("Consumer fixture should be created.")
}

fn identity(token_type: TokenType) -> TokenIdentity {
	TokenIdentity::new(consumer_name("warehouse"), token_type, TIMESTAMP)
}

#[tokio::test]
async fn create_token_assigns_credentials_once() {
	let (registry, store) = build_test_registry();
	let consumer = warehouse(&registry).await;
	let first = registry
		.create_token(&consumer, TokenType::Access, TIMESTAMP, None)
		.await
		.expect("First create_token call should succeed.");
	let second = registry
		.create_token(&consumer, TokenType::Access, TIMESTAMP, None)
		.await
		.expect("Second create_token call should succeed.");

	assert_eq!(first.id, second.id);
	assert_eq!(first.credentials, second.credentials);
	assert_eq!(store.tokens(), vec![first]);
}

#[tokio::test]
async fn distinct_identities_get_distinct_tokens() {
	let (registry, store) = build_test_registry();
	let consumer = warehouse(&registry).await;
	let alice = UserId::new("alice").expect("User fixture should be valid.");
	let request = registry
		.create_token(&consumer, TokenType::Request, TIMESTAMP, None)
		.await
		.expect("Request token should be created.");
	let access = registry
		.create_token(&consumer, TokenType::Access, TIMESTAMP, None)
		.await
		.expect("Access token should be created.");
	let for_alice = registry
		.create_token(&consumer, TokenType::Access, TIMESTAMP, Some(alice.clone()))
		.await
		.expect("User-bound token should be created.");
	let later = registry
		.create_token(&consumer, TokenType::Access, TIMESTAMP + 1, None)
		.await
		.expect("Later token should be created.");
	let mut ids = vec![request.id, access.id, for_alice.id, later.id];

	ids.sort();
	ids.dedup();

	assert_eq!(ids.len(), 4);
	assert_eq!(store.tokens().len(), 4);
	assert_eq!(for_alice.identity.user, Some(alice));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_converge_on_one_token() {
	const CALLERS: usize = 16;

	let (registry, store) = build_test_registry();
	let consumer = warehouse(&registry).await;
	let handles = (0..CALLERS)
		.map(|_| {
			let registry = registry.clone();
			let consumer = consumer.clone();

			tokio::spawn(async move {
				registry.create_token(&consumer, TokenType::Access, TIMESTAMP, None).await
			})
		})
		.collect::<Vec<_>>();
	let mut tokens = Vec::with_capacity(CALLERS);

	for handle in handles {
		tokens.push(
			handle
				.await
				.expect("Task should not panic.")
				.expect("Concurrent create_token should succeed."),
		);
	}

	let stored = store.tokens();

	assert_eq!(stored.len(), 1, "At most one token may be created for one identity.");
	assert_eq!(store.open_checkpoints(), 0);
	assert!(
		tokens.iter().all(|token| token == &stored[0]),
		"Every caller must see the stored row and its credentials."
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_or_create_reports_one_creation() {
	const CALLERS: usize = 16;

	let (registry, store) = build_test_registry();
	let handles = (0..CALLERS)
		.map(|_| {
			let registry = registry.clone();

			tokio::spawn(async move {
				registry.first_or_create_token(&identity(TokenType::Access)).await
			})
		})
		.collect::<Vec<_>>();
	let mut created = 0;
	let mut tokens = Vec::with_capacity(CALLERS);

	for handle in handles {
		let (token, fresh) = handle
			.await
			.expect("Task should not panic.")
			.expect("Concurrent first_or_create_token should succeed.");

		created += usize::from(fresh);
		tokens.push(token);
	}

	let stored = store.tokens();

	assert_eq!(created, 1, "Exactly one caller must observe the creation.");
	assert_eq!(stored.len(), 1);
	assert!(tokens.iter().all(|token| token == &stored[0]));
}

#[tokio::test]
async fn lost_race_returns_the_winning_row() {
	let memory = MemoryStore::default();
	let seeded = Registry::new(Arc::new(memory.clone()));
	let winner = seeded
		.first_or_create_token(&identity(TokenType::Access))
		.await
		.expect("Seeding the winning row should succeed.");

	assert!(winner.1);

	let racing = Arc::new(RacingStore::hiding(memory.clone(), 1));
	let registry = Registry::new(racing.clone());
	let (token, created) = registry
		.first_or_create_token(&identity(TokenType::Access))
		.await
		.expect("Conflict should resolve to the existing row.");

	assert!(!created);
	assert_eq!(token, winner.0, "The loser must get the winner's credentials.");
	assert_eq!(racing.lookups.load(Ordering::SeqCst), 2);
	assert_eq!(memory.tokens().len(), 1, "The conflicting insert must be rolled back.");
	assert_eq!(memory.open_checkpoints(), 0);
}

#[tokio::test]
async fn conflict_without_visible_row_is_record_not_found() {
	let memory = MemoryStore::default();

	Registry::new(Arc::new(memory.clone()))
		.first_or_create_token(&identity(TokenType::Request))
		.await
		.expect("Seeding the conflicting row should succeed.");

	let racing = Arc::new(RacingStore::hiding(memory.clone(), 1 + LOOKUPS_AFTER_CONFLICT));
	let registry = Registry::new(racing.clone());
	let err = registry
		.first_or_create_token(&identity(TokenType::Request))
		.await
		.expect_err("A conflict followed by an empty lookup must fail.");

	assert!(matches!(err, Error::RecordNotFound { entity: "Token", .. }));
	assert!(err.to_string().contains("token_type=request"));
	assert_eq!(racing.lookups.load(Ordering::SeqCst), 1 + LOOKUPS_AFTER_CONFLICT);
	assert_eq!(memory.tokens().len(), 1);
	assert_eq!(memory.open_checkpoints(), 0);
}

#[tokio::test]
async fn duplicate_rows_resolve_to_the_first_one() {
	let memory = MemoryStore::without_token_uniqueness();
	let checkpoint = memory.begin_checkpoint().await.expect("Checkpoint should open.");
	let first = memory
		.insert_token(&checkpoint, identity(TokenType::Access), CredentialPair::new("k", "first"))
		.await
		.expect("First duplicate should insert.");

	memory
		.insert_token(&checkpoint, identity(TokenType::Access), CredentialPair::new("k", "second"))
		.await
		.expect("Second duplicate should insert.");
	memory.commit_checkpoint(checkpoint).await.expect("Commit should succeed.");

	let registry = Registry::new(Arc::new(memory.clone()));
	let (token, created) = registry
		.first_or_create_token(&identity(TokenType::Access))
		.await
		.expect("Duplicates must not turn into a hard failure.");

	assert!(!created);
	assert_eq!(token, first);
	assert_eq!(memory.tokens().len(), 2);
}

#[tokio::test]
async fn resolve_resource_looks_up_seeded_rows() {
	let (registry, store) = build_test_registry();
	let name = ResourceName::new("inventory").expect("Resource fixture should be valid.");
	let seeded = store.seed_resource(name.clone());
	let resolved =
		registry.resolve_resource(&name).await.expect("Seeded resource should resolve.");

	assert_eq!(resolved, seeded);

	let missing = ResourceName::new("billing").expect("Resource fixture should be valid.");
	let err = registry
		.resolve_resource(&missing)
		.await
		.expect_err("Unknown resources must not resolve.");

	assert!(matches!(err, Error::RecordNotFound { entity: "Resource", .. }));
}
