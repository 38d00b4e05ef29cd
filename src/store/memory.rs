//! Thread-safe in-memory [`KeyStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{
		Consumer, ConsumerName, CredentialPair, CredentialTable, RecordId, Resource, ResourceName,
		Token, TokenIdentity, UserId,
	},
	store::{Checkpoint, KeyStore, StoreError, StoreFuture},
};

type SharedTables = Arc<RwLock<Tables>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Table {
	Consumers,
	Tokens,
}

#[derive(Debug, Default)]
struct Tables {
	next_id: u64,
	next_checkpoint: u64,
	consumers: BTreeMap<RecordId, Consumer>,
	tokens: BTreeMap<RecordId, Token>,
	resources: BTreeMap<RecordId, Resource>,
	journals: HashMap<u64, Vec<(Table, RecordId)>>,
}
impl Tables {
	fn allocate_id(&mut self) -> RecordId {
		self.next_id += 1;

		RecordId(self.next_id)
	}

	fn journal(
		&mut self,
		checkpoint: &Checkpoint,
	) -> Result<&mut Vec<(Table, RecordId)>, StoreError> {
		self.journals.get_mut(&checkpoint.id()).ok_or_else(|| unknown_checkpoint(checkpoint))
	}
}

/// Storage backend that keeps every table in-process.
///
/// Consumer names are always unique. Token identities are unique by default; use
/// [`MemoryStore::without_token_uniqueness`] to model a backend lacking that constraint, where
/// concurrent inserts can produce duplicate rows.
#[derive(Clone, Debug)]
pub struct MemoryStore {
	tables: SharedTables,
	enforce_token_identity: bool,
}
impl MemoryStore {
	/// Creates a store that accepts duplicate token identities.
	pub fn without_token_uniqueness() -> Self {
		Self { tables: Default::default(), enforce_token_identity: false }
	}

	/// Registers a resource row, returning the existing one if the name is already present.
	pub fn seed_resource(&self, name: ResourceName) -> Resource {
		let mut guard = self.tables.write();

		if let Some(existing) = guard.resources.values().find(|resource| resource.name == name) {
			return existing.clone();
		}

		let id = guard.allocate_id();
		let resource = Resource { id, name };

		guard.resources.insert(id, resource.clone());

		resource
	}

	/// Snapshot of every consumer row in insertion order.
	pub fn consumers(&self) -> Vec<Consumer> {
		self.tables.read().consumers.values().cloned().collect()
	}

	/// Snapshot of every token row in insertion order.
	pub fn tokens(&self) -> Vec<Token> {
		self.tables.read().tokens.values().cloned().collect()
	}

	/// Number of checkpoints opened but not yet committed or rolled back.
	pub fn open_checkpoints(&self) -> usize {
		self.tables.read().journals.len()
	}

	fn insert_consumer_now(
		tables: SharedTables,
		checkpoint: &Checkpoint,
		name: ConsumerName,
		credentials: CredentialPair,
	) -> Result<Consumer, StoreError> {
		let mut guard = tables.write();

		guard.journal(checkpoint)?;

		if guard.consumers.values().any(|consumer| consumer.name == name) {
			return Err(StoreError::UniquenessViolation {
				table: CredentialTable::Consumers.to_string(),
				detail: format!("name={name}"),
			});
		}

		let id = guard.allocate_id();
		let consumer = Consumer::new(id, name, credentials);

		guard.consumers.insert(id, consumer.clone());
		guard.journal(checkpoint)?.push((Table::Consumers, id));

		Ok(consumer)
	}

	fn insert_token_now(
		tables: SharedTables,
		checkpoint: &Checkpoint,
		identity: TokenIdentity,
		credentials: CredentialPair,
		enforce_identity: bool,
	) -> Result<Token, StoreError> {
		let mut guard = tables.write();

		guard.journal(checkpoint)?;

		if enforce_identity && guard.tokens.values().any(|token| token.identity == identity) {
			return Err(StoreError::UniquenessViolation {
				table: CredentialTable::Tokens.to_string(),
				detail: identity.to_string(),
			});
		}

		let id = guard.allocate_id();
		let token = Token::new(id, identity, credentials);

		guard.tokens.insert(id, token.clone());
		guard.journal(checkpoint)?.push((Table::Tokens, id));

		Ok(token)
	}

	fn update_consumer_profile_now(
		tables: SharedTables,
		id: RecordId,
		description: Option<&str>,
		owner: Option<UserId>,
	) -> Result<Consumer, StoreError> {
		let mut guard = tables.write();
		let row = guard.consumers.get_mut(&id).ok_or_else(|| missing_row(Table::Consumers, id))?;

		row.apply_profile(description, owner);

		Ok(row.clone())
	}

	fn credentials_exist_now(
		tables: SharedTables,
		table: CredentialTable,
		pair: &CredentialPair,
	) -> bool {
		let guard = tables.read();
		match table {
			CredentialTable::Consumers =>
				guard.consumers.values().any(|row| &row.credentials == pair),
			CredentialTable::Tokens => guard.tokens.values().any(|row| &row.credentials == pair),
		}
	}

	fn rollback_now(tables: SharedTables, checkpoint: Checkpoint) -> Result<(), StoreError> {
		let mut guard = tables.write();
		let journal =
			guard.journals.remove(&checkpoint.id()).ok_or_else(|| unknown_checkpoint(&checkpoint))?;

		for (table, id) in journal {
			match table {
				Table::Consumers => guard.consumers.remove(&id).map(drop),
				Table::Tokens => guard.tokens.remove(&id).map(drop),
			};
		}

		Ok(())
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		Self { tables: Default::default(), enforce_token_identity: true }
	}
}
impl KeyStore for MemoryStore {
	fn find_consumer<'a>(&'a self, name: &'a ConsumerName) -> StoreFuture<'a, Option<Consumer>> {
		let tables = self.tables.clone();

		Box::pin(async move {
			Ok(tables.read().consumers.values().find(|consumer| &consumer.name == name).cloned())
		})
	}

	fn insert_consumer<'a>(
		&'a self,
		checkpoint: &'a Checkpoint,
		name: ConsumerName,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Consumer> {
		let tables = self.tables.clone();

		Box::pin(async move { Self::insert_consumer_now(tables, checkpoint, name, credentials) })
	}

	fn update_consumer_profile<'a>(
		&'a self,
		id: RecordId,
		description: Option<&'a str>,
		owner: Option<UserId>,
	) -> StoreFuture<'a, Consumer> {
		let tables = self.tables.clone();

		Box::pin(async move { Self::update_consumer_profile_now(tables, id, description, owner) })
	}

	fn find_tokens<'a>(&'a self, identity: &'a TokenIdentity) -> StoreFuture<'a, Vec<Token>> {
		let tables = self.tables.clone();

		Box::pin(async move {
			Ok(tables
				.read()
				.tokens
				.values()
				.filter(|token| &token.identity == identity)
				.cloned()
				.collect())
		})
	}

	fn insert_token<'a>(
		&'a self,
		checkpoint: &'a Checkpoint,
		identity: TokenIdentity,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Token> {
		let tables = self.tables.clone();
		let enforce = self.enforce_token_identity;

		Box::pin(async move {
			Self::insert_token_now(tables, checkpoint, identity, credentials, enforce)
		})
	}

	fn credentials_exist<'a>(
		&'a self,
		table: CredentialTable,
		pair: &'a CredentialPair,
	) -> StoreFuture<'a, bool> {
		let tables = self.tables.clone();

		Box::pin(async move { Ok(Self::credentials_exist_now(tables, table, pair)) })
	}

	fn find_resource<'a>(&'a self, name: &'a ResourceName) -> StoreFuture<'a, Option<Resource>> {
		let tables = self.tables.clone();

		Box::pin(async move {
			Ok(tables.read().resources.values().find(|resource| &resource.name == name).cloned())
		})
	}

	fn begin_checkpoint(&self) -> StoreFuture<'_, Checkpoint> {
		let tables = self.tables.clone();

		Box::pin(async move {
			let mut guard = tables.write();

			guard.next_checkpoint += 1;

			let id = guard.next_checkpoint;

			guard.journals.insert(id, Vec::new());

			Ok(Checkpoint::new(id))
		})
	}

	fn commit_checkpoint(&self, checkpoint: Checkpoint) -> StoreFuture<'_, ()> {
		let tables = self.tables.clone();

		Box::pin(async move {
			tables
				.write()
				.journals
				.remove(&checkpoint.id())
				.map(drop)
				.ok_or_else(|| unknown_checkpoint(&checkpoint))
		})
	}

	fn rollback_checkpoint(&self, checkpoint: Checkpoint) -> StoreFuture<'_, ()> {
		let tables = self.tables.clone();

		Box::pin(async move { Self::rollback_now(tables, checkpoint) })
	}
}

fn unknown_checkpoint(checkpoint: &Checkpoint) -> StoreError {
	StoreError::Backend { message: format!("Checkpoint {} is not open", checkpoint.id()) }
}

fn missing_row(table: Table, id: RecordId) -> StoreError {
	let table = match table {
		Table::Consumers => CredentialTable::Consumers,
		Table::Tokens => CredentialTable::Tokens,
	};

	StoreError::Backend { message: format!("No {table} row with id {id}") }
}
