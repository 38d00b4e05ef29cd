//! Consumer registry: idempotent get-or-create by name.

// self
use crate::{
	_prelude::*,
	auth::{Consumer, ConsumerName, CredentialPair, CredentialTable, UserId},
	issue::{self, CreateTarget, Registry},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::{Checkpoint, KeyStore, StoreFuture},
};

struct ConsumerTarget<'n> {
	name: &'n ConsumerName,
}
impl CreateTarget for ConsumerTarget<'_> {
	type Record = Consumer;

	const ENTITY: &'static str = "Consumer";
	const OP: OpKind = OpKind::CreateConsumer;
	const TABLE: CredentialTable = CredentialTable::Consumers;

	fn describe(&self) -> String {
		format!("name={}", self.name)
	}

	fn find_first<'a>(&'a self, store: &'a dyn KeyStore) -> StoreFuture<'a, Option<Consumer>> {
		store.find_consumer(self.name)
	}

	fn insert<'a>(
		&'a self,
		store: &'a dyn KeyStore,
		checkpoint: &'a Checkpoint,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Consumer> {
		store.insert_consumer(checkpoint, self.name.clone(), credentials)
	}
}

impl Registry {
	/// Returns the consumer named `name`, creating it with fresh credentials on first use.
	///
	/// `description` and `owner` overwrite the stored values when given, on new and existing
	/// consumers alike. Only those fields are written back, so credentials of an existing
	/// consumer are never touched, even by a caller that lost the creation race.
	pub async fn create_consumer(
		&self,
		name: ConsumerName,
		description: Option<&str>,
		owner: Option<UserId>,
	) -> Result<Consumer> {
		const KIND: OpKind = OpKind::CreateConsumer;

		let span = OpSpan::new(KIND, "create_consumer");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let store = self.store.as_ref();
				let (consumer, _) =
					issue::first_or_create(store, &self.generator, &ConsumerTarget { name: &name })
						.await?;

				if !consumer.clone().apply_profile(description, owner.clone()) {
					return Ok(consumer);
				}

				Ok(store.update_consumer_profile(consumer.id, description, owner).await?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}
