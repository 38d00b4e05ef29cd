// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by keyring operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("consumer_keyring.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event when an insert lost a uniqueness race and the lookup is retried.
pub fn trace_conflict_recovery(entity: &'static str, identity: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(entity, identity, "insert conflicted; retrying lookup after rollback");
	#[cfg(not(feature = "tracing"))]
	let _ = (entity, identity);
}

/// Emits a warning when rolling back a failed insert also failed; the insert error still wins.
pub fn trace_rollback_failure(entity: &'static str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(entity, error = %error, "checkpoint rollback failed after insert error");
	#[cfg(not(feature = "tracing"))]
	let _ = (entity, error);
}

/// Emits a warning when a transport is built with certificate validation disabled.
pub fn trace_insecure_transport(base_url: &str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(base_url, "TLS certificate validation is disabled for this resource");
	#[cfg(not(feature = "tracing"))]
	let _ = base_url;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::CreateToken, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn trace_helpers_noop_without_subscriber() {
		trace_conflict_recovery("Token", "consumer=x");
		trace_insecure_transport("https://internal.example");
		trace_rollback_failure(
			"Consumer",
			&crate::store::StoreError::Backend { message: "gone".into() },
		);
	}
}
