//! Names used to key keyring rows.
//!
//! A consumer is registered once under its [`ConsumerName`], tokens and consumers may point at
//! the [`UserId`] acting through them, and remote resources are looked up by [`ResourceName`].
//! All three are opaque to the keyring. They must be non-empty and at most 128 bytes, and may
//! not contain whitespace since they are copied into log fields and error messages.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Checks `value` and wraps it.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let name = value.as_ref();

				check_name($kind, name)?;

				Ok(Self(name.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				check_name($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const NAME_MAX_BYTES: usize = 128;

/// Why a consumer, user, or resource name was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing to register or look up.
	#[error("{kind} name cannot be empty.")]
	Empty {
		/// `Consumer`, `User`, or `Resource`.
		kind: &'static str,
	},
	/// Whitespace would split the name inside headers and log fields.
	#[error("{kind} name contains whitespace.")]
	ContainsWhitespace {
		/// `Consumer`, `User`, or `Resource`.
		kind: &'static str,
	},
	/// UTF-8 encoding is longer than a stored name may be.
	#[error("{kind} name exceeds {max} bytes.")]
	TooLong {
		/// `Consumer`, `User`, or `Resource`.
		kind: &'static str,
		/// Byte limit.
		max: usize,
	},
}

def_id! { ConsumerName, "Unique name an API consumer is registered under.", "Consumer" }
def_id! { UserId, "User that owns a consumer or on whose behalf a token acts.", "User" }
def_id! { ResourceName, "Remote resource looked up once and handed to clients.", "Resource" }

/// Store-assigned row identifier; increases monotonically in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);
impl Display for RecordId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "#{}", self.0)
	}
}

fn check_name(kind: &'static str, name: &str) -> Result<(), IdentifierError> {
	if name.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if name.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if name.len() > NAME_MAX_BYTES {
		return Err(IdentifierError::TooLong { kind, max: NAME_MAX_BYTES });
	}

	Ok(())
}
