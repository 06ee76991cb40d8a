//! Brokerage accounts: bookkeeping partitions keyed by id.

use std::fmt;

/// Id of the account used when a caller does not name one.
pub const DEFAULT_ACCOUNT_ID: &str = "DEFAULT";

/// An account the broker keeps separate blotters for.
///
/// Two accounts with the same `id` are the same account as far as the
/// broker is concerned; `name` is descriptive only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    pub id: String,
    pub name: String,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// An account with an empty name.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }

    /// The account orders land in when none is supplied.
    pub fn default_account() -> Self {
        Self::new(DEFAULT_ACCOUNT_ID, "Defacto account when account not provided")
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::default_account()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.name)
        }
    }
}
