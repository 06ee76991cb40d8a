//! Error types for order validation, blotter lookups and record parsing.

/// Why an order or account was refused by the broker.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationError {
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("quantity must be greater than zero")]
    ZeroQuantity,
    #[error("quantity {0} exceeds the largest signed position")]
    QuantityTooLarge(u64),
    #[error("account id must not be empty")]
    InvalidAccount,
}

/// A blotter or position was requested for an account the broker never saw.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("unknown account: {0}")]
    UnknownAccount(String),
}

/// Failure decoding an order record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid side code: {0:?}")]
    Side(String),
    #[error("invalid number: {0:?}")]
    Number(String),
    #[error("unknown security type: {0:?}")]
    Security(String),
    #[error("unknown currency: {0:?}")]
    Currency(String),
    #[error("invalid order: {0}")]
    Invalid(#[from] ValidationError),
}
