//! Shared primitive types used across the dashboard core.

/// A customer identifier in its string form.
/// Scored-schema integer ids are compared through their decimal rendering.
pub type CustomerId = String;

/// A stable identifier for an account owned by a customer.
pub type AccountId = String;

/// An opaque classification label emitted by the external model
/// (segment, next-best-offer).
pub type Label = i64;
