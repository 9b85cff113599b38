//! Domain-agnostic building blocks shared by the server, repositories,
//! and the background worker: the error taxonomy, id/time aliases, the
//! keyset pagination engine, and webhook signature verification.

pub mod error;
pub mod pagination;
pub mod signature;
pub mod types;
