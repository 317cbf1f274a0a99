//! Stock ledger
//!
//! Owns stock items, batches and the append-only movement trail.
//! Allocation planning (`fefo`) is pure and read-only; posting and
//! voiding run in single write transactions on the engine.

pub mod fefo;
mod ledger;

#[cfg(test)]
mod tests;
