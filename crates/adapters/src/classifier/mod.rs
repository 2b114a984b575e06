//! Intent classifier adapters.

#[cfg(feature = "openai")]
pub mod openai;
