//! Common utils.

pub mod closable;
mod unique_id;

#[doc(inline)]
pub use closable::{Closable, Closer};
pub use unique_id::UniqueId;

/// Seals traits that are not meant to be implemented outside the crate.
pub trait Sealed {}
