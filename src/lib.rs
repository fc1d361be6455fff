#![cfg_attr(feature = "nightly", feature(core_intrinsics))]

//! Intrusive associative containers that map a 32-bit key or hash to an
//! opaque element pointer, preserving insertion order among duplicates.
//!
//! This crate is a family of chained hash tables and radix tries that share
//! one node model (see [`node::Node`]): the container never allocates or
//! copies the user's object, it only threads `next`/`prev`/`key` pointers
//! embedded in a [`node::Node<T>`] the caller pins alongside it. Four
//! container shapes are exposed, each trading a different axis of the same
//! design space:
//!
//! - [`hash_dyn::HashDyn`] — power-of-two bucket array, amortized grow/shrink.
//! - [`hash_lin::HashLin`] — the same chained layout, but grow/shrink is
//!   deamortized across many operations so no single `insert`/`remove` ever
//!   pays for a full rehash.
//! - [`trie::Trie`] — a 64-ary compressed radix trie over the key's bits,
//!   with inner nodes drawn from a dedicated [`alloc::BlockAllocator`].
//! - [`trie_inplace::TrieInplace`] — the same radix shape at a 4-ary branching
//!   factor, with no external allocator: internal branch structure is reused
//!   storage inside the nodes already inserted.
//!
//! [`list::List`] (the collision chain every container above threads
//! through) and [`array::Array`] (the segmented bucket vector backing
//! `HashLin`) are exposed directly since both are useful containers in their
//! own right, alongside its [`array::ArrayOf`] (byte-size-parameterized) and
//! [`array::BlockArray`] (uniform-segment) siblings. [`hash`] exposes the
//! crate's hash/mix primitives.
//!
//! # Safety
//!
//! Every container here is intrusive and unsafe at the edges: `insert` and
//! `remove_existing` take a raw, pinned [`core::ptr::NonNull`] to a node the
//! caller owns, and it is the caller's responsibility to keep that node
//! alive and at a stable address for as long as it is linked. None of these
//! containers are `Send`/`Sync`; per the crate's concurrency model, callers
//! must serialize all access to a given container instance themselves.

/// Component A: hash/mix primitives (`hash_u32`, `hash_u64`, `strhash_u32`,
/// `inthash_u32`, `inthash_u64`).
pub mod hash;
/// Component B: fixed-size block allocator backing [`trie::Trie`].
pub mod alloc;
/// Component C: intrusive doubly linked list (collision chain, sort, concat).
pub mod list;
/// Component D: segmented, never-reallocating array backing [`hash_lin::HashLin`].
/// Also exposes the `arrayof` ([`array::ArrayOf`]) and blocked
/// ([`array::BlockArray`]) flavors described in §4.D, which share the same
/// contract and invariants as [`array::Array`].
pub mod array;
/// Component E: dynamic (amortized-resize) chained hash table.
pub mod hash_dyn;
/// Component F: linear (incrementally-resized) chained hash table.
pub mod hash_lin;
/// Component G: 64-ary compressed radix trie.
pub mod trie;
/// Component H: 4-ary radix trie built from nodes embedded in user objects.
pub mod trie_inplace;
/// The shared intrusive node type (§3.1) threaded by every container above
/// except [`trie_inplace`], which embeds its own node shape directly.
pub mod node;
/// Fallible configuration-time errors (see [`error::AssocError`]).
pub mod error;

/// Branch-prediction hints used on the hot lookup paths; identity function
/// on stable, `core::intrinsics::likely` under `nightly`.
mod hint;

pub use array::{Array, ArrayOf, BlockArray};
pub use error::AssocError;
pub use hash_dyn::HashDyn;
pub use hash_lin::{HashLin, ResizeState};
pub use list::List;
pub use node::Node;
pub use trie::Trie;
pub use trie_inplace::{InplaceNode, TrieInplace};
