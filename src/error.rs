use thiserror::Error;

/// Errors raised when configuring a container at construction time.
///
/// Every per-element operation (`insert`, `search`, `remove`, ...) is
/// infallible: misuse of those is a programmer error and surfaces as a
/// `debug_assert!` or panic, not a `Result`. The one genuinely fallible
/// surface is the [`crate::alloc::BlockAllocator`] configuration consumed
/// by [`crate::trie::Trie`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocError {
    #[error("block size must be non-zero")]
    ZeroBlockSize,
    #[error("alignment {0} is not a power of two")]
    InvalidAlignment(usize),
}

pub type Result<T> = std::result::Result<T, AssocError>;
