/// A broken structural invariant found by [`LlrbMap::check`].
///
/// Seeing one of these means the balancing code itself is wrong; ordinary
/// callers are not expected to recover from it.
///
/// [`LlrbMap::check`]: crate::LlrbMap::check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// An in-order walk does not yield strictly ascending keys.
    #[error("not in symmetric order")]
    NotSymmetricOrder,
    /// Two root-to-leaf paths cross a different number of black links.
    #[error("not balanced")]
    Unbalanced,
    #[error("red link leans right")]
    RightLeaningRed,
    #[error("two consecutive red links")]
    ConsecutiveReds,
    #[error("root is red")]
    RedRoot,
    /// The stored entry count disagrees with the reachable nodes.
    #[error("size mismatch: stored {stored}, counted {counted}")]
    SizeMismatch { stored: usize, counted: usize },
}
