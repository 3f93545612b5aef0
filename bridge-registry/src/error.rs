use thiserror::Error;

/// The failure arm observed through a taken [`OperationFuture`].
///
/// The bridge never inspects the native side's failure payload; it is routed
/// here opaquely and translated into the caller's own error convention only
/// at the point of observation.
///
/// [`OperationFuture`]: crate::registry::OperationFuture
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError<E> {
    /// The native side reported an operation-specific failure payload.
    #[error("native side reported a failure")]
    Native(E),

    /// The registry slot was dropped before any result arrived, either via
    /// an explicit abandon or an expiry sweep.
    #[error("operation was abandoned before a result arrived")]
    Abandoned,
}

impl<E> CompletionError<E> {
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned)
    }

    /// The native failure payload, if that is what this error carries.
    pub fn into_native(self) -> Option<E> {
        match self {
            Self::Native(payload) => Some(payload),
            Self::Abandoned => None,
        }
    }
}
