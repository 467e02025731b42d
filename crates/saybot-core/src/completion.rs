use async_trait::async_trait;

use crate::{domain::ConversationToken, Result};

/// One turn's worth of input for the completion provider.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Continuation token from the previous turn; `None` starts a new
    /// conversation on the provider side.
    pub previous: Option<ConversationToken>,
}

/// Final result of a completion turn.
#[derive(Clone, Debug)]
pub struct CompletionOutcome {
    pub text: String,
    /// Token to pass as `previous` on the next turn of this conversation.
    pub token: ConversationToken,
}

/// Completion provider interface.
///
/// We prefer a callback-based streaming interface over `Stream<Item = ...>`
/// so provider implementations can drive their own receive loops.
/// `on_progress` receives cumulative snapshots of the text generated so far,
/// not deltas; consecutive snapshots may be identical.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        req: CompletionRequest,
        on_progress: &mut (dyn FnMut(String) -> Result<()> + Send),
    ) -> Result<CompletionOutcome>;
}
