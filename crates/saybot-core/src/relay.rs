//! Streaming relay: drives one completion turn and renders progress into a
//! single chat message through a trailing-edge throttle.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant};

use crate::{
    completion::{CompletionClient, CompletionOutcome, CompletionRequest},
    config::Config,
    conversation::{conversation_key, ConversationStore},
    domain::{ChatId, MessageId, MessageRef},
    formatting::markdown_to_html,
    messaging::{Invocation, Messenger},
    Result,
};

/// Render state for the one message a turn streams into.
///
/// The first render replies to the invoking message; later renders edit that
/// message in place. At most one render happens per throttle window, and a
/// burst of snapshots inside a window collapses to the newest one.
#[derive(Debug)]
pub struct StreamingReply {
    chat: ChatId,
    reply_to: MessageId,
    window: Duration,
    message: Option<MessageRef>,
    last_rendered: Option<String>,
    pending: Option<String>,
    next_render: Instant,
}

impl StreamingReply {
    pub fn new(inv: &Invocation, window: Duration, now: Instant) -> Self {
        Self {
            chat: inv.chat,
            reply_to: inv.message,
            window,
            message: None,
            last_rendered: None,
            pending: None,
            next_render: now,
        }
    }

    /// Record a snapshot for the next render.
    ///
    /// Empty snapshots and snapshots equal to the last rendered text are
    /// dropped; a newer snapshot replaces an unrendered pending one.
    pub fn offer(&mut self, text: String) {
        if text.is_empty() || self.last_rendered.as_deref() == Some(text.as_str()) {
            return;
        }
        self.pending = Some(text);
    }

    /// Earliest instant the pending snapshot may render, if one exists.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|_| self.next_render)
    }

    /// Render the pending snapshot and open a new throttle window.
    pub async fn render(&mut self, api: &dyn Messenger, now: Instant) -> Result<()> {
        let Some(text) = self.pending.take() else {
            return Ok(());
        };

        let html = markdown_to_html(&text);
        match self.message {
            None => {
                let msg = api.reply_html(self.chat, self.reply_to, &html).await?;
                self.message = Some(msg);
            }
            Some(msg) => api.edit_html(msg, &html).await?,
        }

        self.last_rendered = Some(text);
        self.next_render = now + self.window;
        Ok(())
    }
}

/// Execute one `/say` turn: stream the completion into a single reply
/// message, then persist the provider's continuation token under the
/// conversation key.
///
/// The typing indicator and the throttled render timer both live inside this
/// future's `select!` loop, so dropping the future (for example from an
/// enclosing timeout) cancels them with it.
pub async fn run_turn(
    cfg: &Config,
    api: &dyn Messenger,
    completion: &dyn CompletionClient,
    conversations: &ConversationStore,
    inv: &Invocation,
    text: &str,
) -> Result<CompletionOutcome> {
    let key = conversation_key(inv);
    let previous = conversations.token(&key).await?;

    let req = CompletionRequest {
        prompt: text.to_string(),
        previous,
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut on_progress = move |snapshot: String| -> Result<()> {
        let _ = tx.send(snapshot);
        Ok(())
    };

    let mut reply = StreamingReply::new(inv, cfg.stream_throttle, Instant::now());
    let mut typing = interval(cfg.typing_interval);

    let turn = completion.complete(req, &mut on_progress);
    tokio::pin!(turn);

    let outcome = loop {
        let due = reply.next_due();
        tokio::select! {
            res = &mut turn => break res?,
            Some(snapshot) = rx.recv() => reply.offer(snapshot),
            _ = typing.tick() => {
                // Best-effort: a failed indicator never aborts the turn.
                let _ = api.send_typing(inv.chat).await;
            }
            _ = sleep_until(due.unwrap_or_else(Instant::now)), if due.is_some() => {
                reply.render(api, Instant::now()).await?;
            }
        }
    };

    // Snapshots may still be queued behind the resolved completion; the final
    // text wins regardless of the throttle window.
    while let Ok(snapshot) = rx.try_recv() {
        reply.offer(snapshot);
    }
    reply.offer(outcome.text.clone());
    reply.render(api, Instant::now()).await?;

    conversations.set_token(&key, &outcome.token).await?;
    Ok(outcome)
}
