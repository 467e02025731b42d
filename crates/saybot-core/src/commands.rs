//! The bot's four command operations over explicit dependencies.
//!
//! Transport parsing stays in the adapter; these functions receive a
//! normalized [`Invocation`] plus the argument payload and do everything
//! else: authorization, storage mutation, the streaming turn, and the
//! localized replies.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    access::AccessStore,
    completion::CompletionClient,
    config::Config,
    conversation::{conversation_key, ConversationStore},
    domain::UserId,
    messaging::{ChatKind, Invocation, Messenger},
    relay, Result,
};

// Reply strings of the deployed bot, verbatim.
pub const DENIED_USER: &str =
    "⛔️ Простите, но вы не имеете права на выполнение этой команды или общение со мной.";
pub const DENIED_GROUP: &str =
    "⛔️ Извините, мне не разрешено работать здесь. Пожалуйста, удалите меня из группы.";
pub const ADMIN_ONLY: &str = "⛔️ Извините, эта команда доступна только администратору";
pub const GROUP_ONLY: &str = "⛔️ Извините, эта команда не доступна в личной переписке";
pub const USER_ADDED: &str = "✅ Пользователь добавлен";
pub const GROUP_ALLOWED: &str = "✅ Теперь мне разрешено писать сюда";
pub const BAD_ARGUMENT: &str = "⛔️ Произошла ошибка. Проверьте правильно ввода параметров";
pub const DIALOG_RESET: &str = "🔄 Диалог очищен.";

/// Everything a command handler needs, built once at startup and shared.
pub struct AppState {
    pub cfg: Config,
    pub completion: Arc<dyn CompletionClient>,
    pub access: AccessStore,
    pub conversations: ConversationStore,
}

/// `/say <text>`: authorize, then run one streaming completion turn.
///
/// The turn runs under the configured handler timeout; on expiry the relay
/// future is dropped, whatever partial message was rendered stays in the
/// chat, and only a warning is logged.
pub async fn say(state: &AppState, api: &dyn Messenger, inv: &Invocation, text: &str) -> Result<()> {
    info!(
        "message from {} in {}: {text}",
        inv.actor_label(),
        inv.chat_label()
    );

    if !state.access.authorize(inv).await? {
        warn!(
            "authorization failed for {} in {}",
            inv.actor_label(),
            inv.chat_label()
        );
        let denial = match inv.kind {
            ChatKind::Private => DENIED_USER,
            ChatKind::Group => DENIED_GROUP,
        };
        api.reply_html(inv.chat, inv.message, denial).await?;
        return Ok(());
    }

    if text.is_empty() {
        return Ok(());
    }

    let turn = relay::run_turn(
        &state.cfg,
        api,
        state.completion.as_ref(),
        &state.conversations,
        inv,
        text,
    );
    match timeout(state.cfg.handler_timeout, turn).await {
        Ok(res) => {
            res?;
        }
        Err(_) => {
            warn!(
                "turn timed out after {:?} for {}",
                state.cfg.handler_timeout,
                inv.chat_label()
            );
        }
    }
    Ok(())
}

/// `/add_user <id>`: admin-only append to the allowed-users list.
pub async fn add_user(
    state: &AppState,
    api: &dyn Messenger,
    inv: &Invocation,
    arg: &str,
) -> Result<()> {
    info!(
        "command \"add_user {}\" from {} in {}",
        arg.trim(),
        inv.actor_label(),
        inv.chat_label()
    );

    if !state.cfg.is_admin(inv.from) {
        warn!(
            "authentication failed for {} in {}",
            inv.actor_label(),
            inv.chat_label()
        );
        api.send_html(inv.chat, ADMIN_ONLY).await?;
        return Ok(());
    }

    let Ok(id) = arg.trim().parse::<i64>() else {
        api.send_html(inv.chat, BAD_ARGUMENT).await?;
        return Ok(());
    };

    state.access.add_user(UserId(id)).await?;
    api.send_html(inv.chat, USER_ADDED).await?;
    Ok(())
}

/// `/add_group`: admin-only, group-context-only append of the current chat
/// to the allowed-groups list.
pub async fn add_group(state: &AppState, api: &dyn Messenger, inv: &Invocation) -> Result<()> {
    info!(
        "command \"add_group\" from {} in {}",
        inv.actor_label(),
        inv.chat_label()
    );

    if !state.cfg.is_admin(inv.from) {
        warn!(
            "authentication failed for {} in {}",
            inv.actor_label(),
            inv.chat_label()
        );
        api.send_html(inv.chat, ADMIN_ONLY).await?;
        return Ok(());
    }

    if inv.kind == ChatKind::Private {
        api.send_html(inv.chat, GROUP_ONLY).await?;
        return Ok(());
    }

    state.access.add_group(inv.chat).await?;
    api.send_html(inv.chat, GROUP_ALLOWED).await?;
    Ok(())
}

/// `/reset`: drop the caller's continuation token so the next turn starts a
/// fresh conversation. Open to anyone, allow-listed or not.
pub async fn reset(state: &AppState, api: &dyn Messenger, inv: &Invocation) -> Result<()> {
    info!(
        "command \"reset\" from {} in {}",
        inv.actor_label(),
        inv.chat_label()
    );

    state.conversations.clear(&conversation_key(inv)).await?;
    api.send_html(inv.chat, DIALOG_RESET).await?;
    Ok(())
}
