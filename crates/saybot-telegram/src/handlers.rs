//! Inbound update handling: normalize a Telegram message into an
//! `Invocation` and route the command verb to the core operations.

use std::sync::Arc;

use teloxide::prelude::*;

use saybot_core::commands::{self, AppState};
use saybot_core::domain::{ChatId, MessageId, UserId};
use saybot_core::messaging::{ChatKind, Invocation, Messenger};

use crate::TelegramMessenger;

/// Username of the running bot, injected by the router so commands addressed
/// to other bots can be ignored.
#[derive(Clone)]
pub struct BotName(pub String);

/// Split `/verb[@botname] payload` into the lowercased verb and the trimmed
/// payload. Commands addressed to a different bot yield `None`; usernames
/// compare case-insensitively.
fn parse_command(text: &str, me: &str) -> Option<(String, String)> {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let mut pieces = first.trim_start_matches('/').split('@');
    let verb = pieces.next().unwrap_or("").to_lowercase();
    match pieces.next() {
        Some(addressee) if !addressee.eq_ignore_ascii_case(me) => None,
        _ => Some((verb, rest)),
    }
}

fn invocation_from(msg: &Message) -> Option<Invocation> {
    let user = msg.from()?;
    Some(Invocation {
        chat: ChatId(msg.chat.id.0),
        kind: if msg.chat.is_private() {
            ChatKind::Private
        } else {
            ChatKind::Group
        },
        from: UserId(user.id.0 as i64),
        username: user.username.clone(),
        chat_title: msg.chat.title().map(ToString::to_string),
        message: MessageId(msg.id.0),
    })
}

pub async fn handle_message(
    msg: Message,
    state: Arc<AppState>,
    messenger: Arc<TelegramMessenger>,
    me: BotName,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.starts_with('/') {
        return Ok(());
    }
    let Some(inv) = invocation_from(&msg) else {
        return Ok(());
    };

    let Some((verb, arg)) = parse_command(text, &me.0) else {
        return Ok(());
    };
    let api: &dyn Messenger = messenger.as_ref();

    let res = match verb.as_str() {
        "say" => commands::say(&state, api, &inv, &arg).await,
        "add_user" => commands::add_user(&state, api, &inv, &arg).await,
        "add_group" => commands::add_group(&state, api, &inv).await,
        "reset" => commands::reset(&state, api, &inv).await,
        _ => Ok(()),
    };

    if let Err(e) = res {
        tracing::error!("command /{verb} failed in {}: {e}", inv.chat_label());
    }

    Ok(())
}
