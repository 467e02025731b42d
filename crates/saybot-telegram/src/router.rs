//! Long-polling router: builds the bot, registers the command menu, and
//! dispatches updates until a termination signal arrives.

use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};

use tracing::{info, warn};

use saybot_core::commands::AppState;

use crate::{handlers, TelegramMessenger};

/// Command menu registered with Telegram for client-side autocomplete.
fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("say", "Отправить сообщение боту"),
        BotCommand::new("reset", "Начать новый диалог"),
        BotCommand::new("add_user", "Добавить пользователя (только администратор)"),
        BotCommand::new("add_group", "Разрешить боту писать в эту группу"),
    ]
}

pub async fn run_polling(state: Arc<AppState>) -> anyhow::Result<()> {
    let bot = Bot::new(state.cfg.bot_token.clone());

    info!("setup commands...");
    bot.set_my_commands(bot_commands()).await?;

    let me = bot.get_me().await?;
    info!("bot @{} is starting...", me.username());
    let bot_name = handlers::BotName(me.username().to_string());

    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, messenger, bot_name])
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        if let Ok(done) = token.shutdown() {
            done.await;
        }
    });

    dispatcher.dispatch().await;
    info!("bot stopped");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = ctrl_c => info!("SIGINT received, stopping bot"),
                _ = term.recv() => info!("SIGTERM received, stopping bot"),
            }
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable: {e}");
            let _ = ctrl_c.await;
            info!("SIGINT received, stopping bot");
        }
    }
}
