use std::sync::Arc;

use saybot_core::{
    access::AccessStore, commands::AppState, config::Config, conversation::ConversationStore,
    store::KvStore,
};
use saybot_openai::OpenAiClient;

#[tokio::main]
async fn main() -> Result<(), saybot_core::Error> {
    saybot_core::logging::init("saybot")?;

    let cfg = Config::load()?;

    tracing::info!("init storage at {}...", cfg.data_dir.display());
    let kv = Arc::new(KvStore::open(cfg.data_dir.clone()).await?);

    let completion = Arc::new(OpenAiClient::new(
        cfg.openai_api_key.clone(),
        cfg.openai_model.clone(),
    ));

    let state = Arc::new(AppState {
        completion,
        access: AccessStore::new(kv.clone()),
        conversations: ConversationStore::new(kv),
        cfg,
    });

    saybot_telegram::router::run_polling(state)
        .await
        .map_err(|e| saybot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
