pub mod agent;
pub mod bot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod history;
pub mod llm;
pub mod models;

#[cfg(test)]
mod testing;

use agent::RelayAgent;
use bot::LaunchPolicy;
use cli::Args;
use dispatch::Dispatcher;
use error::RelayError;
use gateway::{ ChatGateway, TelegramGateway };
use log::info;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(args: Args) -> Result<(), RelayError> {
    if args.telegram_bot_token.trim().is_empty() {
        return Err(RelayError::Config("TELEGRAM_BOT_TOKEN is missing".to_string()));
    }
    let llm_config = args.llm_config().map_err(RelayError::Config)?;

    info!("--- Core Configuration ---");
    info!("Telegram API: {}", args.telegram_api_url);
    info!("Poll Timeout: {}s", args.telegram_poll_timeout);
    info!("Chat LLM Type: {}", llm_config.llm_type);
    info!("Chat Base URL: {}", llm_config.base_url.as_deref().unwrap_or("adapter default"));
    info!("Chat Timeout: {}s", args.chat_timeout_secs);
    info!("Max History: {}", args.max_history);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("-------------------------");

    let prompts = config::prompt::load_prompts(
        args.prompts_path.as_deref(),
        args.system_prompt.as_deref()
    )?;
    let store = history::create_conversation_store(&args, &prompts.system_prompt);
    let chat_client = llm::chat::new_client(&llm_config)?;
    let gateway: Arc<dyn ChatGateway> = Arc::new(
        TelegramGateway::new(
            args.telegram_bot_token.clone(),
            Some(args.telegram_api_url.clone()),
            args.telegram_poll_timeout,
            args.telegram_send_rate
        )?
    );

    let policy = LaunchPolicy {
        attempts: args.launch_retries,
        delay: Duration::from_secs(args.launch_retry_delay_secs),
    };
    let identity = bot::launch(gateway.as_ref(), policy).await?;

    info!("🤖 AI Chat Bot is running as @{}", identity.username.as_deref().unwrap_or("unknown"));
    info!("📊 Model: {}", chat_client.get_model());
    info!("💾 Conversation memory: Enabled");
    info!("✅ Ready to chat!");

    let agent = RelayAgent::new(
        store,
        chat_client,
        gateway.clone(),
        prompts,
        Duration::from_secs(args.chat_timeout_secs)
    ).with_bot_username(identity.username);
    let dispatcher = Dispatcher::new(Arc::new(agent));

    bot::run_until(gateway, dispatcher, bot::shutdown_signal()).await;
    Ok(())
}
