use std::error::Error;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

mod config;
mod db;
mod error;
mod handlers;
mod jobs;
mod llm;
mod modes;
mod session;
mod state;
mod texts;
mod utils;

use config::CONFIG;
use db::Database;
use handlers::{callbacks, commands, dispatch};
use state::AppState;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
    Menu,
    Profile,
    Info,
    Newdialogue,
    Help,
    Language,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging();

    if CONFIG.bot_token.trim().is_empty() {
        return Err("BOT_TOKEN is required".into());
    }

    let bot = Bot::new(CONFIG.bot_token.clone());
    info!("Starting Gemini Assistant Bot");

    if CONFIG.enable_openrouter {
        info!("OpenRouter enabled with model: {}", CONFIG.openrouter_model);
    } else {
        warn!("OpenRouter disabled, image analysis will use canned replies");
    }
    if CONFIG.enable_kie {
        info!("kie.ai enabled with model: {}", CONFIG.kie_model);
    } else {
        warn!("kie.ai disabled");
    }

    let db = match Database::connect(&CONFIG.database_url, CONFIG.db_max_connections).await {
        Ok(db) => Some(db),
        Err(err) => {
            warn!("Running without a user store (fallback sessions only): {err}");
            None
        }
    };
    let state = AppState::new(db);

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo_message))
        .branch(
            dptree::filter_map(|msg: Message| msg.text().map(|text| text.to_string()))
                .endpoint(handle_text_message),
        )
        .endpoint(ignore_message);

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback);

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    state: AppState,
    message: Message,
    command: Command,
) -> HandlerResult {
    match command {
        Command::Start => commands::start_handler(bot, state, message).await?,
        Command::Menu => commands::menu_handler(bot, state, message).await?,
        Command::Profile => commands::profile_handler(bot, state, message).await?,
        Command::Info => commands::info_handler(bot, state, message).await?,
        Command::Newdialogue => commands::new_dialogue_handler(bot, state, message).await?,
        Command::Help => commands::help_handler(bot, state, message).await?,
        Command::Language => commands::language_handler(bot, state, message).await?,
    }
    Ok(())
}

async fn handle_text_message(
    bot: Bot,
    state: AppState,
    message: Message,
    text: String,
) -> HandlerResult {
    // Provider calls can take a while; keep the dispatcher loop free
    tokio::spawn(async move {
        if let Err(err) = dispatch::handle_text(bot, state, message, text).await {
            error!("text handler failed: {err}");
        }
    });
    Ok(())
}

async fn handle_photo_message(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    // Edit jobs poll for up to two minutes
    tokio::spawn(async move {
        if let Err(err) = dispatch::handle_photo(bot, state, message).await {
            error!("photo handler failed: {err}");
        }
    });
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}

async fn handle_callback(bot: Bot, state: AppState, query: CallbackQuery) -> HandlerResult {
    callbacks::handle_callback_query(bot, state, query).await?;
    Ok(())
}
