//! Telegram transport: long polling via `teloxide`.
//!
//! The chat id is the session id. The dispatcher handles one update at a time
//! per chat and different chats concurrently.

use std::sync::Arc;

use pilelog_backend::BackendClient;
use pilelog_core::{Engine, Keyboard, Outgoing};
use pilelog_shared::SessionId;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};
use tracing::{debug, warn};

type SharedEngine = Arc<Engine<BackendClient>>;

/// Poll Telegram until Ctrl-C.
pub(crate) async fn run(engine: SharedEngine, token: String) {
    let bot = Bot::new(token);

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(bot: Bot, msg: Message, engine: SharedEngine) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        debug!(chat = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let replies = engine.handle(SessionId(msg.chat.id.0), text).await;

    for reply in replies {
        // A failed send must not stop the remaining replies or the dispatcher.
        if let Err(e) = send(&bot, msg.chat.id, reply).await {
            warn!(chat = msg.chat.id.0, error = %e, "failed to send message");
        }
    }

    Ok(())
}

async fn send(bot: &Bot, chat_id: ChatId, reply: Outgoing) -> ResponseResult<()> {
    let request = bot.send_message(chat_id, reply.text);

    match reply.keyboard {
        Keyboard::Keep => request.await?,
        Keyboard::Show(rows) => {
            request
                .reply_markup(ReplyMarkup::Keyboard(reply_keyboard(rows)))
                .await?
        }
        Keyboard::Remove => {
            request
                .reply_markup(ReplyMarkup::KeyboardRemove(KeyboardRemove::new()))
                .await?
        }
    };

    Ok(())
}

fn reply_keyboard(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
}
