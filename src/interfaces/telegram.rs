//! Telegram transport built on teloxide.
//!
//! Incoming messages and button presses become [`Event`]s for the session machine;
//! the machine answers through [`TelegramMessenger`].

use crate::application::machine::PaymentSessionMachine;
use crate::application::messages::{MENU_ACCOUNT_INFO, MENU_CREATE_QR, MENU_HELP};
use crate::domain::event::{Event, UserId};
use crate::domain::ports::{Button, Markup, Messenger};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup,
    ReplyMarkup,
};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

pub type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Поддерживаемые команды:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(description = "создать QR-код для оплаты")]
    Payment,
    #[command(description = "инструкция для сотрудника")]
    Help,
    #[command(description = "реквизиты счета")]
    Info,
    #[command(description = "отменить текущую операцию")]
    Cancel,
}

/// Sends machine output to private chats. In a private chat the chat id equals the user id.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn chat_id(user: UserId) -> ChatId {
    ChatId(user.0 as i64)
}

fn delivery(error: teloxide::RequestError) -> PaymentError {
    PaymentError::Delivery(error.to_string())
}

fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(MENU_CREATE_QR)],
        vec![
            KeyboardButton::new(MENU_ACCOUNT_INFO),
            KeyboardButton::new(MENU_HELP),
        ],
    ])
    .resize_keyboard(true)
}

fn inline_keyboard(rows: Vec<Vec<Button>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.callback))
            .collect::<Vec<_>>()
    }))
}

fn reply_markup(markup: Markup) -> ReplyMarkup {
    match markup {
        Markup::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_keyboard(rows)),
        Markup::MainMenu => ReplyMarkup::Keyboard(main_menu()),
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, user: UserId, text: String, markup: Option<Markup>) -> Result<()> {
        let request = self.bot.send_message(chat_id(user), text);
        match markup {
            Some(markup) => request.reply_markup(reply_markup(markup)).await,
            None => request.await,
        }
        .map_err(delivery)?;
        Ok(())
    }

    async fn send_image(&self, user: UserId, png: Vec<u8>, caption: String) -> Result<()> {
        self.bot
            .send_photo(chat_id(user), InputFile::memory(png).file_name("payment.png"))
            .caption(caption)
            .reply_markup(main_menu())
            .await
            .map_err(delivery)?;
        Ok(())
    }
}

/// Runs the bot until Ctrl-C.
pub async fn run(bot: Bot, machine: Arc<PaymentSessionMachine>) {
    if let Err(error) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!(%error, "Failed to register bot commands");
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::endpoint(handle_text)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("Starting QR payment bot");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![machine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn sender(msg: &Message) -> Option<UserId> {
    msg.from().map(|user| UserId(user.id.0))
}

async fn handle_command(
    msg: Message,
    cmd: Command,
    machine: Arc<PaymentSessionMachine>,
) -> HandlerResult {
    let Some(user) = sender(&msg) else {
        return Ok(());
    };

    match cmd {
        Command::Start => machine.welcome(user).await?,
        Command::Help => machine.show_help(user).await?,
        Command::Info => machine.show_account_info(user).await?,
        Command::Payment => {
            let outcome = machine.handle(user, Event::StartPayment).await?;
            debug!(%user, ?outcome, "Handled /payment");
        }
        Command::Cancel => {
            let outcome = machine.handle(user, Event::Cancel).await?;
            debug!(%user, ?outcome, "Handled /cancel");
        }
    }
    Ok(())
}

/// Slash commands that did not match [`Command`] end up here; they are never amounts.
fn is_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

async fn handle_text(msg: Message, machine: Arc<PaymentSessionMachine>) -> HandlerResult {
    let (Some(user), Some(text)) = (sender(&msg), msg.text()) else {
        return Ok(());
    };

    match text {
        MENU_ACCOUNT_INFO => machine.show_account_info(user).await?,
        MENU_HELP => machine.show_help(user).await?,
        MENU_CREATE_QR => {
            let outcome = machine.handle(user, Event::StartPayment).await?;
            debug!(%user, ?outcome, "Handled menu start");
        }
        command if is_command(command) => machine.unknown_command(user, command).await?,
        _ => {
            let outcome = machine.handle(user, Event::Text(text.to_string())).await?;
            debug!(%user, ?outcome, "Handled text");
        }
    }
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    machine: Arc<PaymentSessionMachine>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let user = UserId(q.from.id.0);
    let Some(data) = q.data else {
        return Ok(());
    };

    let outcome = match Event::from_callback(&data) {
        Ok(event) => machine.handle(user, event).await?,
        Err(error) => machine.reject(user, error).await?,
    };
    debug!(%user, data = %data, ?outcome, "Handled callback");
    Ok(())
}
