use std::{collections::HashMap, future::Future, sync::Arc};

use anyhow::{Context, Result};
use frankenstein::{
  AnswerCallbackQueryParams, AsyncApi, AsyncTelegramApi, CallbackQuery, EditMessageTextParams,
  GetUpdatesParams, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, Message,
  ParseMode, ReplyKeyboardMarkup, ReplyMarkup, SendMessageParams, UpdateContent,
};
use newsgpt_backend::{ChatCompletionClient, Config, NewsApiFeed};
use newsgpt_lesson::{
  orchestrator::RESTART_BUTTON, DeliveryItem, LessonDelivery, Level, RenderMode, ReplyTarget,
  Tutor,
};

use tokio::sync::mpsc::{self, error::SendError, UnboundedSender};

mod markdown;

const RESTART_CALLBACK: &str = "new_article";
const FETCHING_NEW_ARTICLE: &str = "Fetching a new article...";

/// Feeds each user's updates to one worker task, so a user's events are
/// handled and answered in arrival order while users proceed in parallel.
struct UserQueues<T, H> {
  handler: H,
  queues: HashMap<u64, UnboundedSender<T>>,
}

impl<T, H, Fut> UserQueues<T, H>
where
  T: Send + 'static,
  H: Fn(T) -> Fut + Clone + Send + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  fn new(handler: H) -> Self {
    UserQueues {
      handler,
      queues: HashMap::new(),
    }
  }

  fn push(&mut self, user_id: u64, item: T) {
    let handler = &self.handler;
    let queue = self
      .queues
      .entry(user_id)
      .or_insert_with(|| spawn_worker(handler.clone()));

    if let Err(SendError(item)) = queue.send(item) {
      log::warn!("Worker for user {user_id} stopped, starting a new one");
      let fresh = spawn_worker(handler.clone());
      if fresh.send(item).is_err() {
        log::warn!("Dropping update for user {user_id}");
      }
      *queue = fresh;
    }
  }
}

fn spawn_worker<T, H, Fut>(handler: H) -> UnboundedSender<T>
where
  T: Send + 'static,
  H: Fn(T) -> Fut + Send + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  let (queue, mut items) = mpsc::unbounded_channel();
  tokio::spawn(async move {
    while let Some(item) = items.recv().await {
      handler(item).await;
    }
  });
  queue
}

struct Bot {
  tutor: Tutor<ChatCompletionClient, NewsApiFeed>,
  api: AsyncApi,
}

impl Bot {
  fn new(api_token: &str, config: &Config) -> Result<Bot> {
    Ok(Bot {
      tutor: config
        .build_tutor()
        .with_context(|| "Unable to build lesson pipeline")?,
      api: AsyncApi::new(api_token),
    })
  }

  pub async fn run_bot_loop(bot_ref: Arc<Bot>) {
    let update_params_builder = GetUpdatesParams::builder();
    let mut update_params = update_params_builder.clone().build();

    let handler_bot = bot_ref.clone();
    let mut workers = UserQueues::new(move |content: UpdateContent| {
      let bot = handler_bot.clone();
      async move { bot.process_update(content).await }
    });

    loop {
      let result = bot_ref.api.get_updates(&update_params).await;

      match result {
        Ok(response) => {
          log::debug!("Response is {:?}", response);

          for update in response.result.iter() {
            let content = update.content.clone();
            match sender(&content) {
              Some(user_id) => workers.push(user_id, content),
              None => log::debug!("Event without sender {:?}", content),
            }
          }

          let last_update = response.result.iter().last();

          update_params = match last_update {
            Some(update) => update_params_builder
              .clone()
              .offset(update.update_id + 1)
              .build(),
            None => update_params,
          }
        }

        Err(error) => {
          log::warn!("Failed to get updates: {error:?}");
        }
      }
    }
  }

  async fn process_update(&self, content: UpdateContent) {
    match content {
      UpdateContent::Message(message) if message.text.is_some() => {
        self.process_message(message).await
      }
      UpdateContent::CallbackQuery(query) => self.process_callback(query).await,
      other => log::debug!("Non message event {:?}", other),
    }
  }

  async fn process_message(&self, message: Message) {
    let Some(user_id) = message.from.as_ref().map(|user| user.id) else {
      log::debug!("Message without sender {:?}", message);
      return;
    };
    let chat_id = message.chat.id;
    let target = Some(ReplyTarget(chat_id));
    let text = message.text.clone().unwrap_or_default();

    log::debug!("Processing {:?} from {user_id}", text);

    let delivery = match command(&text) {
      Some("start") => self.tutor.on_start(user_id, target).await,
      Some("cancel") => self.tutor.on_cancel(user_id, target).await,
      Some(other) => {
        log::debug!("Ignoring unknown command /{other}");
        return;
      }
      None => {
        let selection = self.tutor.on_level_selected(user_id, &text, target).await;
        self.deliver(chat_id, selection.reply).await;
        match selection.lesson {
          Some(lesson) => lesson.run().await,
          None => return,
        }
      }
    };

    self.deliver(chat_id, delivery).await;
  }

  async fn process_callback(&self, query: CallbackQuery) {
    if query.data.as_deref() != Some(RESTART_CALLBACK) {
      log::debug!("Ignoring callback {:?}", query.data);
      return;
    }

    let answer = AnswerCallbackQueryParams::builder()
      .callback_query_id(query.id.clone())
      .build();
    if let Err(err) = self.api.answer_callback_query(&answer).await {
      log::warn!("Failed to answer callback: {err:?}");
    }

    let target = match &query.message {
      Some(message) => {
        let edit = EditMessageTextParams::builder()
          .chat_id(message.chat.id)
          .message_id(message.message_id)
          .text(FETCHING_NEW_ARTICLE)
          .build();
        if let Err(err) = self.api.edit_message_text(&edit).await {
          log::warn!("Failed to edit message: {err:?}");
        }
        Some(ReplyTarget(message.chat.id))
      }
      None => None,
    };

    let delivery = self.tutor.on_restart(query.from.id, target).await;

    // Without a message to answer, the sender's private chat gets the notice.
    let fallback_chat = match i64::try_from(query.from.id) {
      Ok(chat_id) => chat_id,
      Err(err) => {
        log::warn!("Cannot address user {}: {err}", query.from.id);
        return;
      }
    };
    self.deliver(fallback_chat, delivery).await;
  }

  async fn deliver(&self, fallback_chat: i64, delivery: LessonDelivery) {
    let chat_id = delivery
      .target
      .map(|ReplyTarget(chat_id)| chat_id)
      .unwrap_or(fallback_chat);

    for item in &delivery.items {
      let message = render(chat_id, item);
      log::debug!("Sending message: {:?}", message);
      if let Err(err) = self.api.send_message(&message).await {
        log::warn!("Failed to send message: {err:?}");
      }
    }
  }
}

fn sender(content: &UpdateContent) -> Option<u64> {
  match content {
    UpdateContent::Message(message) => message.from.as_ref().map(|user| user.id),
    UpdateContent::CallbackQuery(query) => Some(query.from.id),
    _ => None,
  }
}

/// Name of a bot command such as `/start` or `/start@some_bot`.
fn command(text: &str) -> Option<&str> {
  let word = text.split_whitespace().next()?;
  let name = word.strip_prefix('/')?;
  Some(name.split_once('@').map_or(name, |(name, _)| name))
}

fn render(chat_id: i64, item: &DeliveryItem) -> SendMessageParams {
  match item.mode {
    RenderMode::Plain => SendMessageParams::builder()
      .chat_id(chat_id)
      .text(item.content.clone())
      .build(),
    RenderMode::Concealed => SendMessageParams::builder()
      .chat_id(chat_id)
      .text(markdown::spoiler(&item.content))
      .parse_mode(ParseMode::MarkdownV2)
      .build(),
    RenderMode::LevelChoice => {
      let buttons = Level::ALL
        .iter()
        .map(|level| KeyboardButton::builder().text(level.as_str()).build())
        .collect::<Vec<_>>();
      let keyboard = ReplyKeyboardMarkup::builder()
        .keyboard(vec![buttons])
        .one_time_keyboard(true)
        .resize_keyboard(true)
        .build();
      SendMessageParams::builder()
        .chat_id(chat_id)
        .text(item.content.clone())
        .reply_markup(ReplyMarkup::ReplyKeyboardMarkup(keyboard))
        .build()
    }
    RenderMode::RestartAction => {
      let button = InlineKeyboardButton::builder()
        .text(RESTART_BUTTON)
        .callback_data(RESTART_CALLBACK)
        .build();
      let keyboard = InlineKeyboardMarkup::builder()
        .inline_keyboard(vec![vec![button]])
        .build();
      SendMessageParams::builder()
        .chat_id(chat_id)
        .text(item.content.clone())
        .reply_markup(ReplyMarkup::InlineKeyboardMarkup(keyboard))
        .build()
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  env_logger::init();

  let api_token = std::env::var("BOT_TOKEN")
    .with_context(|| "BOT_TOKEN not set to telegram API token, please configure")?;

  let config = Config::from_env().with_context(|| "Unable to read configuration")?;
  log::info!(
    "Starting bot, completions at {}, explanations in {}",
    config.llm_api_url,
    config.native_language
  );

  let bot = Bot::new(&api_token, &config).with_context(|| "Unable to initialize Bot")?;

  Bot::run_bot_loop(Arc::new(bot)).await;

  Ok(())
}

#[cfg(test)]
mod tests {
  use newsgpt_lesson::orchestrator::RESTART_PROMPT;

  use super::*;

  #[tokio::test]
  async fn updates_of_one_user_run_in_order() {
    let (done, mut finished) = mpsc::unbounded_channel();
    let mut workers = UserQueues::new(move |(name, delay_ms): (&'static str, u64)| {
      let done = done.clone();
      async move {
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        done.send(name).unwrap();
      }
    });

    workers.push(1, ("start", 50));
    workers.push(1, ("beginner", 0));
    workers.push(2, ("other user", 0));

    let mut order = vec![];
    for _ in 0..3 {
      order.push(finished.recv().await.unwrap());
    }
    assert_eq!(order, vec!["other user", "start", "beginner"]);
  }

  #[test]
  fn commands_are_recognised() {
    assert_eq!(command("/start"), Some("start"));
    assert_eq!(command("/cancel@news_coach_bot"), Some("cancel"));
    assert_eq!(command("  /start now"), Some("start"));
    assert_eq!(command("beginner"), None);
    assert_eq!(command(""), None);
  }

  #[test]
  fn plain_items_are_sent_verbatim() {
    let message = render(5, &DeliveryItem::plain("Adapted news text:\n\n(Hi!)"));
    assert_eq!(message.text, "Adapted news text:\n\n(Hi!)");
    assert!(message.parse_mode.is_none());
    assert!(message.reply_markup.is_none());
  }

  #[test]
  fn concealed_items_become_escaped_spoilers() {
    let message = render(5, &DeliveryItem::concealed("1) went."));
    assert_eq!(message.text, "||1\\) went\\.||");
    assert!(matches!(message.parse_mode, Some(ParseMode::MarkdownV2)));
  }

  #[test]
  fn level_choice_offers_a_keyboard() {
    let message = render(5, &DeliveryItem::level_choice("Choose"));
    match message.reply_markup {
      Some(ReplyMarkup::ReplyKeyboardMarkup(keyboard)) => {
        let labels = keyboard.keyboard[0]
          .iter()
          .map(|button| button.text.clone())
          .collect::<Vec<_>>();
        assert_eq!(labels, vec!["beginner", "intermediate", "advanced"]);
      }
      other => panic!("unexpected markup {other:?}"),
    }
  }

  #[test]
  fn restart_action_carries_callback_button() {
    let message = render(5, &DeliveryItem::restart_action(RESTART_PROMPT));
    assert_eq!(message.text, RESTART_PROMPT);
    match message.reply_markup {
      Some(ReplyMarkup::InlineKeyboardMarkup(keyboard)) => {
        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(button.text, RESTART_BUTTON);
        assert_eq!(button.callback_data.as_deref(), Some(RESTART_CALLBACK));
      }
      other => panic!("unexpected markup {other:?}"),
    }
  }
}
