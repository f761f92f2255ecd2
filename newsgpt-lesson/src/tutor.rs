use newsgpt_interface::{CompletionService, Level, NewsFeed};
use tokio::sync::OwnedMutexGuard;

use crate::{
  delivery::{DeliveryItem, LessonDelivery, ReplyTarget},
  orchestrator::LessonOrchestrator,
  session::{InMemorySessionStore, Session, SessionId, SessionState, SessionStore},
};

pub const LEVEL_PROMPT: &str =
  "Hello! I am your language coach.\nPlease choose your English level:";
pub const LEVEL_REPROMPT: &str = "Please choose one of the offered levels.";
pub const FAREWELL: &str = "Goodbye!";

/// Outcome of a level message: the immediate reply, and the lesson it
/// unlocked if the level was accepted.
pub struct LevelSelection<'a, C: CompletionService, F: NewsFeed> {
  pub reply: LessonDelivery,
  pub lesson: Option<PendingLesson<'a, C, F>>,
}

impl<'a, C: CompletionService, F: NewsFeed> LevelSelection<'a, C, F> {
  fn reply_only(reply: LessonDelivery) -> Self {
    LevelSelection {
      reply,
      lesson: None,
    }
  }
}

/// A lesson pass that has been accepted but not run yet.
///
/// Holds the session lock until [`PendingLesson::run`] finishes, so the
/// confirmation can be sent before the pass without another event of the
/// same session getting in between.
pub struct PendingLesson<'a, C: CompletionService, F: NewsFeed> {
  orchestrator: &'a LessonOrchestrator<C, F>,
  level: Level,
  target: ReplyTarget,
  _session: OwnedMutexGuard<Session>,
}

impl<'a, C: CompletionService, F: NewsFeed> PendingLesson<'a, C, F> {
  pub async fn run(self) -> LessonDelivery {
    self.orchestrator.run(self.level, Some(self.target)).await
  }
}

/// The conversation front of the bot: asks for a level once, then runs
/// lessons on demand.
pub struct Tutor<C: CompletionService, F: NewsFeed, S: SessionStore = InMemorySessionStore> {
  orchestrator: LessonOrchestrator<C, F>,
  sessions: S,
}

impl<C: CompletionService, F: NewsFeed> Tutor<C, F> {
  pub fn new(orchestrator: LessonOrchestrator<C, F>) -> Self {
    Tutor::with_store(orchestrator, InMemorySessionStore::new())
  }
}

impl<C: CompletionService, F: NewsFeed, S: SessionStore> Tutor<C, F, S> {
  pub fn with_store(orchestrator: LessonOrchestrator<C, F>, sessions: S) -> Self {
    Tutor {
      orchestrator,
      sessions,
    }
  }

  pub fn sessions(&self) -> &S {
    &self.sessions
  }

  /// (Re)opens the conversation and asks for a level.
  pub async fn on_start(&self, id: SessionId, target: Option<ReplyTarget>) -> LessonDelivery {
    let session = self.sessions.session(id);
    let mut session = session.lock().await;
    session.state = SessionState::AwaitingLevel;
    log::info!("Session {id} awaiting level");

    let mut delivery = LessonDelivery::new(target);
    delivery.push(DeliveryItem::level_choice(LEVEL_PROMPT));
    delivery
  }

  /// Handles free text. While a level is awaited the text must name one;
  /// once the conversation is active text is ignored.
  ///
  /// An accepted level is confirmed in `reply` and the lesson is returned
  /// unstarted; callers send the reply, then run the lesson.
  pub async fn on_level_selected(
    &self,
    id: SessionId,
    text: &str,
    target: Option<ReplyTarget>,
  ) -> LevelSelection<'_, C, F> {
    let mut session = self.sessions.session(id).lock_owned().await;

    if session.state == SessionState::Active {
      log::debug!("Session {id} is active, ignoring {text:?}");
      return LevelSelection::reply_only(LessonDelivery::new(target));
    }

    let level = match text.parse::<Level>() {
      Ok(level) => level,
      Err(err) => {
        log::debug!("Session {id}: {err}");
        let mut reply = LessonDelivery::new(target);
        reply.push(DeliveryItem::level_choice(LEVEL_REPROMPT));
        return LevelSelection::reply_only(reply);
      }
    };

    // Nothing to reply to: the session stays as it was.
    let Some(reply_target) = target else {
      return LevelSelection::reply_only(self.orchestrator.run(level, None).await);
    };

    session.level = Some(level);
    session.state = SessionState::Active;
    log::info!("Session {id} picked level {level}");

    let mut reply = LessonDelivery::new(target);
    reply.push(DeliveryItem::plain(format!(
      "Your level: {level}. Fetching news..."
    )));
    LevelSelection {
      reply,
      lesson: Some(PendingLesson {
        orchestrator: &self.orchestrator,
        level,
        target: reply_target,
        _session: session,
      }),
    }
  }

  /// Runs another lesson with the stored level, leaving the conversation
  /// state alone. Sessions that never picked a level get
  /// [`Level::default`].
  pub async fn on_restart(&self, id: SessionId, target: Option<ReplyTarget>) -> LessonDelivery {
    let session = self.sessions.session(id);
    let session = session.lock().await;

    let level = session.level.unwrap_or_else(|| {
      log::info!("Session {id} restarted without a level, using {}", Level::default());
      Level::default()
    });

    self.orchestrator.run(level, target).await
  }

  /// Leaves the level prompt. A stored level is kept for later restarts.
  pub async fn on_cancel(&self, id: SessionId, target: Option<ReplyTarget>) -> LessonDelivery {
    let session = self.sessions.session(id);
    let mut session = session.lock().await;
    session.state = SessionState::Active;
    log::info!("Session {id} cancelled");

    let mut delivery = LessonDelivery::new(target);
    delivery.push(DeliveryItem::plain(FAREWELL));
    delivery
  }
}
