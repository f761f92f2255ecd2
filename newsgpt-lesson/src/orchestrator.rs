use std::{fmt, str::FromStr};

use newsgpt_interface::{CompletionService, Level, NewsFeed};
use thiserror::Error;

use crate::{
  answers::{segment_answers, ExerciseSheet},
  delivery::{DeliveryItem, LessonDelivery, ReplyTarget},
  stages::{adapt, explain, fetch_article, generate_exercises, StageFailure},
};

pub const CANNOT_PROCESS: &str = "Cannot process the request.";
pub const NO_ANSWERS: &str = "No answers were provided.";
pub const RESTART_PROMPT: &str = "You can get another article with the button below.";
pub const RESTART_BUTTON: &str = "Get another article";

const ADAPTED_LABEL: &str = "Adapted news text:";
const GRAMMAR_LABEL: &str = "Grammar and idioms explained:";
const EXERCISES_LABEL: &str = "Exercises based on the news:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
  Fetching,
  Adapting,
  Explaining,
  Exercising,
  Delivering,
  Done,
}

impl fmt::Display for PipelineStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PipelineStage::Fetching => "fetching",
      PipelineStage::Adapting => "adapting",
      PipelineStage::Explaining => "explaining",
      PipelineStage::Exercising => "exercising",
      PipelineStage::Delivering => "delivering",
      PipelineStage::Done => "done",
    };
    f.write_str(name)
  }
}

/// What a pass does when a completion stage fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
  /// Use the error text in place of the stage output and keep going. Later
  /// prompts are then built from that text.
  #[default]
  Continue,
  /// Deliver the error text and stop the pass.
  Abort,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown failure policy {0:?}, expected `continue` or `abort`")]
pub struct UnknownPolicy(pub String);

impl FromStr for FailurePolicy {
  type Err = UnknownPolicy;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "continue" => Ok(FailurePolicy::Continue),
      "abort" => Ok(FailurePolicy::Abort),
      _ => Err(UnknownPolicy(s.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonBundle {
  pub adapted_text: String,
  pub grammar_explanation: String,
  pub exercises: String,
  pub answers: Vec<String>,
}

impl LessonBundle {
  fn into_delivery(self, target: ReplyTarget) -> LessonDelivery {
    let mut delivery = LessonDelivery::new(Some(target));
    delivery.push(DeliveryItem::plain(labeled(ADAPTED_LABEL, &self.adapted_text)));
    delivery.push(DeliveryItem::plain(labeled(
      GRAMMAR_LABEL,
      &self.grammar_explanation,
    )));
    delivery.push(DeliveryItem::plain(labeled(EXERCISES_LABEL, &self.exercises)));

    if self.answers.is_empty() {
      delivery.push(DeliveryItem::plain(NO_ANSWERS));
    } else {
      for answer in self.answers {
        delivery.push(DeliveryItem::concealed(answer));
      }
    }

    delivery.push(DeliveryItem::restart_action(RESTART_PROMPT));
    delivery
  }
}

fn labeled(label: &str, body: &str) -> String {
  format!("{label}\n\n{body}")
}

/// Error text of a stage that stopped the pass under [`FailurePolicy::Abort`].
struct Halted(String);

pub struct LessonOrchestrator<C: CompletionService, F: NewsFeed> {
  completions: C,
  feed: F,
  native_language: String,
  policy: FailurePolicy,
}

impl<C: CompletionService, F: NewsFeed> LessonOrchestrator<C, F> {
  pub fn new(completions: C, feed: F) -> Self {
    LessonOrchestrator {
      completions,
      feed,
      native_language: "Russian".to_string(),
      policy: FailurePolicy::default(),
    }
  }

  pub fn with_native_language(mut self, language: impl Into<String>) -> Self {
    self.native_language = language.into();
    self
  }

  pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Runs one full lesson pass for `level`.
  ///
  /// Without a target nothing is fetched or generated and the delivery holds
  /// a single [`CANNOT_PROCESS`] notice.
  pub async fn run(&self, level: Level, target: Option<ReplyTarget>) -> LessonDelivery {
    let Some(target) = target else {
      log::warn!("No reply target for lesson, aborting pass");
      let mut delivery = LessonDelivery::new(None);
      delivery.push(DeliveryItem::plain(CANNOT_PROCESS));
      return delivery;
    };

    log::info!("Lesson stage {} (level {level})", PipelineStage::Fetching);
    let news = fetch_article(&self.feed).await;

    let delivery = match self.build_bundle(level, &news).await {
      Ok(bundle) => {
        log::info!("Lesson stage {}", PipelineStage::Delivering);
        bundle.into_delivery(target)
      }
      Err(Halted(text)) => {
        let mut delivery = LessonDelivery::new(Some(target));
        delivery.push(DeliveryItem::plain(text));
        delivery.push(DeliveryItem::restart_action(RESTART_PROMPT));
        delivery
      }
    };

    log::info!(
      "Lesson stage {} ({} items)",
      PipelineStage::Done,
      delivery.items.len()
    );
    delivery
  }

  async fn build_bundle(&self, level: Level, news: &str) -> Result<LessonBundle, Halted> {
    log::info!("Lesson stage {}", PipelineStage::Adapting);
    let adapted_text = self.settle(adapt(&self.completions, level, news).await)?;

    log::info!("Lesson stage {}", PipelineStage::Explaining);
    let grammar_explanation = self.settle(
      explain(&self.completions, &self.native_language, &adapted_text).await,
    )?;

    log::info!("Lesson stage {}", PipelineStage::Exercising);
    let sheet = match generate_exercises(&self.completions, &adapted_text).await {
      Ok(sheet) => sheet,
      Err(failure) => ExerciseSheet {
        exercises: self.settle(Err(failure))?,
        answers: String::new(),
      },
    };

    Ok(LessonBundle {
      adapted_text,
      grammar_explanation,
      exercises: sheet.exercises,
      answers: segment_answers(&sheet.answers),
    })
  }

  /// Turns a stage result into text the pass can carry on with, or stops
  /// the pass, depending on the policy.
  fn settle(&self, outcome: Result<String, StageFailure>) -> Result<String, Halted> {
    match outcome {
      Ok(text) => Ok(text),
      Err(failure) => {
        log::warn!("Stage {} failed: {failure}", failure.stage);
        match self.policy {
          FailurePolicy::Continue => Ok(failure.to_string()),
          FailurePolicy::Abort => Err(Halted(failure.to_string())),
        }
      }
    }
  }
}
