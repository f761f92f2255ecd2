//! Lesson pipeline: fetch a headline, adapt it to the learner's level,
//! explain it, and build exercises with individually concealed answers.

pub mod answers;
pub mod delivery;
pub mod orchestrator;
pub mod session;
pub mod stages;
pub mod tutor;

#[cfg(test)]
mod testing;

pub use newsgpt_interface::Level;

pub use answers::{segment_answers, split_answer_key, ExerciseSheet};
pub use delivery::{DeliveryItem, LessonDelivery, RenderMode, ReplyTarget};
pub use orchestrator::{FailurePolicy, LessonBundle, LessonOrchestrator, PipelineStage};
pub use session::{InMemorySessionStore, Session, SessionId, SessionState, SessionStore};
pub use stages::{StageFailure, NO_NEWS_PLACEHOLDER};
pub use tutor::{LevelSelection, PendingLesson, Tutor};
