/// Chat that lesson messages are addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyTarget(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
  Plain,
  /// Hidden until the reader reveals it.
  Concealed,
  /// Asks for a level; offers one choice per level.
  LevelChoice,
  /// Carries the "get another article" control.
  RestartAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryItem {
  pub content: String,
  pub mode: RenderMode,
}

impl DeliveryItem {
  pub fn plain(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      mode: RenderMode::Plain,
    }
  }

  pub fn concealed(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      mode: RenderMode::Concealed,
    }
  }

  pub fn level_choice(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      mode: RenderMode::LevelChoice,
    }
  }

  pub fn restart_action(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      mode: RenderMode::RestartAction,
    }
  }
}

/// Messages to send, in order. `target` is `None` when the triggering event
/// had nothing to reply to; transports then fall back to the sender's chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonDelivery {
  pub target: Option<ReplyTarget>,
  pub items: Vec<DeliveryItem>,
}

impl LessonDelivery {
  pub fn new(target: Option<ReplyTarget>) -> Self {
    Self {
      target,
      items: vec![],
    }
  }

  pub fn push(&mut self, item: DeliveryItem) {
    self.items.push(item);
  }
}
