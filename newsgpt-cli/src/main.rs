use std::io::Write;

use anyhow::{Context, Result};
use newsgpt_backend::Config;
use newsgpt_lesson::{LessonDelivery, Level, RenderMode, ReplyTarget};
use tokio::io::{AsyncBufReadExt, BufReader};

const SESSION: u64 = 0;
const TARGET: Option<ReplyTarget> = Some(ReplyTarget(0));

enum Input<'a> {
  Start,
  Restart,
  Reveal,
  Quit,
  Text(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
  match line.trim() {
    "/start" => Input::Start,
    "new" | "/new" => Input::Restart,
    "show" | "/show" => Input::Reveal,
    "quit" | "/cancel" => Input::Quit,
    text => Input::Text(text),
  }
}

/// Prints a delivery, holding concealed answers back in `hidden`.
fn print_delivery(delivery: &LessonDelivery, hidden: &mut Vec<String>) {
  for item in &delivery.items {
    match item.mode {
      RenderMode::Plain => println!("{}\n", item.content),
      RenderMode::Concealed => {
        hidden.push(item.content.clone());
        println!("[answer {} hidden, type `show` to reveal]\n", hidden.len());
      }
      RenderMode::LevelChoice => {
        let levels = Level::ALL.map(|level| level.as_str()).join(" / ");
        println!("{}\n({levels})\n", item.content);
      }
      RenderMode::RestartAction => println!("{}\n[type `new`]\n", item.content),
    }
  }
}

fn prompt() -> Result<()> {
  print!("> ");
  std::io::stdout().flush()?;
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  env_logger::init();

  let config = Config::from_env().with_context(|| "Unable to read configuration")?;
  let tutor = config
    .build_tutor()
    .with_context(|| "Unable to build lesson pipeline")?;

  let mut hidden: Vec<String> = vec![];
  print_delivery(&tutor.on_start(SESSION, TARGET).await, &mut hidden);
  prompt()?;

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  while let Some(line) = lines.next_line().await? {
    let delivery = match parse_input(&line) {
      Input::Start => tutor.on_start(SESSION, TARGET).await,
      Input::Restart => {
        hidden.clear();
        tutor.on_restart(SESSION, TARGET).await
      }
      Input::Reveal => {
        for (number, answer) in hidden.iter().enumerate() {
          println!("answer {}: {answer}\n", number + 1);
        }
        LessonDelivery::default()
      }
      Input::Quit => {
        print_delivery(&tutor.on_cancel(SESSION, TARGET).await, &mut hidden);
        break;
      }
      Input::Text(text) => {
        let selection = tutor.on_level_selected(SESSION, text, TARGET).await;
        print_delivery(&selection.reply, &mut hidden);
        match selection.lesson {
          Some(lesson) => lesson.run().await,
          None => LessonDelivery::default(),
        }
      }
    };
    print_delivery(&delivery, &mut hidden);
    prompt()?;
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use newsgpt_lesson::DeliveryItem;

  use super::*;

  #[test]
  fn inputs_map_to_events() {
    assert!(matches!(parse_input("/start"), Input::Start));
    assert!(matches!(parse_input(" new "), Input::Restart));
    assert!(matches!(parse_input("show"), Input::Reveal));
    assert!(matches!(parse_input("quit"), Input::Quit));
    assert!(matches!(parse_input(" Beginner "), Input::Text("Beginner")));
  }

  #[test]
  fn concealed_answers_are_held_back() {
    let delivery = LessonDelivery {
      target: TARGET,
      items: vec![
        DeliveryItem::plain("Exercises"),
        DeliveryItem::concealed("1) went"),
        DeliveryItem::concealed("2) gone"),
      ],
    };
    let mut hidden = vec![];
    print_delivery(&delivery, &mut hidden);
    assert_eq!(hidden, vec!["1) went", "2) gone"]);
  }
}
