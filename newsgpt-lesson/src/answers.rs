use std::sync::LazyLock;

use regex::Regex;

static ANSWER_HEADING: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)answers:").expect("answer heading pattern is valid"));

static LEADING_HEADING: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)^answers:\s*").expect("leading heading pattern is valid"));

static NUMBER_MARKER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*\d+[).]?\s").expect("number marker pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseSheet {
  pub exercises: String,
  pub answers: String,
}

/// Splits a generated exercise sheet at the first `Answers:` heading.
///
/// Everything before the heading is the exercise block. The answer block has
/// the heading and the whitespace after it removed. Without a heading the
/// whole text is the exercise block and the answer block is empty.
pub fn split_answer_key(text: &str) -> ExerciseSheet {
  match ANSWER_HEADING.find(text) {
    Some(heading) => {
      let exercises = text[..heading.start()].trim().to_string();
      let tail = text[heading.start()..].trim();
      let answers = LEADING_HEADING.replace(tail, "").trim().to_string();
      ExerciseSheet { exercises, answers }
    }
    None => ExerciseSheet {
      exercises: text.trim().to_string(),
      answers: String::new(),
    },
  }
}

/// Cuts an answer block into one unit per numbered item.
///
/// A line starting with `1)`, `2.` or a bare number followed by whitespace
/// opens a unit; following lines are continuations of it. Lines ahead of the
/// first numbered item become units of their own. When no line is numbered
/// every non-blank line becomes a unit.
pub fn segment_answers(block: &str) -> Vec<String> {
  let mut units: Vec<Vec<&str>> = vec![];
  let mut saw_marker = false;

  for line in block.lines() {
    let line = line.trim_end();
    if line.trim().is_empty() {
      continue;
    }

    if NUMBER_MARKER.is_match(line) {
      saw_marker = true;
      units.push(vec![line.trim_start()]);
    } else {
      match units.last_mut() {
        Some(unit) if saw_marker => unit.push(line),
        _ => units.push(vec![line.trim_start()]),
      }
    }
  }

  if !saw_marker {
    return block
      .trim()
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();
  }

  units
    .into_iter()
    .map(|lines| lines.join("\n").trim().to_string())
    .filter(|unit| !unit.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn non_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
  }

  #[test]
  fn splits_at_heading() {
    let sheet = split_answer_key("...exercises...\n\nAnswers:\n1) A");
    assert_eq!(sheet.exercises, "...exercises...");
    assert_eq!(sheet.answers, "1) A");
  }

  #[test]
  fn heading_match_ignores_case() {
    let sheet = split_answer_key("1) Pick one.\nANSWERS:   \n\n1) B\n");
    assert_eq!(sheet.exercises, "1) Pick one.");
    assert_eq!(sheet.answers, "1) B");
  }

  #[test]
  fn first_heading_wins() {
    let sheet = split_answer_key("Q1\nAnswers: 1) A\nanswers: again");
    assert_eq!(sheet.exercises, "Q1");
    assert_eq!(sheet.answers, "1) A\nanswers: again");
  }

  #[test]
  fn missing_heading_keeps_whole_text() {
    let sheet = split_answer_key("  1) Fill the gap.\n2) Choose.  ");
    assert_eq!(sheet.exercises, "1) Fill the gap.\n2) Choose.");
    assert_eq!(sheet.answers, "");
  }

  #[test]
  fn heading_without_answers_yields_empty_key() {
    let sheet = split_answer_key("1) Fill the gap.\n\nAnswers:\n\n");
    assert_eq!(sheet.answers, "");
    assert!(segment_answers(&sheet.answers).is_empty());
  }

  #[test]
  fn segments_numbered_answers_with_continuations() {
    let units = segment_answers("1) cat\n2) dog\nextra line\n3. fish");
    assert_eq!(units, vec!["1) cat", "2) dog\nextra line", "3. fish"]);
  }

  #[test]
  fn single_unit_is_returned_unchanged() {
    assert_eq!(segment_answers("1) cat"), vec!["1) cat"]);
    assert_eq!(
      segment_answers("2) dog\nextra line"),
      vec!["2) dog\nextra line"]
    );
    assert_eq!(segment_answers("The answer is B"), vec!["The answer is B"]);
  }

  #[test]
  fn bare_numbers_open_units() {
    let units = segment_answers("1 went\n2 gone");
    assert_eq!(units, vec!["1 went", "2 gone"]);
  }

  #[test]
  fn falls_back_to_lines_without_markers() {
    let units = segment_answers("a) went\n\n  b) gone  \n");
    assert_eq!(units, vec!["a) went", "b) gone"]);
  }

  #[test]
  fn blank_lines_never_become_units() {
    let units = segment_answers("\n\n1) went\n\n   \n2) gone\n\n");
    assert_eq!(units, vec!["1) went", "2) gone"]);
    assert!(segment_answers("   \n\n").is_empty());
    assert!(segment_answers("").is_empty());
  }

  #[test]
  fn text_before_first_marker_is_kept() {
    let units = segment_answers("Here you go:\n1) went\n2) gone");
    assert_eq!(units, vec!["Here you go:", "1) went", "2) gone"]);
  }

  #[test]
  fn indented_markers_are_recognised() {
    let units = segment_answers("  1. went\n     because past tense\n  2. gone");
    assert_eq!(
      units,
      vec!["1. went\n     because past tense", "2. gone"]
    );
  }

  #[test]
  fn marker_needs_trailing_whitespace() {
    let units = segment_answers("1) went\n2)gone");
    assert_eq!(units, vec!["1) went\n2)gone"]);
  }

  #[test]
  fn segmentation_preserves_every_visible_character() {
    let inputs = [
      "1) cat\n2) dog\nextra line\n3. fish",
      "Intro\n\n1. a\n   b\n\n2) c\n",
      "no markers here\nat all\n\n",
      "  10) ten\n11. eleven\n  tail\n",
    ];
    for input in inputs {
      let units = segment_answers(input);
      assert!(units.iter().all(|unit| !unit.trim().is_empty()));
      assert_eq!(non_whitespace(&units.concat()), non_whitespace(input));
    }
  }
}
