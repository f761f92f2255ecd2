//! MarkdownV2 escaping for text placed inside spoilers.

/// Characters Telegram treats as markup in MarkdownV2.
const SPECIAL_CHARS: &[char] = &[
  '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes every MarkdownV2 special character, code spans included, so the
/// text renders literally.
pub fn escape_markdown_v2(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len() * 2);
  for ch in text.chars() {
    if SPECIAL_CHARS.contains(&ch) {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped
}

/// Wraps escaped text in a spoiler that the reader taps to reveal.
pub fn spoiler(text: &str) -> String {
  format!("||{}||", escape_markdown_v2(text))
}
