//! Conversation log: chat turns, link segmentation and terminal-safe text.
//!
//! Assistant text may embed markdown links of the form `[label](url)`; these
//! are split out into [`Segment::Link`] while the surrounding text is kept
//! verbatim and in order. Anything shown on the terminal goes through
//! [`sanitize`] first, since reply text comes from a remote model.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use time::OffsetDateTime;

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub sender: Sender,
    pub text: String,
    pub at: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            at: now_iso(),
        }
    }
}

pub fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Link { label: &'a str, url: &'a str },
}

pub fn parse_links(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0usize;
    for caps in LINK_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(&text[last..whole.start()]));
        }
        segments.push(Segment::Link {
            label: caps.get(1).map_or("", |m| m.as_str()),
            url: caps.get(2).map_or("", |m| m.as_str()),
        });
        last = whole.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
    segments
}

/// Drops C0/C1 control characters (ESC, BEL, CSI...) so text cannot drive
/// the terminal. Tabs become a space; newlines are kept for the caller to split.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| c.is_control() && c != '\n') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .filter_map(|c| match c {
                '\n' => Some('\n'),
                '\t' => Some(' '),
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect(),
    )
}

/// Only web links are handed to the system opener.
pub fn is_web_link(url: &str) -> bool {
    let url = url.trim();
    (url.starts_with("https://") || url.starts_with("http://"))
        && !url.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// Every link in the assistant's turns, oldest first. The 1-based position is
/// the number shown next to the link and accepted by `/open`.
pub fn transcript_links(turns: &[ChatTurn]) -> Vec<&str> {
    turns
        .iter()
        .filter(|t| t.sender == Sender::Assistant)
        .flat_map(|t| parse_links(&t.text))
        .filter_map(|seg| match seg {
            Segment::Link { url, .. } => Some(url),
            Segment::Text(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_around_a_link() {
        let segs = parse_links("Buy this [Lamp](http://x/y) today");
        assert_eq!(
            segs,
            vec![
                Segment::Text("Buy this "),
                Segment::Link { label: "Lamp", url: "http://x/y" },
                Segment::Text(" today"),
            ]
        );
    }

    #[test]
    fn keeps_adjacent_links_in_order() {
        let segs = parse_links("[A](u1)[B](u2), and [C](u3)");
        assert_eq!(
            segs,
            vec![
                Segment::Link { label: "A", url: "u1" },
                Segment::Link { label: "B", url: "u2" },
                Segment::Text(", and "),
                Segment::Link { label: "C", url: "u3" },
            ]
        );
    }

    #[test]
    fn plain_and_malformed_text_is_verbatim() {
        assert_eq!(parse_links("no links"), vec![Segment::Text("no links")]);
        assert_eq!(parse_links("[](x) [y]( z"), vec![Segment::Text("[](x) [y]( z")]);
        assert!(parse_links("").is_empty());
    }

    #[test]
    fn strips_escape_sequences_from_model_text() {
        let clean = sanitize("hi\x1b]0;pwned\x07 [x](http://a\x1b\\evil)\u{9b}2J");
        assert!(!clean.chars().any(|c| c.is_control()));
        assert_eq!(clean, "hi]0;pwned [x](http://a\\evil)2J");
        assert!(matches!(sanitize("plain [Lamp](https://x)"), Cow::Borrowed(_)));
        assert_eq!(sanitize("two\nlines\tok"), "two\nlines ok");
    }

    #[test]
    fn only_web_links_are_openable() {
        assert!(is_web_link("https://shop/rug"));
        assert!(is_web_link(" http://x/y "));
        assert!(!is_web_link("file:///etc/passwd"));
        assert!(!is_web_link("javascript:alert(1)"));
        assert!(!is_web_link("https://a\x1b]0;x"));
        assert!(!is_web_link("https://a b"));
    }

    #[test]
    fn collects_assistant_links_in_order() {
        let turns = vec![
            ChatTurn::assistant("Try [Rug](https://r) or [Lamp](https://l)"),
            ChatTurn::user("what about [mine](https://u)"),
            ChatTurn::assistant("Here: [Sofa](https://s)"),
        ];
        assert_eq!(transcript_links(&turns), vec!["https://r", "https://l", "https://s"]);
    }

    #[test]
    fn turns_carry_a_timestamp() {
        let turn = ChatTurn::user("make it [blue](x)");
        assert_eq!(turn.sender, Sender::User);
        assert!(!turn.at.is_empty());
    }
}
