use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::dates::parse_iso_date;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(\[,])(#[\w/\-]+)").unwrap());

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(\[,])(@[\w/\-]+(?:\([^)]*\))?)").unwrap());

/// All `#hashtags` in `text`, in order, duplicates dropped.
/// Purely numeric tokens (`#3`) and markdown headings are not hashtags.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for caps in HASHTAG_RE.captures_iter(text) {
        let tag = caps[1].trim_end_matches(['-', '/']);
        let body = &tag[1..];
        if body.is_empty() || body.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// All `@mentions` in `text`, payload included (`@due(2025-01-01)`), in
/// order, duplicates dropped. Email addresses are not mentions.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    for caps in MENTION_RE.captures_iter(text) {
        let mention = &caps[1];
        if mention.len() < 2 {
            continue;
        }
        if !mentions.iter().any(|m| m == mention) {
            mentions.push(mention.to_string());
        }
    }
    mentions
}

/// Payload of the first mention exactly matching `token`, e.g.
/// `@review(2w)` → `2w`. The token match is case-sensitive.
pub fn mention_value<'a>(mentions: &'a [String], token: &str) -> Option<&'a str> {
    mentions.iter().find_map(|m| {
        let rest = m.strip_prefix(token)?;
        let payload = rest.strip_prefix('(')?.strip_suffix(')')?;
        Some(payload.trim())
    })
}

/// Date payload of the mention `token`, if present and a valid ISO date
pub fn mention_date(mentions: &[String], token: &str) -> Option<NaiveDate> {
    mention_value(mentions, token).and_then(parse_iso_date)
}

/// Split a metadata line into its whitespace-separated `@` tokens. Used when
/// a note-level mention list isn't available.
pub fn split_metadata_mentions(line: &str) -> Vec<String> {
    line.split_whitespace()
        .filter(|w| w.starts_with('@') && w.len() > 1)
        .map(|w| w.trim_end_matches([',', ';']).to_string())
        .collect()
}

fn mention_pattern(token: &str) -> Regex {
    Regex::new(&format!(r"(^|\s){}\([^)]*\)", regex::escape(token)))
        .expect("escaped mention token is a valid pattern")
}

fn hashtag_pattern(tag: &str) -> Regex {
    Regex::new(&format!(r"(^|\s){}(\s|$)", regex::escape(tag)))
        .expect("escaped hashtag is a valid pattern")
}

/// Set `token(value)` on a metadata line: replaces an existing payload, or
/// appends the mention if the line doesn't have one.
pub fn set_mention(line: &str, token: &str, value: &str) -> String {
    let re = mention_pattern(token);
    let replacement = format!("{}({})", token, value);
    if re.is_match(line) {
        re.replace(line, |caps: &regex::Captures| format!("{}{}", &caps[1], replacement))
            .into_owned()
    } else {
        append_token(line, &replacement)
    }
}

/// Remove every `token(...)` from a metadata line
pub fn remove_mention(line: &str, token: &str) -> String {
    let re = mention_pattern(token);
    collapse_spaces(&re.replace_all(line, "$1"))
}

/// Whether `line` carries `token(...)`
pub fn has_mention(line: &str, token: &str) -> bool {
    mention_pattern(token).is_match(line)
}

/// Whether `line` carries the hashtag `tag` as a whole word
pub fn line_has_hashtag(line: &str, tag: &str) -> bool {
    hashtag_pattern(tag).is_match(line)
}

/// Add a hashtag to a metadata line unless it's already there
pub fn add_hashtag(line: &str, tag: &str) -> String {
    if hashtag_pattern(tag).is_match(line) {
        line.to_string()
    } else {
        append_token(line, tag)
    }
}

/// Remove a hashtag from a metadata line
pub fn remove_hashtag(line: &str, tag: &str) -> String {
    let re = hashtag_pattern(tag);
    let mut out = line.to_string();
    // Adjacent occurrences share whitespace, so repeat until stable
    while re.is_match(&out) {
        out = re.replace_all(&out, "$1$2").into_owned();
    }
    collapse_spaces(&out)
}

fn append_token(line: &str, token: &str) -> String {
    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        token.to_string()
    } else {
        format!("{} {}", trimmed, token)
    }
}

fn collapse_spaces(s: &str) -> String {
    let leading: String = s.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
    let body = s.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{}{}", leading, body)
}
