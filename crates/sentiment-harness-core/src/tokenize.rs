//! Word, sentence, and paragraph tokenizers.
//!
//! All three are pure functions over `&str` that return slices of the
//! input, so they allocate only the output vector and are safe to call
//! from any number of requests at once.
//!
//! # Words
//!
//! [`tokenize_words`] is tuned for informal text. Scanning left to right,
//! the first matching rule wins:
//!
//! 1. URLs (`http://`, `https://`, `www.`) up to the next whitespace, minus
//!    trailing sentence punctuation.
//! 2. Emoticons (`:)`, `:-(`, `<3`, `xD`, …).
//! 3. `@mentions` and `#hashtags`.
//! 4. Words: alphanumeric runs joined across internal apostrophes and
//!    hyphens (`don't`, `well-known`) and decimal separators (`3.5`).
//! 5. Runs of one repeated punctuation character (`!!!`, `...`).
//! 6. Any other single character.
//!
//! # Sentences
//!
//! [`sentence_spans`] partitions the input into contiguous byte ranges that
//! cover every character exactly once; each span ends after a terminator
//! run (`.`, `!`, `?`, plus closing quotes and brackets) and the whitespace
//! that follows it. A period does not end a sentence after a known
//! abbreviation or a single-letter initial, or when the next word starts
//! in lowercase. [`tokenize_sentences`] returns the trimmed spans.
//!
//! # Paragraphs
//!
//! [`tokenize_paragraphs`] splits on blank lines (lines containing only
//! whitespace) and trims each paragraph.

use std::ops::Range;

const EMOTICONS: &[&str] = &[
    ":-)", ":)", ":-(", ":(", ":-D", ":D", ";-)", ";)", ":-P", ":P", ":p", ":'(", ":-/", ":/",
    ":-|", ":|", "</3", "<3", "^_^", "=)", "=(", ":o", ":O", "xD", "XD",
];

const URL_PREFIXES: &[&str] = &["http://", "https://", "www."];

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd",
    "co", "corp", "dept", "est", "fig", "approx", "no", "mt", "jan", "feb", "mar", "apr", "jun",
    "jul", "aug", "sep", "sept", "oct", "nov", "dec", "u.s", "a.m", "p.m",
];

/// Split `text` into word-level tokens.
///
/// Never fails; empty or whitespace-only input yields an empty vector.
pub fn tokenize_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(c) = text[i..].chars().next() {
        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }

        let rest = &text[i..];
        let len = url_len(rest)
            .or_else(|| emoticon_len(rest))
            .or_else(|| handle_len(rest))
            .unwrap_or_else(|| {
                if c.is_alphanumeric() {
                    word_len(rest)
                } else {
                    repeated_len(rest, c)
                }
            });

        tokens.push(&text[i..i + len]);
        i += len;
    }

    tokens
}

/// True when `token` contains no letters or digits.
pub fn is_punctuation(token: &str) -> bool {
    !token.chars().any(char::is_alphanumeric)
}

/// Byte ranges of the sentences in `text`.
///
/// The ranges are contiguous and together cover the whole input.
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !is_terminator(ch) {
            continue;
        }

        let mut end = idx + ch.len_utf8();
        let mut periods = usize::from(ch == '.');
        while let Some(&(j, next)) = chars.peek() {
            if is_terminator(next) || is_closer(next) {
                if next == '.' {
                    periods += 1;
                }
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        // "3.5", "e.g.x", "U.S.A" – not followed by whitespace.
        if matches!(chars.peek(), Some(&(_, n)) if !n.is_whitespace()) {
            continue;
        }

        if ch == '.' && periods == 1 && ends_with_abbreviation(&text[start..idx]) {
            continue;
        }

        while let Some(&(j, next)) = chars.peek() {
            if next.is_whitespace() {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        if ch == '.' && matches!(chars.peek(), Some(&(_, n)) if n.is_lowercase()) {
            continue;
        }

        spans.push(start..end);
        start = end;
    }

    if start < text.len() {
        spans.push(start..text.len());
    }

    spans
}

/// Split `text` into trimmed, non-empty sentences.
pub fn tokenize_sentences(text: &str) -> Vec<&str> {
    sentence_spans(text)
        .into_iter()
        .map(|span| text[span].trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split `text` into trimmed paragraphs separated by blank lines.
pub fn tokenize_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut para_start: Option<usize> = None;
    let mut para_end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(s) = para_start.take() {
                paragraphs.push(text[s..para_end].trim());
            }
        } else {
            para_start.get_or_insert(line_start);
            para_end = offset;
        }
    }

    if let Some(s) = para_start {
        paragraphs.push(text[s..para_end].trim());
    }

    paragraphs
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | '\u{201d}' | '\u{2019}' | ')' | ']')
}

fn ends_with_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    if word.is_empty() {
        return false;
    }

    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return first.is_uppercase();
    }

    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn url_len(rest: &str) -> Option<usize> {
    if !URL_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_case(rest, prefix))
    {
        return None;
    }
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let trimmed = rest[..end].trim_end_matches(|c: char| {
        matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | ')' | '"' | '\'')
    });
    Some(trimmed.len())
}

fn emoticon_len(rest: &str) -> Option<usize> {
    EMOTICONS.iter().find_map(|emoticon| {
        if !rest.starts_with(emoticon) {
            return None;
        }
        let ends_alnum = emoticon.chars().last().is_some_and(char::is_alphanumeric);
        let runs_on = rest[emoticon.len()..]
            .chars()
            .next()
            .is_some_and(char::is_alphanumeric);
        if ends_alnum && runs_on {
            None
        } else {
            Some(emoticon.len())
        }
    })
}

fn handle_len(rest: &str) -> Option<usize> {
    let mut chars = rest.chars();
    if !matches!(chars.next(), Some('@' | '#')) {
        return None;
    }
    let body: usize = chars
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();
    (body > 0).then_some(1 + body)
}

fn word_len(rest: &str) -> usize {
    let mut chars = rest.char_indices().peekable();
    let mut end = 0;
    let mut prev = '\0';

    while let Some((idx, ch)) = chars.next() {
        if ch.is_alphanumeric() || ch == '_' {
            end = idx + ch.len_utf8();
            prev = ch;
            continue;
        }

        let next = chars.peek().map(|&(_, n)| n);
        let joins = match ch {
            '\'' | '\u{2019}' | '-' => next.is_some_and(char::is_alphanumeric),
            '.' | ',' => prev.is_ascii_digit() && next.is_some_and(|n| n.is_ascii_digit()),
            _ => false,
        };
        if !joins {
            break;
        }
        end = idx + ch.len_utf8();
        prev = ch;
    }

    end
}

fn repeated_len(rest: &str, c: char) -> usize {
    rest.chars()
        .take_while(|&x| x == c)
        .map(char::len_utf8)
        .sum()
}
