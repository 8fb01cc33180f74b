//! Lexicon + heuristics sentiment scorer.
//!
//! Scores a snippet in the VADER manner: every word gets its lexicon
//! valence, nudged by the words around it, and the adjusted valences are
//! summed and squashed into a compound score in `[-1, 1]`.
//!
//! # Algorithm
//!
//! 1. Tokenize with [`tokenize_words`], keeping original casing. Punctuation
//!    tokens are dropped unless the lexicon knows them (emoticons).
//! 2. Intensifier words carry valence 0; every other token starts at its
//!    lexicon valence (0 when absent).
//! 3. For a sentiment-bearing token:
//!    - ALL-CAPS in a snippet that is not entirely ALL-CAPS adds
//!      [`C_INCR`] magnitude.
//!    - Each of the three preceding tokens that is not itself a lexicon
//!      word may be an intensifier ([`B_INCR`] / [`B_DECR`], damped by
//!      distance) and may be a negation, which multiplies by [`N_SCALAR`].
//! 4. A contrastive "but" halves everything before it and weights
//!    everything after it by 1.5.
//! 5. Exclamation and question marks amplify the sum away from zero.
//! 6. `compound = x / sqrt(x² + alpha)`; the positive, negative, and neutral
//!    proportions come from the same adjusted valences and sum to 1.

use std::sync::Arc;

use crate::lexicon::Lexicon;
use crate::models::SentimentRecord;
use crate::tokenize::{is_punctuation, tokenize_words};

/// Increment applied by an amplifying intensifier ("very", "so").
pub const B_INCR: f64 = 0.293;
/// Increment applied by a dampening intensifier ("slightly", "barely").
pub const B_DECR: f64 = -0.293;
/// Emphasis added to an ALL-CAPS sentiment word or intensifier.
pub const C_INCR: f64 = 0.733;
/// Multiplier for a negated valence.
pub const N_SCALAR: f64 = -0.74;

/// Per-`!` emphasis, applied to at most [`MAX_EXCLAMATIONS`] marks.
const EXCLAMATION_INCR: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
/// Per-`?` emphasis when there are two or three question marks.
const QUESTION_INCR: f64 = 0.18;
/// Flat emphasis for more than three question marks.
const QUESTION_MAX: f64 = 0.96;

/// How many preceding tokens can modify a sentiment word.
const LOOKBEHIND: usize = 3;
/// Distance damping for intensifiers one, two, and three tokens back.
const DISTANCE_DAMPING: [f64; LOOKBEHIND] = [1.0, 0.95, 0.9];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "neednt", "never", "no", "none",
    "nope", "nor", "not", "nothing", "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "uh-uh",
    "wasnt", "werent", "without", "wont", "wouldnt", "rarely", "seldom", "despite",
];

const AMPLIFIERS: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly", "deeply",
    "effing", "enormously", "entirely", "especially", "exceptionally", "extremely", "fabulously",
    "flipping", "fricking", "frigging", "fully", "greatly", "hella", "highly", "hugely",
    "incredibly", "intensely", "majorly", "more", "most", "particularly", "purely", "quite",
    "really", "remarkably", "so", "substantially", "thoroughly", "totally", "tremendously", "uber",
    "unbelievably", "unusually", "utterly", "very",
];

const DAMPENERS: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "less", "little", "marginally", "occasionally", "partly",
    "scarcely", "slightly", "somewhat", "sorta",
];

/// Thread-safe, stateless scorer over a shared [`Lexicon`].
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: Arc<Lexicon>,
    alpha: f64,
}

impl SentimentAnalyzer {
    /// Normalization constant used when none is configured.
    pub const DEFAULT_ALPHA: f64 = 15.0;

    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            alpha: Self::DEFAULT_ALPHA,
        }
    }

    /// Override the normalization constant. Larger values squash less.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Context-free valence of a single word.
    pub fn word_valence(&self, word: &str) -> f64 {
        self.lookup(word).unwrap_or(0.0)
    }

    /// Score a snippet.
    ///
    /// Text with no scorable tokens gets the neutral record
    /// (compound 0, neutral 1).
    pub fn score(&self, text: &str) -> SentimentRecord {
        let tokens: Vec<&str> = tokenize_words(text)
            .into_iter()
            .filter(|t| !is_punctuation(t) || self.lexicon.contains(t))
            .collect();

        if tokens.is_empty() {
            return SentimentRecord::neutral(text);
        }

        let cap_diff = has_cap_differential(&tokens);
        let mut sentiments: Vec<f64> = (0..tokens.len())
            .map(|i| self.token_valence(&tokens, i, cap_diff))
            .collect();

        apply_but_check(&tokens, &mut sentiments);

        let emphasis = punctuation_emphasis(text);
        let mut sum: f64 = sentiments.iter().sum();
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }
        let compound = normalize(sum, self.alpha);

        let (mut pos_sum, mut neg_sum, neu_count) = sift(&sentiments);
        if pos_sum > neg_sum.abs() {
            pos_sum += emphasis;
        } else if pos_sum < neg_sum.abs() {
            neg_sum -= emphasis;
        }

        // Every token contributes at least 1, so total >= 1.
        let total = pos_sum + neg_sum.abs() + neu_count;
        SentimentRecord {
            text: text.to_string(),
            negative: (neg_sum / total).abs(),
            neutral: neu_count / total,
            positive: (pos_sum / total).abs(),
            compound,
        }
    }

    fn lookup(&self, token: &str) -> Option<f64> {
        self.lexicon.get(token).or_else(|| {
            token
                .strip_prefix('#')
                .filter(|tag| !tag.is_empty())
                .and_then(|tag| self.lexicon.get(tag))
        })
    }

    fn token_valence(&self, tokens: &[&str], i: usize, cap_diff: bool) -> f64 {
        let item = tokens[i];
        let lower = item.to_lowercase();
        if is_intensifier(&lower) {
            return 0.0;
        }

        let mut valence = match self.lookup(item) {
            Some(v) if v != 0.0 => v,
            _ => return 0.0,
        };

        if cap_diff && is_shouting(item) {
            valence += C_INCR.copysign(valence);
        }

        for distance in 0..LOOKBEHIND.min(i) {
            let prev = tokens[i - distance - 1];
            // Only non-lexicon words intensify; negation applies regardless.
            if !self.lexicon.contains(prev) {
                let boost = intensifier_scalar(prev, valence, cap_diff);
                valence += boost * DISTANCE_DAMPING[distance];
            }
            if is_negation(prev) {
                valence *= N_SCALAR;
            }
        }

        valence
    }
}

/// Squash a raw valence sum into `[-1, 1]`.
pub fn normalize(score: f64, alpha: f64) -> f64 {
    let norm = score / (score * score + alpha).sqrt();
    norm.clamp(-1.0, 1.0)
}

/// Emphasis contributed by `!` and `?` anywhere in the text.
fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_emphasis = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCR,
        _ => QUESTION_MAX,
    };
    exclamations as f64 * EXCLAMATION_INCR + question_emphasis
}

fn apply_but_check(tokens: &[&str], sentiments: &mut [f64]) {
    let Some(pivot) = tokens.iter().position(|t| t.eq_ignore_ascii_case("but")) else {
        return;
    };
    for (i, s) in sentiments.iter_mut().enumerate() {
        if i < pivot {
            *s *= 0.5;
        } else if i > pivot {
            *s *= 1.5;
        }
    }
}

/// Split adjusted valences into (positive mass, negative mass, neutral count).
fn sift(sentiments: &[f64]) -> (f64, f64, f64) {
    let mut pos = 0.0;
    let mut neg = 0.0;
    let mut neu = 0.0;
    for &s in sentiments {
        if s > 0.0 {
            pos += s + 1.0;
        } else if s < 0.0 {
            neg += s - 1.0;
        } else {
            neu += 1.0;
        }
    }
    (pos, neg, neu)
}

fn intensifier_scalar(word: &str, valence: f64, cap_diff: bool) -> f64 {
    let lower = word.to_lowercase();
    let mut scalar = if AMPLIFIERS.contains(&lower.as_str()) {
        B_INCR
    } else if DAMPENERS.contains(&lower.as_str()) {
        B_DECR
    } else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if cap_diff && is_shouting(word) {
        scalar += C_INCR.copysign(valence);
    }
    scalar
}

fn is_intensifier(lower: &str) -> bool {
    AMPLIFIERS.contains(&lower) || DAMPENERS.contains(&lower)
}

fn is_negation(word: &str) -> bool {
    let lower = word.to_lowercase();
    if lower.ends_with("n't") || lower.ends_with("n\u{2019}t") {
        return true;
    }
    NEGATIONS.contains(&lower.as_str())
}

/// Has a cased letter and no lowercase ones.
fn is_shouting(token: &str) -> bool {
    token.chars().any(char::is_uppercase) && !token.chars().any(char::is_lowercase)
}

/// True when some, but not all, tokens are ALL-CAPS.
fn has_cap_differential(tokens: &[&str]) -> bool {
    let shouting = tokens.iter().filter(|t| is_shouting(t)).count();
    shouting > 0 && shouting < tokens.len()
}
