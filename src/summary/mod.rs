//! Heuristic session summaries mined from the opening user turns.
//!
//! The extractor concatenates the first few user messages, strips noise
//! (code blocks, URLs, paths), ranks the remaining words by frequency and
//! matches the first message against an ordered list of lead-verb
//! categories. The fallback chain is fixed for output stability:
//! "<category> <top 3 keywords>", else top 4 keywords, else
//! "<fallback> session".

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Role, Turn};

/// Turns scanned / user turns collected when gathering summary input.
const MAX_TURNS_SCANNED: usize = 10;
const MAX_USER_TURNS: usize = 5;
/// Keywords kept after ranking.
const MAX_KEYWORDS: usize = 5;

/// Common words that carry no topical signal.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "we", "our", "you", "your", "the", "a", "an", "is", "are", "was", "were",
    "be", "been", "being", "have", "has", "had", "do", "does", "did", "will", "would", "could",
    "should", "may", "might", "must", "shall", "can", "to", "of", "in", "for", "on", "with",
    "at", "by", "from", "as", "into", "through", "during", "before", "after", "above", "below",
    "between", "under", "again", "further", "then", "once", "here", "there", "when", "where",
    "why", "how", "all", "each", "few", "more", "most", "other", "some", "such", "no", "nor",
    "not", "only", "own", "same", "so", "than", "too", "very", "just", "and", "but", "if", "or",
    "because", "until", "while", "this", "that", "these", "those", "am", "it", "its", "also",
    "about", "like", "want", "need", "please", "help", "make", "get", "let", "see", "look",
    "thing", "something", "anything", "everything", "nothing", "use", "using", "used",
];

/// Lead-verb categories, scanned in order; the first match wins.
const ACTION_CATEGORIES: &[(&str, &str)] = &[
    (r"\b(create|build|make|develop|implement)\b.*?\b(\w+)", "building"),
    (r"\b(fix|debug|solve|resolve)\b.*?\b(\w+)", "fixing"),
    (r"\b(add|integrate|include)\b.*?\b(\w+)", "adding"),
    (r"\b(update|modify|change|edit)\b.*?\b(\w+)", "updating"),
    (r"\b(setup|configure|install)\b.*?\b(\w+)", "setting up"),
    (r"\b(export|convert|transform)\b.*?\b(\w+)", "exporting"),
    (r"\b(test|verify|check)\b.*?\b(\w+)", "testing"),
    (r"\b(refactor|optimize|improve)\b.*?\b(\w+)", "improving"),
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

fn noise_res() -> &'static [Regex; 4] {
    static RES: OnceLock<[Regex; 4]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"(?s)```.*?```").expect("valid fenced-code regex"),
            Regex::new(r"https?://\S+").expect("valid url regex"),
            Regex::new(r"/[\w/.-]+").expect("valid path regex"),
            Regex::new(r"`[^`]+`").expect("valid inline-code regex"),
        ]
    })
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-z]{3,}\b").expect("valid word regex"))
}

fn action_res() -> &'static Vec<(Regex, &'static str)> {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        ACTION_CATEGORIES
            .iter()
            .map(|(pattern, action)| {
                (Regex::new(pattern).expect("valid action regex"), *action)
            })
            .collect()
    })
}

/// Produce a short descriptive label for a conversation.
///
/// `fallback` (typically the project name) is used when no user text or no
/// meaningful keywords exist.
pub fn generate_summary(turns: &[Turn], fallback: &str) -> String {
    let user_texts: Vec<&str> = turns
        .iter()
        .take(MAX_TURNS_SCANNED)
        .filter(|t| t.role == Role::User)
        .map(|t| t.text.as_str())
        .take(MAX_USER_TURNS)
        .collect();

    if user_texts.is_empty() {
        return format!("{fallback} session");
    }

    let mut combined = user_texts.join(" ").to_lowercase();
    for re in noise_res() {
        combined = re.replace_all(&combined, "").into_owned();
    }

    let top_words = rank_keywords(&combined);
    if top_words.is_empty() {
        return format!("{fallback} session");
    }

    let first_msg = user_texts[0].to_lowercase();
    for (re, action) in action_res() {
        if let Some(caps) = re.captures(&first_msg) {
            let verb = caps.get(1).map_or("", |m| m.as_str());
            // The matched lead verb restates the category; drop it from the
            // keyword list so "fix the bug" reads "Fixing Bug", not
            // "Fixing Fix Bug".
            let keywords: Vec<&str> =
                top_words.iter().map(String::as_str).filter(|w| *w != verb).take(3).collect();
            return title_case(&format!("{action} {}", keywords.join(" ")));
        }
    }

    title_case(&top_words[..top_words.len().min(4)].join(" "))
}

/// Rank meaningful words by frequency.
///
/// Ties break on first occurrence: the counting pass records words in
/// encounter order and the stable sort preserves that order for equal
/// counts, so ranking is deterministic across runs.
fn rank_keywords(text: &str) -> Vec<String> {
    let stop = stop_words();
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();

    for m in word_re().find_iter(text) {
        let word = m.as_str();
        if stop.contains(word) {
            continue;
        }
        counts
            .entry(word)
            .and_modify(|c| *c += 1)
            .or_insert_with(|| {
                order.push(word);
                1
            });
    }

    let mut ranked: Vec<(&str, u64)> = order.iter().map(|w| (*w, counts[w])).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(MAX_KEYWORDS).map(|(w, _)| w.to_string()).collect()
}

/// Uppercase the first letter of each whitespace-separated word.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
