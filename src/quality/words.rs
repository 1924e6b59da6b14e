use once_cell::sync::Lazy;
use regex::Regex;

static LOWER_TO_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static UPPER_RUN_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])([A-Z][a-z])").unwrap());
static ALPHA_TO_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-zA-Z])([0-9])").unwrap());
static DIGIT_TO_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9])([a-zA-Z])").unwrap());

/// Function words that say nothing about what code does.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "nor", "so", "yet", "if", "then", "else", "when",
    "while", "for", "to", "of", "in", "into", "on", "onto", "at", "by", "with", "without",
    "from", "as", "is", "are", "was", "were", "be", "been", "being", "it", "its", "this",
    "that", "these", "those", "there", "here", "which", "who", "whom", "whose", "what", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "not", "only", "own", "same", "than", "too", "very", "can", "cannot", "could", "may",
    "might", "must", "shall", "should", "will", "would", "do", "does", "did", "done", "has",
    "have", "had", "i", "we", "you", "he", "she", "they", "them", "his", "her", "their", "our",
    "us", "me", "my", "your", "about", "above", "after", "again", "against", "before", "below",
    "between", "during", "once", "over", "under", "until", "up", "down", "out", "off", "further",
];

/// Splits text into lowercase words: camelCase, acronym and letter/digit
/// boundaries are cut, punctuation is dropped, stop words are removed and
/// plurals are reduced so `items` and `item` compare equal.
pub fn significant_words(text: &str) -> Vec<String> {
    let spaced = LOWER_TO_UPPER.replace_all(text, "$1 $2");
    let spaced = UPPER_RUN_END.replace_all(&spaced, "$1 $2");
    let spaced = ALPHA_TO_DIGIT.replace_all(&spaced, "$1 $2");
    let spaced = DIGIT_TO_ALPHA.replace_all(&spaced, "$1 $2");

    let mut words = Vec::new();
    for raw in spaced.split(|c: char| c.is_whitespace() || matches!(c, '.' | '-' | '_' | '/')) {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        if cleaned.is_empty() || STOP_WORDS.contains(&cleaned.as_str()) {
            continue;
        }
        let word = singularize(&cleaned);
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Light plural folding, enough to line up comment wording with identifiers.
fn singularize(word: &str) -> String {
    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.len() > 4 && word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if word.len() > 2
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Words appearing in both lists.
pub fn intersection(left: &[String], right: &[String]) -> Vec<String> {
    left.iter()
        .filter(|word| right.contains(word))
        .cloned()
        .collect()
}
