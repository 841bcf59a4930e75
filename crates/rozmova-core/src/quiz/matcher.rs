//! Quiz answer matching.
//!
//! Normalizes free-text answers and fuzzily compares them against the
//! accepted-answer set derived for the current question.

/// Punctuation stripped from answers before comparison.
const STRIP_CHARS: &[char] = &['(', ')', '[', ']', '{', '}', '.', ',', '!'];

/// Normalizes an answer: lowercase, strip punctuation, collapse internal
/// whitespace runs to single spaces, trim the ends.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered.chars().filter(|c| !STRIP_CHARS.contains(c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Checks whether the user's answer matches any accepted answer.
///
/// Both sides are normalized; a match is exact equality or bidirectional
/// substring containment. The containment rule intentionally accepts partial
/// and over-specified answers ("Python" matches "programming in python") at
/// the cost of false positives for very short accepted answers that happen to
/// be substrings of unrelated words. Known trade-off, do not tighten.
pub fn is_correct(user_answer: &str, accepted: &[String]) -> bool {
    let user = normalize(user_answer);
    if user.is_empty() {
        return false;
    }
    accepted.iter().any(|answer| {
        let answer = normalize(answer);
        !answer.is_empty() && (user == answer || user.contains(&answer) || answer.contains(&user))
    })
}
