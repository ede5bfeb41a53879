/// Words replaced before a chirp is stored. Matching is per whole word and
/// ignores case.
const BLOCKED_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];

const MASK: &str = "****";

/// Mask blocked words in `body`. Words are split on single spaces, so a
/// blocked word with punctuation attached ("fornax!") is left alone and
/// runs of spaces are preserved.
pub fn clean(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if BLOCKED_WORDS.iter().any(|b| word.eq_ignore_ascii_case(b)) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
