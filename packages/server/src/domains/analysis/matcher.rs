//! Approximate lemma comparison used by the asynchronous analysis path.

/// Whether two lemmas should count as the same word.
///
/// Equal strings and substring pairs always match. Otherwise both lemmas must
/// be longer than three characters, and the number of positions that differ
/// over the shared prefix, plus the length difference, must not exceed 30% of
/// the longer lemma. Lengths count Unicode scalar values.
pub fn lemmas_match(a: &str, b: &str) -> bool {
    if a == b || a.contains(b) || b.contains(a) {
        return true;
    }

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len <= 3 || b_len <= 3 {
        return false;
    }

    let mismatches = a.chars().zip(b.chars()).filter(|(x, y)| x != y).count();
    let distance = mismatches + a_len.abs_diff(b_len);

    distance as f64 <= a_len.max(b_len) as f64 * 0.3
}
