// src/matching/similarity.rs
// Recursive longest-common-substring similarity over characters.

/// Characters the two strings have in common: the first longest common run,
/// plus whatever the prefixes before it and the suffixes after it share.
///
/// The pair is put in a canonical order (shorter first, then lexical) before
/// scanning so that `match_length(a, b) == match_length(b, a)`; the
/// first-found run otherwise depends on which side is scanned outermost.
pub fn match_length(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (first, second) = if (a.len(), &a) <= (b.len(), &b) {
        (&a, &b)
    } else {
        (&b, &a)
    };
    common_chars(first, second)
}

/// `200 * match / (len(a) + len(b))`, in [0, 100]. Two empty strings score 0.
pub fn similarity_percent(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 0.0;
    }
    (match_length(a, b) * 200) as f64 / total as f64
}

fn common_chars(a: &[char], b: &[char]) -> usize {
    let (pos_a, pos_b, max) = longest_common_run(a, b);
    if max == 0 {
        return 0;
    }
    max + common_chars(&a[..pos_a], &b[..pos_b])
        + common_chars(&a[pos_a + max..], &b[pos_b + max..])
}

/// Start positions and length of the first longest common run. A later run
/// replaces an earlier one only when strictly longer.
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut len = 0;
            while i + len < a.len() && j + len < b.len() && a[i + len] == b[j + len] {
                len += 1;
            }
            if len > best.2 {
                best = (i, j, len);
            }
        }
    }
    best
}
