//! Closest-option matching for free-text model answers.

/// Pick the option closest to `text` by edit distance, ignoring case.
///
/// Ties go to the earliest option. Returns `None` only when `options` is
/// empty.
pub fn best_match<'a, S: AsRef<str>>(text: &str, options: &'a [S]) -> Option<&'a str> {
    let text = text.to_lowercase();
    options
        .iter()
        .map(|option| option.as_ref())
        .enumerate()
        .min_by_key(|&(index, option)| (levenshtein(&text, &option.to_lowercase()), index))
        .map(|(_, option)| option)
}

/// Levenshtein distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
