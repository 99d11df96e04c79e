//! "Did you mean" suggestions for misspelled names.

use edit_distance::edit_distance;

/// Largest edit distance that still counts as a likely typo.
const MAX_DISTANCE: usize = 2;

/// Returns the candidate closest to `word`, if any is within a couple of edits.
///
/// Ties are broken in favour of the alphabetically smallest candidate, so the result does
/// not depend on the order of `candidates`.
pub fn closest<'a, I>(word: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, &'a str)> = None;

    for candidate in candidates {
        let distance = edit_distance(word, candidate);

        if distance > MAX_DISTANCE || distance >= word.len().max(1) {
            continue;
        }

        match best {
            Some(current) if current <= (distance, candidate) => (),
            _ => best = Some((distance, candidate)),
        }
    }

    best.map(|(_, candidate)| candidate)
}

/// Formats an optional suggestion as a sentence suffix.
pub fn hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest() {
        let words = ["push", "pop", "label"];
        assert_eq!(closest("psuh", words.iter().copied()), Some("push"));
        assert_eq!(closest("lable", words.iter().copied()), Some("label"));
        assert_eq!(closest("function", words.iter().copied()), None);
    }

    #[test]
    fn test_short_words_need_a_real_match() {
        assert_eq!(closest("x", ["y", "z"].iter().copied()), None);
        assert_eq!(closest("xy", ["x"].iter().copied()), Some("x"));
    }

    #[test]
    fn test_ties_do_not_depend_on_order() {
        assert_eq!(closest("cat", ["bat", "hat", "rat"].iter().copied()), Some("bat"));
        assert_eq!(closest("cat", ["rat", "hat", "bat"].iter().copied()), Some("bat"));
        assert_eq!(closest("cat", ["rat", "cut", "ca"].iter().copied()), Some("ca"));
    }

    #[test]
    fn test_hint() {
        assert_eq!(hint(&Some("push".into())), " (did you mean 'push'?)");
        assert_eq!(hint(&None), "");
    }
}
