//! Keyword-overlap document selection.
//!
//! # Scoring Algorithm
//!
//! 1. Lower-case the prompt once.
//! 2. Score each descriptor by the number of its keywords that occur as a
//!    substring of the lower-cased prompt (case-insensitive, no word
//!    boundaries). Blank keywords never match.
//! 3. Drop descriptors that scored zero.
//! 4. Stable sort by score (desc). Equal scores keep manifest order.
//! 5. Truncate to `max_docs`.

use serde::Serialize;

use crate::manifest::{DocumentDescriptor, Manifest};

/// Number of documents selected when the caller does not say otherwise.
pub const DEFAULT_MAX_DOCS: usize = 3;

/// A descriptor that matched the prompt, with its keyword hit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredMatch {
    pub descriptor: DocumentDescriptor,
    /// Always `>= 1`.
    pub score: usize,
}

/// Count the keywords of `descriptor` found in an already lower-cased prompt.
pub fn score(prompt_lower: &str, descriptor: &DocumentDescriptor) -> usize {
    descriptor
        .keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .filter(|k| prompt_lower.contains(&k.to_lowercase()))
        .count()
}

/// Rank the manifest against `prompt` and return at most `max_docs` matches.
pub fn select(prompt: &str, manifest: &Manifest, max_docs: usize) -> Vec<ScoredMatch> {
    if max_docs == 0 {
        return Vec::new();
    }

    let prompt = prompt.to_lowercase();

    let mut scored: Vec<(usize, &DocumentDescriptor)> = manifest
        .iter()
        .map(|d| (score(&prompt, d), d))
        .filter(|(hits, _)| *hits > 0)
        .collect();

    // `sort_by` is stable, which gives the manifest-order tie-break.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(max_docs);

    scored
        .into_iter()
        .map(|(score, d)| ScoredMatch {
            descriptor: d.clone(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest::new(vec![
            DocumentDescriptor::new("a.md", &["mock", "gmock"]),
            DocumentDescriptor::new("b.md", &["ctest"]),
        ])
    }

    fn paths(matches: &[ScoredMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.descriptor.path.as_str()).collect()
    }

    #[test]
    fn test_mock_prompt_selects_a() {
        let result = select("how do I mock with gmock", &sample(), 3);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].descriptor.path, "a.md");
        assert_eq!(result[0].score, 2);
    }

    #[test]
    fn test_empty_prompt_selects_nothing() {
        assert!(select("", &sample(), 3).is_empty());
    }

    #[test]
    fn test_empty_manifest_selects_nothing() {
        assert!(select("mock ctest", &Manifest::default(), 3).is_empty());
    }

    #[test]
    fn test_zero_limit_selects_nothing() {
        assert!(select("mock ctest", &sample(), 0).is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let manifest = Manifest::new(vec![
            DocumentDescriptor::new("a.md", &["Mock", "GMOCK"]),
            DocumentDescriptor::new("b.md", &["test"]),
        ]);
        let upper = select("MOCK test", &manifest, 3);
        let lower = select("mock test", &manifest, 3);
        assert_eq!(upper, lower);
        assert_eq!(paths(&upper), vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_substring_match_without_word_boundaries() {
        let manifest = Manifest::new(vec![DocumentDescriptor::new("run.md", &["run"])]);
        let result = select("the runner crashed", &manifest, 3);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_blank_keywords_never_match() {
        let manifest = Manifest::new(vec![DocumentDescriptor::new("x.md", &["", "  "])]);
        assert!(select("anything", &manifest, 3).is_empty());
        assert!(select("", &manifest, 3).is_empty());
    }

    #[test]
    fn test_sorted_by_score_then_manifest_order() {
        let manifest = Manifest::new(vec![
            DocumentDescriptor::new("one-hit-first.md", &["design"]),
            DocumentDescriptor::new("two-hits.md", &["design", "module"]),
            DocumentDescriptor::new("one-hit-second.md", &["module"]),
            DocumentDescriptor::new("none.md", &["ctest"]),
        ]);

        let result = select("module design review", &manifest, 10);
        assert_eq!(
            paths(&result),
            vec!["two-hits.md", "one-hit-first.md", "one-hit-second.md"]
        );
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(result.iter().all(|m| m.score >= 1));
    }

    #[test]
    fn test_truncates_to_limit() {
        let manifest = Manifest::new(
            (0..6)
                .map(|i| DocumentDescriptor::new(format!("d{}.md", i), &["shared"]))
                .collect(),
        );
        let result = select("shared", &manifest, DEFAULT_MAX_DOCS);
        assert_eq!(paths(&result), vec!["d0.md", "d1.md", "d2.md"]);
    }

    #[test]
    fn test_duplicate_paths_are_independent() {
        let manifest = Manifest::new(vec![
            DocumentDescriptor::new("dup.md", &["alpha"]),
            DocumentDescriptor::new("dup.md", &["alpha", "beta"]),
        ]);
        let result = select("alpha beta", &manifest, 3);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].score, 2);
        assert_eq!(result[1].score, 1);
    }

    #[test]
    fn test_repeated_keyword_counts_each_entry() {
        let manifest = Manifest::new(vec![DocumentDescriptor::new("r.md", &["mock", "MOCK"])]);
        assert_eq!(select("mock", &manifest, 3)[0].score, 2);
    }
}
