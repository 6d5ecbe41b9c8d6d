use std::cmp::Reverse;

use nucleo::{
    Matcher, Utf32Str,
    pattern::{AtomKind, CaseMatching, Normalization, Pattern},
};

use crate::dto::tag::RegistryTag;

/// Lowest score a candidate needs to be kept, roughly one cleanly matched character.
///
/// Matches scattered far apart across the text accumulate gap penalties and fall below it.
pub const DEFAULT_MIN_SCORE: u32 = 16;

/// Ranks candidates against a query with fuzzy subsequence matching.
///
/// Holds on to the matcher's scratch memory between calls, nothing else is kept. Results are
/// always recomputed from the candidates given.
pub struct FuzzyFilter {
    matcher: Matcher,
    min_score: u32,
}

impl Default for FuzzyFilter {
    fn default() -> Self {
        Self::with_min_score(DEFAULT_MIN_SCORE)
    }
}

impl std::fmt::Debug for FuzzyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<FuzzyFilter min_score={}>", self.min_score)
    }
}

impl FuzzyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_score(min_score: u32) -> Self {
        Self {
            matcher: Matcher::new(nucleo::Config::DEFAULT),
            min_score,
        }
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    /// Filter `candidates` by `query`, best match first.
    ///
    /// A blank query returns every candidate in its original order. Otherwise each
    /// whitespace separated word of the query must match the projected text; candidates that
    /// don't, or that score below the threshold, are dropped. Equal scores keep their
    /// original order.
    pub fn filter<'a, T, F, S>(&mut self, query: &str, candidates: &'a [T], projection: F) -> Vec<&'a T>
    where
        F: Fn(&'a T) -> S,
        S: AsRef<str>,
    {
        if query.trim().is_empty() {
            return candidates.iter().collect();
        }

        let pattern = Pattern::new(query, CaseMatching::Smart, Normalization::Smart, AtomKind::Fuzzy);

        let mut buf = Vec::new();
        let mut scored: Vec<(u32, &'a T)> = candidates
            .iter()
            .filter_map(|candidate| {
                let text = projection(candidate);
                let haystack = Utf32Str::new(text.as_ref(), &mut buf);
                let score = pattern.score(haystack, &mut self.matcher)?;
                (score >= self.min_score).then_some((score, candidate))
            })
            .collect();

        scored.sort_by_key(|(score, _)| Reverse(*score));
        scored.into_iter().map(|(_, candidate)| candidate).collect()
    }

    /// Filter tags by their name and architectures.
    pub fn filter_tags<'a>(&mut self, query: &str, tags: &'a [RegistryTag]) -> Vec<&'a RegistryTag> {
        self.filter(query, tags, RegistryTag::search_text)
    }
}

/// Filter `candidates` by `query` with the default threshold.
///
/// See [`FuzzyFilter::filter`].
pub fn fuzzy_filter<'a, T, F, S>(query: &str, candidates: &'a [T], projection: F) -> Vec<&'a T>
where
    F: Fn(&'a T) -> S,
    S: AsRef<str>,
{
    FuzzyFilter::default().filter(query, candidates, projection)
}
