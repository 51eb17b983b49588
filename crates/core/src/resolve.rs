//! Free-text name resolution against catalog rows.
//!
//! Ledger names are matched by best similarity score with a cutoff. Product
//! names are matched by plain substring containment on a normalised query:
//! the first catalog row containing it wins, with no scoring.

use strsim::normalized_levenshtein;

use crate::domain::ledger::{LedgerEntry, LedgerId};
use crate::domain::product::ProductRecord;

pub const DEFAULT_LEDGER_SCORE_CUTOFF: f64 = 70.0;

/// Words dropped from a stock query before product matching.
pub const STOCK_QUERY_FILLERS: [&str; 8] =
    ["stock", "show", "of", "please", "current", "for", "qty", "quantity"];

#[derive(Clone, Debug, PartialEq)]
pub struct LedgerMatch {
    pub id: LedgerId,
    pub name: String,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LedgerNameResolver {
    cutoff: f64,
}

impl Default for LedgerNameResolver {
    fn default() -> Self {
        Self { cutoff: DEFAULT_LEDGER_SCORE_CUTOFF }
    }
}

impl LedgerNameResolver {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Best-scoring catalog entry for `query`, if it reaches the cutoff.
    ///
    /// Equal top scores resolve to the earliest entry in catalog order. When
    /// a display name repeats, the last id listed under it is used.
    pub fn resolve(&self, query: &str, catalog: &[LedgerEntry]) -> Option<LedgerMatch> {
        let mut best: Option<(&LedgerEntry, f64)> = None;
        for entry in catalog {
            let score = similarity(query, &entry.name);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((entry, score));
            }
        }

        let (entry, score) = best?;
        if score < self.cutoff {
            return None;
        }

        let id = catalog
            .iter()
            .rev()
            .find(|candidate| candidate.name == entry.name)
            .map_or(entry.id, |candidate| candidate.id);

        Some(LedgerMatch { id, name: entry.name.clone(), score })
    }
}

/// Similarity of two names on a 0-100 scale.
///
/// Case and punctuation are ignored. The score is the best of the plain edit
/// ratio, the ratio over alphabetically sorted words, and (when one name is
/// at least 1.5x longer) the best ratio of the shorter name against any
/// equally long window of the longer one, scaled down.
pub fn similarity(left: &str, right: &str) -> f64 {
    let left = normalize_for_scoring(left);
    let right = normalize_for_scoring(right);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let plain = normalized_levenshtein(&left, &right);
    let token_sorted = normalized_levenshtein(&sort_tokens(&left), &sort_tokens(&right)) * 0.95;

    let (shorter, longer) = if left.chars().count() <= right.chars().count() {
        (&left, &right)
    } else {
        (&right, &left)
    };
    let length_ratio = longer.chars().count() as f64 / shorter.chars().count() as f64;
    let partial = if length_ratio >= 1.5 {
        let scale = if length_ratio < 8.0 { 0.9 } else { 0.6 };
        best_window_ratio(shorter, longer) * scale
    } else {
        0.0
    };

    plain.max(token_sorted).max(partial) * 100.0
}

fn normalize_for_scoring(text: &str) -> String {
    let cleaned = text
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sort_tokens(text: &str) -> String {
    let mut tokens = text.split_whitespace().collect::<Vec<_>>();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn best_window_ratio(shorter: &str, longer: &str) -> f64 {
    let longer_chars = longer.chars().collect::<Vec<_>>();
    let width = shorter.chars().count();
    if width == 0 || width > longer_chars.len() {
        return 0.0;
    }

    (0..=longer_chars.len() - width)
        .map(|start| {
            let window = longer_chars[start..start + width].iter().collect::<String>();
            normalized_levenshtein(shorter, &window)
        })
        .fold(0.0, f64::max)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProductNameResolver;

impl ProductNameResolver {
    pub fn new() -> Self {
        Self
    }

    /// Normalises a stock query: filler words are dropped case-insensitively,
    /// then the remainder is title-cased to match catalog casing.
    pub fn normalize_stock_query(&self, raw: &str) -> String {
        let kept = raw
            .split_whitespace()
            .filter(|word| {
                let bare = word.trim_matches(|ch: char| !ch.is_alphanumeric()).to_lowercase();
                !STOCK_QUERY_FILLERS.contains(&bare.as_str())
            })
            .collect::<Vec<_>>()
            .join(" ");
        title_case(&kept)
    }

    /// Normalises a product name without dropping any words.
    pub fn normalize_name(&self, raw: &str) -> String {
        title_case(&raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// First catalog row whose name contains `normalized` (case-sensitive).
    pub fn resolve<'a>(
        &self,
        normalized: &str,
        catalog: &'a [ProductRecord],
    ) -> Option<&'a ProductRecord> {
        if normalized.is_empty() {
            return None;
        }
        catalog.iter().find(|product| product.name.contains(normalized))
    }
}

/// Upper-cases every letter that follows a non-letter and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            output.push(ch);
            previous_is_letter = false;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{similarity, title_case, LedgerNameResolver, ProductNameResolver};
    use crate::domain::ledger::{LedgerEntry, LedgerId};
    use crate::domain::product::ProductRecord;

    fn ledger_catalog() -> Vec<LedgerEntry> {
        vec![LedgerEntry::new(1, "Alpha Traders"), LedgerEntry::new(2, "Beta Corp")]
    }

    #[test]
    fn near_miss_party_name_resolves_to_catalog_entry() {
        let resolved = LedgerNameResolver::default()
            .resolve("alpha trader", &ledger_catalog())
            .expect("alpha trader should resolve");

        assert_eq!(resolved.id, LedgerId(1));
        assert_eq!(resolved.name, "Alpha Traders");
        assert!(resolved.score >= 70.0);
    }

    #[test]
    fn unrelated_party_name_is_not_found() {
        let resolved = LedgerNameResolver::default().resolve("zzz-nonexistent", &ledger_catalog());
        assert_eq!(resolved, None);
    }

    #[test]
    fn short_prefix_matches_longer_name() {
        let resolved = LedgerNameResolver::default()
            .resolve("beta", &ledger_catalog())
            .expect("beta should resolve");
        assert_eq!(resolved.id, LedgerId(2));
    }

    #[test]
    fn resolution_is_deterministic_for_fixed_catalog() {
        let resolver = LedgerNameResolver::default();
        let catalog = vec![
            LedgerEntry::new(10, "Gamma Stores"),
            LedgerEntry::new(11, "Gamma Stores"),
            LedgerEntry::new(12, "Gamma Store"),
        ];

        let first = resolver.resolve("gamma stores", &catalog);
        let second = resolver.resolve("gamma stores", &catalog);

        assert_eq!(first, second);
        assert_eq!(first.map(|found| found.id), Some(LedgerId(11)));
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        assert_eq!(LedgerNameResolver::default().resolve("alpha", &[]), None);
    }

    #[test]
    fn similarity_ignores_case_and_punctuation() {
        assert_eq!(similarity("ALPHA-traders", "alpha traders"), 100.0);
        assert_eq!(similarity("", "alpha"), 0.0);
    }

    #[test]
    fn stock_query_drops_fillers_and_title_cases() {
        let resolver = ProductNameResolver::new();
        assert_eq!(
            resolver.normalize_stock_query("current stock of Blue Widget please"),
            "Blue Widget"
        );
        assert_eq!(resolver.normalize_stock_query("QTY for office chair?"), "Office Chair?");
    }

    #[test]
    fn stock_query_matches_catalog_by_substring() {
        let resolver = ProductNameResolver::new();
        let catalog =
            vec![ProductRecord::named("Red Gadget"), ProductRecord::named("Blue Widget Deluxe")];

        let normalized = resolver.normalize_stock_query("current stock of Blue Widget please");
        let matched = resolver.resolve(&normalized, &catalog).expect("should match");

        assert_eq!(matched.name, "Blue Widget Deluxe");
    }

    #[test]
    fn first_substring_match_wins() {
        let resolver = ProductNameResolver::new();
        let catalog = vec![
            ProductRecord::named("Blue Widget Mini"),
            ProductRecord::named("Blue Widget Deluxe"),
        ];

        let matched = resolver.resolve("Blue Widget", &catalog).expect("should match");
        assert_eq!(matched.name, "Blue Widget Mini");
    }

    #[test]
    fn empty_normalized_query_matches_nothing() {
        let resolver = ProductNameResolver::new();
        let catalog = vec![ProductRecord::named("Blue Widget")];

        let normalized = resolver.normalize_stock_query("show stock please");
        assert_eq!(normalized, "");
        assert_eq!(resolver.resolve(&normalized, &catalog), None);
    }

    #[test]
    fn title_case_follows_letter_boundaries() {
        assert_eq!(title_case("blue WIDGET"), "Blue Widget");
        assert_eq!(title_case("o'neil steel-pipe"), "O'Neil Steel-Pipe");
        assert_eq!(title_case("2nd grade"), "2Nd Grade");
    }
}
