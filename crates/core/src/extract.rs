use std::sync::LazyLock;

use regex::Regex;

use crate::domain::entity::{EntityMap, NUMBER};

/// Row count used for top/bottom rankings when the message names none.
pub const DEFAULT_RANK_COUNT: u32 = 10;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("digit run pattern is valid"));

/// First maximal run of ASCII digits in `text`, parsed as an integer.
///
/// A run too large for `u32` is treated as absent.
pub fn first_digit_run(text: &str) -> Option<u32> {
    DIGIT_RUN.find(text).and_then(|found| found.as_str().parse().ok())
}

/// Row count for a ranking query.
///
/// The first `number` entity wins; otherwise the first digit run in the raw
/// message; otherwise `default`.
pub fn rank_count(entities: &EntityMap, text: &str, default: u32) -> u32 {
    entities
        .first(NUMBER)
        .and_then(first_digit_run)
        .or_else(|| first_digit_run(text))
        .unwrap_or(default)
}

/// Value of the first entity of `kind`, ignoring blank values.
pub fn entity_value<'a>(entities: &'a EntityMap, kind: &str) -> Option<&'a str> {
    entities.first(kind).map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{entity_value, first_digit_run, rank_count, DEFAULT_RANK_COUNT};
    use crate::domain::entity::{Entity, EntityMap, NUMBER, PARTY_NAME};

    #[test]
    fn digit_run_is_first_maximal_run() {
        assert_eq!(first_digit_run("show top 25 products, not 7"), Some(25));
        assert_eq!(first_digit_run("top5customers"), Some(5));
        assert_eq!(first_digit_run("007 agents"), Some(7));
    }

    #[test]
    fn digit_run_absent_without_digits() {
        assert_eq!(first_digit_run("top products by value"), None);
        assert_eq!(first_digit_run(""), None);
    }

    #[test]
    fn oversized_digit_run_is_absent() {
        assert_eq!(first_digit_run("top 99999999999999999999 rows"), None);
    }

    #[test]
    fn rank_count_defaults_to_ten() {
        let count = rank_count(&EntityMap::new(), "bottom products please", DEFAULT_RANK_COUNT);
        assert_eq!(count, 10);
    }

    #[test]
    fn rank_count_prefers_number_entity_over_text() {
        let entities: EntityMap = vec![Entity::new(NUMBER, "3")].into_iter().collect();
        assert_eq!(rank_count(&entities, "top 8 customers", DEFAULT_RANK_COUNT), 3);
    }

    #[test]
    fn rank_count_falls_back_to_text_when_number_entity_is_not_numeric() {
        let entities: EntityMap = vec![Entity::new(NUMBER, "five")].into_iter().collect();
        assert_eq!(rank_count(&entities, "top 8 customers", DEFAULT_RANK_COUNT), 8);
    }

    #[test]
    fn blank_entity_values_are_absent() {
        let entities: EntityMap = vec![Entity::new(PARTY_NAME, "   ")].into_iter().collect();
        assert_eq!(entity_value(&entities, PARTY_NAME), None);
    }
}
