//! Channel matching
//!
//! Resolves a free-text channel query against the channel list of one feed.
//! Matching runs in two passes:
//!
//! 1. **Exact**: a channel whose raw display name equals the trimmed query
//!    wins outright with a score of 100.
//! 2. **Fuzzy**: query and channel names are normalized and scored with
//!    [`similarity_score`], then adjusted:
//!    - identical CCTV numbers force 100
//!    - otherwise a known alias adds a fixed bonus
//!    - a name containing the other is raised to at least 85
//!    - identical normalized keys force 100
//!
//! The highest score wins, with ties going to the channel that appears first
//! in the feed. Anything below the match threshold is not a match.

use std::collections::HashSet;

use crate::config::SearchConfig;
use crate::models::ChannelRecord;
use crate::utils::{cctv_number, normalize_channel_name, same_cctv_channel, similarity_score};

/// Bonus for a query naming a channel by one of its common aliases
pub const ALIAS_BONUS: u8 = 15;

/// Minimum score for names where one contains the other
pub const CONTAINMENT_SCORE: u8 = 85;

/// Provincial satellite channels and the short names viewers use for them
const COMMON_ALIASES: &[(&str, &[&str])] = &[
    ("湖南卫视", &["湖南", "湖南台", "芒果台"]),
    ("浙江卫视", &["浙江", "浙江台"]),
    ("江苏卫视", &["江苏", "江苏台"]),
    ("东方卫视", &["东方", "上海卫视", "上海东方"]),
    ("北京卫视", &["北京", "北京台", "btv"]),
    ("广东卫视", &["广东", "广东台"]),
    ("深圳卫视", &["深圳", "深圳台"]),
];

#[derive(Debug, Clone)]
struct AliasEntry {
    key: String,
    variants: Vec<String>,
}

/// Best channel for a query within one feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMatch<'a> {
    pub channel: &'a ChannelRecord,
    pub score: u8,
}

#[derive(Debug, Clone)]
pub struct ChannelMatcher {
    match_threshold: u8,
    suggestion_threshold: u8,
    per_source_suggestions: usize,
    aggregated_suggestions: usize,
    aliases: Vec<AliasEntry>,
}

impl ChannelMatcher {
    pub fn new(config: &SearchConfig) -> Self {
        let aliases = COMMON_ALIASES
            .iter()
            .map(|(key, variants)| {
                let mut seen = HashSet::new();
                AliasEntry {
                    key: normalize_channel_name(key),
                    variants: variants
                        .iter()
                        .map(|v| normalize_channel_name(v))
                        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
                        .collect(),
                }
            })
            .collect();

        Self {
            match_threshold: config.match_threshold,
            suggestion_threshold: config.suggestion_threshold,
            per_source_suggestions: config.per_source_suggestions,
            aggregated_suggestions: config.aggregated_suggestions,
            aliases,
        }
    }

    /// Best matching channel, or `None` when nothing reaches the threshold
    pub fn find_match<'a>(
        &self,
        query: &str,
        channels: &'a [ChannelRecord],
    ) -> Option<ChannelMatch<'a>> {
        let trimmed = query.trim();
        if let Some(channel) = channels.iter().find(|c| c.name == trimmed) {
            return Some(ChannelMatch {
                channel,
                score: 100,
            });
        }

        // A name made only of stripped words carries nothing to compare
        let query_key = normalize_channel_name(query);
        if query_key.is_empty() {
            return None;
        }
        let mut best: Option<ChannelMatch<'a>> = None;

        for channel in channels {
            let channel_key = normalize_channel_name(&channel.name);
            let score = self.fuzzy_score(&query_key, &channel_key);

            if best.map_or(true, |b| score > b.score) {
                best = Some(ChannelMatch { channel, score });
            }
        }

        best.filter(|b| b.score >= self.match_threshold)
    }

    /// Channel names that look like the query, best first
    ///
    /// Keeps names scoring above the suggestion threshold; equal scores keep
    /// feed order.
    pub fn suggest(&self, query: &str, channels: &[ChannelRecord]) -> Vec<String> {
        let query_key = normalize_channel_name(query);
        if query_key.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(u8, &str)> = channels
            .iter()
            .map(|channel| {
                let key = normalize_channel_name(&channel.name);
                (suggestion_score(&query_key, &key), channel.name.as_str())
            })
            .filter(|(score, _)| *score > self.suggestion_threshold)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(self.per_source_suggestions)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Merge suggestions from several sources into one ranked list
    ///
    /// Duplicate names keep their first occurrence, the merged list is
    /// re-ranked against the query and cut to the aggregate limit.
    pub fn aggregate_suggestions<I>(&self, query: &str, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let query_key = normalize_channel_name(query);
        let mut seen = HashSet::new();
        let mut scored: Vec<(u8, String)> = names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| {
                let key = normalize_channel_name(&name);
                (suggestion_score(&query_key, &key), name)
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(self.aggregated_suggestions)
            .map(|(_, name)| name)
            .collect()
    }

    fn fuzzy_score(&self, query_key: &str, channel_key: &str) -> u8 {
        let mut score = similarity_score(query_key, channel_key);

        if same_cctv_channel(query_key, channel_key) {
            score = 100;
        } else if self.alias_applies(query_key, channel_key) {
            score = score.saturating_add(ALIAS_BONUS).min(100);
        }

        // Numbered CCTV keys are settled by their numbers alone
        let both_cctv = cctv_number(query_key).is_some() && cctv_number(channel_key).is_some();
        if !both_cctv
            && !query_key.is_empty()
            && !channel_key.is_empty()
            && (channel_key.contains(query_key) || query_key.contains(channel_key))
        {
            score = score.max(CONTAINMENT_SCORE);
        }

        if query_key == channel_key {
            score = 100;
        }

        score
    }

    fn alias_applies(&self, query_key: &str, channel_key: &str) -> bool {
        self.aliases.iter().any(|entry| {
            channel_key.contains(entry.key.as_str())
                && entry
                    .variants
                    .iter()
                    .any(|variant| query_key.contains(variant.as_str()))
        })
    }
}

fn suggestion_score(query_key: &str, channel_key: &str) -> u8 {
    if same_cctv_channel(query_key, channel_key) {
        100
    } else {
        similarity_score(query_key, channel_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matcher() -> ChannelMatcher {
        ChannelMatcher::new(&SearchConfig::default())
    }

    fn channels(names: &[&str]) -> Vec<ChannelRecord> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ChannelRecord::new((i + 1).to_string(), *name))
            .collect()
    }

    #[test]
    fn test_exact_raw_name_wins_first() {
        let list = channels(&["CCTV1", "CCTV-1"]);
        let found = matcher().find_match("  CCTV-1 ", &list).unwrap();
        assert_eq!(found.channel.id, "2");
        assert_eq!(found.score, 100);
    }

    #[test]
    fn test_cctv_variants_match() {
        let list = channels(&["CCTV-11 戏曲", "CCTV-1 综合", "CCTV-5 体育"]);
        let m = matcher();

        let found = m.find_match("CCTV1", &list).unwrap();
        assert_eq!(found.channel.name, "CCTV-1 综合");
        assert_eq!(found.score, 100);

        let found = m.find_match("央视5", &list).unwrap();
        assert_eq!(found.channel.name, "CCTV-5 体育");
    }

    #[test]
    fn test_cctv_number_mismatch_is_not_a_match() {
        let list = channels(&["CCTV-11"]);
        assert!(matcher().find_match("CCTV1", &list).is_none());
    }

    #[test]
    fn test_alias_bonus() {
        let m = matcher();
        // 芒果 vs 湖南卫视 share nothing, so the alias bonus alone is not enough
        assert_eq!(m.fuzzy_score("芒果", "湖南卫视"), ALIAS_BONUS);
        assert!(m.alias_applies("湖南", "湖南卫视"));
        assert!(!m.alias_applies("湖北", "湖南卫视"));
    }

    #[test]
    fn test_containment_floor() {
        let list = channels(&["湖北卫视", "湖南卫视"]);
        let found = matcher().find_match("湖南", &list).unwrap();
        assert_eq!(found.channel.name, "湖南卫视");
        assert_eq!(found.score, CONTAINMENT_SCORE);

        let list = channels(&["Discovery Science HD"]);
        let found = matcher().find_match("Discovery", &list).unwrap();
        assert_eq!(found.score, CONTAINMENT_SCORE);
    }

    #[test]
    fn test_normalized_equality_is_full_score() {
        let list = channels(&["湖南电视台"]);
        let found = matcher().find_match("湖南卫视", &list).unwrap();
        assert_eq!(found.score, 100);
    }

    #[test]
    fn test_ties_keep_first_channel() {
        let list = channels(&["BBC One", "BBC One"]);
        let found = matcher().find_match("bbc-one", &list).unwrap();
        assert_eq!(found.channel.id, "1");
    }

    #[test]
    fn test_below_threshold_is_no_match() {
        let list = channels(&["Eurosport", "Animal Planet"]);
        assert!(matcher().find_match("凤凰中文", &list).is_none());
        assert!(matcher().find_match("CCTV1", &[]).is_none());
    }

    #[test]
    fn test_query_of_only_category_words_matches_nothing() {
        let list = channels(&["体育新闻", "财经频道"]);
        let m = matcher();

        assert_eq!(normalize_channel_name("新闻综合"), "");
        assert!(m.find_match("新闻综合", &list).is_none());
        assert!(m.suggest("新闻综合", &list).is_empty());

        // The exact raw name still wins
        let found = m.find_match("体育新闻", &list).unwrap();
        assert_eq!(found.channel.id, "1");
        assert_eq!(found.score, 100);
    }

    #[test]
    fn test_suggestions_ranked_and_limited() {
        let names: Vec<String> = (1..=20).map(|i| format!("CCTV-{i}")).collect();
        let mut list: Vec<ChannelRecord> = names
            .iter()
            .map(|n| ChannelRecord::new(n.clone(), n.clone()))
            .collect();
        list.push(ChannelRecord::new("x", "CCTV 1 HD"));

        let suggestions = matcher().suggest("CCTV1", &list);
        assert_eq!(suggestions[0], "CCTV-1");
        assert_eq!(suggestions[1], "CCTV 1 HD");
        // Other CCTV numbers score 30 and fall below the suggestion threshold
        assert_eq!(suggestions.len(), 2);

        let list = channels(&[
            "湖南卫视", "湖北卫视", "河南卫视", "海南卫视", "云南卫视", "湖南经视",
            "湖南都市", "湖南娱乐", "湖南电影", "湖南公共", "湖南国际", "湖南爱晚",
        ]);
        let suggestions = matcher().suggest("湖南卫视", &list);
        assert!(suggestions.len() <= DEFAULT_PER_SOURCE);
        assert_eq!(suggestions[0], "湖南卫视");
    }

    const DEFAULT_PER_SOURCE: usize = crate::config::defaults::DEFAULT_PER_SOURCE_SUGGESTIONS;

    #[test]
    fn test_aggregate_dedupes_and_reranks() {
        let merged = matcher().aggregate_suggestions(
            "湖南卫视",
            vec![
                "湖北卫视".to_string(),
                "湖南卫视".to_string(),
                "湖北卫视".to_string(),
            ],
        );
        assert_eq!(merged, vec!["湖南卫视", "湖北卫视"]);

        let many = (0..40).map(|i| format!("Channel {i}"));
        assert_eq!(
            matcher().aggregate_suggestions("Channel", many).len(),
            crate::config::defaults::DEFAULT_AGGREGATED_SUGGESTIONS
        );
    }

    proptest! {
        #[test]
        fn prop_match_never_below_threshold(
            query in "[a-zA-Z0-9 \\-]{0,12}",
            names in proptest::collection::vec("[a-zA-Z0-9 \\-]{0,12}", 0..8),
        ) {
            let list: Vec<ChannelRecord> = names
                .iter()
                .enumerate()
                .map(|(i, n)| ChannelRecord::new(i.to_string(), n.clone()))
                .collect();
            let m = matcher();
            if let Some(found) = m.find_match(&query, &list) {
                prop_assert!(found.score >= m.match_threshold);
                prop_assert!(found.score <= 100);
            }
        }

        #[test]
        fn prop_suggestions_sorted_descending(
            query in "[a-z0-9]{1,8}",
            names in proptest::collection::vec("[a-z0-9]{1,8}", 0..30),
        ) {
            let list: Vec<ChannelRecord> = names
                .iter()
                .enumerate()
                .map(|(i, n)| ChannelRecord::new(i.to_string(), n.clone()))
                .collect();
            let suggestions = matcher().suggest(&query, &list);
            prop_assert!(suggestions.len() <= DEFAULT_PER_SOURCE);

            let q = normalize_channel_name(&query);
            let scores: Vec<u8> = suggestions
                .iter()
                .map(|s| suggestion_score(&q, &normalize_channel_name(s)))
                .collect();
            prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
