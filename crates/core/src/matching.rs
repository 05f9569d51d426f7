use crate::keywords::tokenize;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_MATCH_PLUGIN: &str = "keyword_overlap_v1";

/// Suggestions scoring below this are not created during discovery.
pub const DEFAULT_MATCH_THRESHOLD: i64 = 30;

/// The campaign side of a match: what the client wants to talk about.
#[derive(Debug, Clone, Default)]
pub struct CampaignProfile {
    pub keywords: Vec<String>,
}

/// The podcast side of a match: the free text we can search.
#[derive(Debug, Clone, Default)]
pub struct PodcastProfile {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    pub score: i64,
    pub matched_keywords: Vec<String>,
}

/// A scoring plugin maps one campaign/podcast pair to a 0..=100 score.
pub trait MatchScorePlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn score(&self, campaign: &CampaignProfile, podcast: &PodcastProfile) -> MatchOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScore {
    pub plugin: String,
    pub score: i64,
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchScoreError {
    #[error("unknown match plugin '{requested}'. available: {}", .available.join(", "))]
    UnknownPlugin {
        requested: String,
        available: Vec<String>,
    },
}

/// Runtime registry for match scoring plugins.
pub struct MatchScoreRegistry {
    plugins: HashMap<String, Arc<dyn MatchScorePlugin>>,
}

impl Default for MatchScoreRegistry {
    fn default() -> Self {
        let mut registry = Self {
            plugins: HashMap::new(),
        };
        registry.register(KeywordOverlapV1);
        registry.register(ZeroV1MatchPlugin);
        registry
    }
}

impl MatchScoreRegistry {
    pub fn register<P>(&mut self, plugin: P)
    where
        P: MatchScorePlugin + 'static,
    {
        self.plugins
            .insert(plugin.id().to_string(), Arc::new(plugin));
    }

    pub fn available_plugins(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    pub fn score_with(
        &self,
        plugin_id: &str,
        campaign: &CampaignProfile,
        podcast: &PodcastProfile,
    ) -> Result<MatchScore, MatchScoreError> {
        let plugin = self
            .plugins
            .get(plugin_id)
            .ok_or_else(|| MatchScoreError::UnknownPlugin {
                requested: plugin_id.to_string(),
                available: self.available_plugins(),
            })?;
        let outcome = plugin.score(campaign, podcast);
        Ok(MatchScore {
            plugin: plugin_id.to_string(),
            score: outcome.score,
            matched_keywords: outcome.matched_keywords,
        })
    }
}

/// Default keyword scorer.
///
/// Formula:
/// - a keyword hits when every one of its word tokens appears in the
///   podcast title, description or category
/// - score = round(100 * hits / keywords)
/// - +10 when the podcast category equals a keyword (case-insensitive)
/// - clamp to 0..100; no keywords scores 0
pub struct KeywordOverlapV1;

impl MatchScorePlugin for KeywordOverlapV1 {
    fn id(&self) -> &'static str {
        "keyword_overlap_v1"
    }

    fn score(&self, campaign: &CampaignProfile, podcast: &PodcastProfile) -> MatchOutcome {
        if campaign.keywords.is_empty() {
            return MatchOutcome::default();
        }

        let mut haystack = tokenize(&podcast.title);
        if let Some(description) = &podcast.description {
            haystack.extend(tokenize(description));
        }
        if let Some(category) = &podcast.category {
            haystack.extend(tokenize(category));
        }

        let matched_keywords: Vec<String> = campaign
            .keywords
            .iter()
            .filter(|keyword| {
                let needles = tokenize(keyword);
                !needles.is_empty() && needles.iter().all(|n| haystack.contains(n))
            })
            .cloned()
            .collect();

        let total = campaign.keywords.len() as i64;
        let hits = matched_keywords.len() as i64;
        let mut score = (hits * 100 + total / 2) / total;

        let category_hit = podcast.category.as_deref().is_some_and(|category| {
            campaign
                .keywords
                .iter()
                .any(|k| k.trim().eq_ignore_ascii_case(category.trim()))
        });
        if category_hit {
            score += 10;
        }

        MatchOutcome {
            score: score.clamp(0, 100),
            matched_keywords,
        }
    }
}

/// A deterministic scorer useful for testing and compatibility checks.
pub struct ZeroV1MatchPlugin;

impl MatchScorePlugin for ZeroV1MatchPlugin {
    fn id(&self) -> &'static str {
        "zero_v1"
    }

    fn score(&self, _campaign: &CampaignProfile, _podcast: &PodcastProfile) -> MatchOutcome {
        MatchOutcome::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn registry_contains_builtin_plugins() {
        let registry = MatchScoreRegistry::default();
        let names = registry.available_plugins();
        assert_eq!(names, vec!["keyword_overlap_v1", "zero_v1"]);
    }

    #[test]
    fn unknown_plugin_lists_available_ids() {
        let registry = MatchScoreRegistry::default();
        let err = registry
            .score_with(
                "nope",
                &testing::campaign(&["ai"]),
                &testing::podcast("AI Today", None, None),
            )
            .expect_err("unknown plugin must fail");
        assert!(err.to_string().contains("keyword_overlap_v1, zero_v1"));
    }

    #[test]
    fn full_overlap_scores_100() {
        let score = KeywordOverlapV1.score(
            &testing::campaign(&["startups", "venture capital"]),
            &testing::podcast(
                "Startup Stories",
                Some("Founders talk venture capital and startups"),
                None,
            ),
        );
        assert_eq!(score.score, 100);
        assert_eq!(score.matched_keywords, vec!["startups", "venture capital"]);
    }

    #[test]
    fn multi_word_keyword_needs_every_token() {
        let score = KeywordOverlapV1.score(
            &testing::campaign(&["venture capital", "fintech"]),
            &testing::podcast("Capital Markets Weekly", None, None),
        );
        assert_eq!(score.score, 0);
        assert!(score.matched_keywords.is_empty());
    }

    #[test]
    fn partial_overlap_rounds() {
        let score = KeywordOverlapV1.score(
            &testing::campaign(&["health", "nutrition", "sleep"]),
            &testing::podcast("Sleep Better", Some("nutrition tips"), None),
        );
        assert_eq!(score.score, 67);
    }

    #[test]
    fn category_bonus_is_capped() {
        let score = KeywordOverlapV1.score(
            &testing::campaign(&["Business"]),
            &testing::podcast("Business Hour", None, Some("business")),
        );
        assert_eq!(score.score, 100);

        let score = KeywordOverlapV1.score(
            &testing::campaign(&["business", "marketing"]),
            &testing::podcast("The Weekly", None, Some("Business")),
        );
        assert_eq!(score.score, 60);
    }

    #[test]
    fn no_keywords_scores_zero() {
        let score = KeywordOverlapV1.score(
            &testing::campaign(&[]),
            &testing::podcast("Anything", Some("at all"), Some("misc")),
        );
        assert_eq!(score, MatchOutcome::default());
    }
}
