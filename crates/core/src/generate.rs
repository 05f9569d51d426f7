//! Bio, angle and pitch generation.
//!
//! [`TemplateGenerator`] is deterministic and always available. Model-backed
//! generation lives in the server and falls back to it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::templates::{self, RenderedPitch, TemplateVars};

/// Maximum number of angles produced per campaign.
pub const MAX_ANGLES: usize = 5;

/// Everything known about a client that can feed a bio or angle.
#[derive(Debug, Clone, Default)]
pub struct ClientBrief {
    pub client_name: String,
    pub goals: Option<String>,
    pub target_audience: Option<String>,
    pub keywords: Vec<String>,
    /// Questionnaire answers keyed by question id.
    pub answers: BTreeMap<String, String>,
}

impl ClientBrief {
    fn answer(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.answers.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PitchAngle {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct PitchInput {
    pub client_name: String,
    pub podcast_title: String,
    pub host_name: Option<String>,
    pub bio: Option<String>,
    pub angle: Option<String>,
    pub sender_name: Option<String>,
}

pub trait ContentGenerator: Send + Sync {
    fn bio(&self, brief: &ClientBrief) -> String;
    fn angles(&self, brief: &ClientBrief) -> Vec<PitchAngle>;
    fn pitch(&self, input: &PitchInput) -> RenderedPitch;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl ContentGenerator for TemplateGenerator {
    fn bio(&self, brief: &ClientBrief) -> String {
        let name = brief.client_name.trim();
        let mut sentences = Vec::new();

        match brief.answer(&["title", "role", "headline"]) {
            Some(title) => sentences.push(format!("{name} is {}.", strip_period(title))),
            None if !brief.keywords.is_empty() => sentences.push(format!(
                "{name} is an expert in {}.",
                human_list(&brief.keywords[..brief.keywords.len().min(3)])
            )),
            None => sentences.push(format!("{name}.")),
        }

        if let Some(story) = brief.answer(&["story", "background"]) {
            sentences.push(ensure_period(story));
        }
        if let Some(expertise) = brief.answer(&["expertise", "topics"]) {
            sentences.push(format!("They speak about {}.", strip_period(expertise)));
        } else if brief.keywords.len() > 3 {
            sentences.push(format!(
                "They also speak about {}.",
                human_list(&brief.keywords[3..])
            ));
        }
        if let Some(achievements) = brief.answer(&["achievements", "highlights"]) {
            sentences.push(format!("Highlights include {}.", strip_period(achievements)));
        }
        if let Some(audience) = non_empty(brief.target_audience.as_deref()) {
            sentences.push(format!(
                "Their work resonates with {}.",
                strip_period(audience)
            ));
        }

        sentences.join(" ")
    }

    fn angles(&self, brief: &ClientBrief) -> Vec<PitchAngle> {
        let audience = non_empty(brief.target_audience.as_deref()).unwrap_or("your listeners");
        let goal = non_empty(brief.goals.as_deref());

        brief
            .keywords
            .iter()
            .take(MAX_ANGLES)
            .enumerate()
            .map(|(i, keyword)| {
                let (title, mut description) = match i % 3 {
                    0 => (
                        format!("What most people get wrong about {keyword}"),
                        format!(
                            "{} unpacks the common myths around {keyword} and what actually works for {audience}.",
                            brief.client_name
                        ),
                    ),
                    1 => (
                        format!("The playbook: {keyword} from zero to one"),
                        format!(
                            "A practical, step-by-step conversation on {keyword} with lessons {audience} can apply the same week."
                        ),
                    ),
                    _ => (
                        format!("Where {keyword} is heading next"),
                        format!(
                            "{} shares a forward-looking take on {keyword} and the shifts {audience} should prepare for.",
                            brief.client_name
                        ),
                    ),
                };
                if let Some(goal) = goal {
                    description.push_str(&format!(" Ties back to: {}.", strip_period(goal)));
                }
                PitchAngle { title, description }
            })
            .collect()
    }

    fn pitch(&self, input: &PitchInput) -> RenderedPitch {
        let vars = TemplateVars {
            client_name: Some(input.client_name.clone()),
            podcast_title: Some(input.podcast_title.clone()),
            host_name: Some(
                input
                    .host_name
                    .clone()
                    .filter(|h| !h.trim().is_empty())
                    .unwrap_or_else(|| "there".to_string()),
            ),
            angle: input.angle.clone(),
            bio: input.bio.clone(),
            sender_name: input.sender_name.clone(),
        };
        let template = if input.angle.is_some() {
            "angle_first"
        } else {
            "intro"
        };
        match templates::find_template(template) {
            Some(t) => templates::render_template(t, &vars),
            None => RenderedPitch {
                subject: format!("Guest idea for {}", input.podcast_title),
                body: String::new(),
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn strip_period(text: &str) -> &str {
    text.trim().trim_end_matches('.')
}

fn ensure_period(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

/// "a", "a and b", "a, b and c".
fn human_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn bio_prefers_questionnaire_title() {
        let mut brief = testing::brief("Dana Reyes", &["saas", "pricing"]);
        brief
            .answers
            .insert("title".into(), "the founder of Tally.".into());
        brief
            .answers
            .insert("story".into(), "She bootstrapped to $2M ARR".into());
        let bio = TemplateGenerator.bio(&brief);
        assert_eq!(
            bio,
            "Dana Reyes is the founder of Tally. She bootstrapped to $2M ARR."
        );
    }

    #[test]
    fn bio_falls_back_to_keywords() {
        let mut brief = testing::brief("Sam", &["ai", "ethics", "policy", "law"]);
        brief.target_audience = Some("policy makers".into());
        let bio = TemplateGenerator.bio(&brief);
        assert_eq!(
            bio,
            "Sam is an expert in ai, ethics and policy. They also speak about law. \
             Their work resonates with policy makers."
        );
    }

    #[test]
    fn angles_cap_and_mention_goal() {
        let mut brief = testing::brief("Sam", &["a", "b", "c", "d", "e", "f"]);
        brief.goals = Some("Grow newsletter signups.".into());
        let angles = TemplateGenerator.angles(&brief);
        assert_eq!(angles.len(), MAX_ANGLES);
        assert!(angles[0].title.contains('a'));
        assert!(angles
            .iter()
            .all(|a| a.description.ends_with("Ties back to: Grow newsletter signups.")));
    }

    #[test]
    fn no_keywords_means_no_angles() {
        assert!(TemplateGenerator.angles(&testing::brief("Sam", &[])).is_empty());
    }

    #[test]
    fn pitch_uses_angle_template_when_angle_given() {
        let draft = TemplateGenerator.pitch(&PitchInput {
            client_name: "Dana".into(),
            podcast_title: "Build Mode".into(),
            host_name: None,
            bio: Some("Founder.".into()),
            angle: Some("Pricing without fear".into()),
            sender_name: Some("Alex".into()),
        });
        assert_eq!(draft.subject, "Pricing without fear: a conversation for Build Mode");
        assert!(draft.body.starts_with("Hi there,"));
    }

    #[test]
    fn human_list_formats() {
        let items: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(human_list(&items[..1]), "x");
        assert_eq!(human_list(&items[..2]), "x and y");
        assert_eq!(human_list(&items), "x, y and z");
    }
}
