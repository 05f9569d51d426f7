//! Canned pitch templates and placeholder rendering.

use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex should compile")
});

/// Placeholder names understood by [`render`].
pub const KNOWN_PLACEHOLDERS: &[&str] = &[
    "client_name",
    "podcast_title",
    "host_name",
    "angle",
    "bio",
    "sender_name",
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PitchTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub subject: &'static str,
    pub body: &'static str,
    /// Placeholders the template cannot be rendered without.
    pub requires: &'static [&'static str],
}

pub const TEMPLATES: &[PitchTemplate] = &[
    PitchTemplate {
        id: "intro",
        name: "Warm introduction",
        subject: "Guest idea for {{podcast_title}}: {{client_name}}",
        body: "Hi {{host_name}},\n\n\
               I've been listening to {{podcast_title}} and think {{client_name}} would be a great fit for an upcoming episode.\n\n\
               {{bio}}\n\n\
               One angle your listeners might enjoy: {{angle}}\n\n\
               Would you be open to a quick chat about having them on?\n\n\
               Best,\n{{sender_name}}",
        requires: &[],
    },
    PitchTemplate {
        id: "angle_first",
        name: "Lead with the angle",
        subject: "{{angle}}: a conversation for {{podcast_title}}",
        body: "Hi {{host_name}},\n\n\
               {{angle}}\n\n\
               That's the conversation {{client_name}} would love to have on {{podcast_title}}.\n\n\
               A little background: {{bio}}\n\n\
               Happy to send over a media kit or a few sample questions.\n\n\
               Thanks,\n{{sender_name}}",
        requires: &["angle"],
    },
    PitchTemplate {
        id: "follow_up",
        name: "Follow-up",
        subject: "Re: Guest idea for {{podcast_title}}",
        body: "Hi {{host_name}},\n\n\
               Just bubbling this up in case it got buried. {{client_name}} is still keen to join {{podcast_title}}.\n\n\
               They'd love to talk about {{angle}}.\n\n\
               Let me know either way!\n\n\
               {{sender_name}}",
        requires: &[],
    },
];

pub fn find_template(id: &str) -> Option<&'static PitchTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Values substituted into a template. Missing values render as empty, except
/// `host_name` which falls back to a generic greeting.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub client_name: Option<String>,
    pub podcast_title: Option<String>,
    pub host_name: Option<String>,
    pub angle: Option<String>,
    pub bio: Option<String>,
    pub sender_name: Option<String>,
}

const HOST_FALLBACK: &str = "there";

impl TemplateVars {
    fn lookup(&self, name: &str) -> Option<&str> {
        if name == "host_name" {
            return Some(
                self.host_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .unwrap_or(HOST_FALLBACK),
            );
        }
        let value = match name {
            "client_name" => &self.client_name,
            "podcast_title" => &self.podcast_title,
            "host_name" => &self.host_name,
            "angle" => &self.angle,
            "bio" => &self.bio,
            "sender_name" => &self.sender_name,
            _ => return None,
        };
        Some(value.as_deref().map(str::trim).unwrap_or(""))
    }

    /// Required placeholders of `template` that have no value.
    pub fn missing<'t>(&self, template: &'t PitchTemplate) -> Vec<&'t str> {
        template
            .requires
            .iter()
            .copied()
            .filter(|name| self.lookup(name).is_none_or(str::is_empty))
            .collect()
    }
}

fn has_blank_placeholder(text: &str, vars: &TemplateVars) -> bool {
    PLACEHOLDER_RE
        .captures_iter(text)
        .any(|caps| vars.lookup(&caps[1]).is_some_and(str::is_empty))
}

/// Replace `{{name}}` placeholders. Unknown names are left verbatim.
pub fn render(text: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| match vars.lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// A rendered subject/body pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPitch {
    pub subject: String,
    pub body: String,
}

/// Render a template. Body paragraphs whose placeholders have no value are
/// left out rather than rendered half-empty.
pub fn render_template(template: &PitchTemplate, vars: &TemplateVars) -> RenderedPitch {
    let body = template
        .body
        .split("\n\n")
        .filter(|paragraph| !has_blank_placeholder(paragraph, vars))
        .map(|paragraph| render(paragraph, vars))
        .collect::<Vec<_>>()
        .join("\n\n");
    RenderedPitch {
        subject: render(template.subject, vars),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars {
        TemplateVars {
            client_name: Some("Dana Reyes".into()),
            podcast_title: Some("Build Mode".into()),
            host_name: Some("Sam".into()),
            angle: Some("Bootstrapping past $1M ARR".into()),
            bio: None,
            sender_name: Some("Alex @ PGL".into()),
        }
    }

    #[test]
    fn renders_known_placeholders() {
        let out = render("Hi {{host_name}}, meet {{ client_name }}.", &vars());
        assert_eq!(out, "Hi Sam, meet Dana Reyes.");
    }

    #[test]
    fn missing_value_renders_empty() {
        assert_eq!(render("[{{bio}}]", &vars()), "[]");
    }

    #[test]
    fn unknown_placeholder_is_left_alone() {
        assert_eq!(
            render("{{episode_number}} / {{host_name}}", &vars()),
            "{{episode_number}} / Sam"
        );
    }

    #[test]
    fn every_template_only_uses_known_placeholders() {
        for template in TEMPLATES {
            for text in [template.subject, template.body] {
                for caps in PLACEHOLDER_RE.captures_iter(text) {
                    assert!(
                        KNOWN_PLACEHOLDERS.contains(&&caps[1]),
                        "{} uses {}",
                        template.id,
                        &caps[1]
                    );
                }
            }
        }
    }

    #[test]
    fn template_lookup_and_render() {
        let template = find_template("intro").expect("intro template exists");
        let rendered = render_template(template, &vars());
        assert_eq!(rendered.subject, "Guest idea for Build Mode: Dana Reyes");
        assert!(rendered.body.starts_with("Hi Sam,"));
        assert!(!rendered.body.contains("{{"));
        assert!(find_template("missing").is_none());
    }

    #[test]
    fn paragraphs_without_values_are_dropped() {
        let template = find_template("intro").unwrap();
        let vars = TemplateVars {
            host_name: None,
            angle: None,
            ..vars()
        };
        let rendered = render_template(template, &vars);
        assert!(rendered.body.starts_with("Hi there,\n\nI've been listening"));
        assert!(!rendered.body.contains("One angle"));
        assert!(!rendered.body.contains("\n\n\n"));
        assert!(rendered.body.ends_with("Best,\nAlex @ PGL"));
    }

    #[test]
    fn required_placeholders_are_reported() {
        let template = find_template("angle_first").unwrap();
        assert!(vars().missing(template).is_empty());
        let vars = TemplateVars {
            angle: Some("  ".into()),
            ..vars()
        };
        assert_eq!(vars.missing(template), vec!["angle"]);
    }
}
