//! Bio, angle and pitch generation for the HTTP layer.
//!
//! An OpenAI-compatible chat completions endpoint is used when configured.
//! Any failure there (transport, status, unparseable output) falls back to
//! the deterministic template generator.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use pgl_api::deploy;
use pgl_core::generate::{
    ClientBrief, ContentGenerator, PitchAngle, PitchInput, TemplateGenerator, MAX_ANGLES,
};
use pgl_core::templates::RenderedPitch;

const LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const TEMPLATE_GENERATOR: &str = "template";

/// Generated content plus the name of whatever produced it.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub value: T,
    pub generator: String,
}

#[derive(Clone)]
struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Clone)]
pub struct Generator {
    template: TemplateGenerator,
    llm: Option<LlmClient>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct PitchReply {
    subject: String,
    body: String,
}

const SYSTEM_PROMPT: &str = "You write for a podcast guest booking agency. \
Be specific, warm and concise. Never invent credentials that are not in the brief.";

impl Generator {
    pub fn template_only() -> Self {
        Self {
            template: TemplateGenerator,
            llm: None,
        }
    }

    /// Configure from `PGL_LLM_BASE_URL`, `PGL_LLM_API_KEY` and `PGL_LLM_MODEL`.
    pub fn from_env() -> Result<Self> {
        let Some(base_url) = std::env::var(deploy::ENV_LLM_BASE_URL)
            .ok()
            .filter(|s| !s.is_empty())
        else {
            return Ok(Self::template_only());
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()
            .context("building LLM client")?;
        let model = std::env::var(deploy::ENV_LLM_MODEL)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        tracing::info!("LLM generation enabled: {base_url} ({model})");
        Ok(Self {
            template: TemplateGenerator,
            llm: Some(LlmClient {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: std::env::var(deploy::ENV_LLM_API_KEY)
                    .ok()
                    .filter(|s| !s.is_empty()),
                model,
            }),
        })
    }

    fn fallback<T>(&self, value: T) -> Generated<T> {
        Generated {
            value,
            generator: TEMPLATE_GENERATOR.to_string(),
        }
    }

    pub async fn bio(&self, brief: &ClientBrief) -> Generated<String> {
        if let Some(llm) = &self.llm {
            let prompt = format!(
                "Write a third-person guest bio of at most 120 words.\n\n{}",
                describe_brief(brief)
            );
            match llm.complete(&prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Generated {
                        value: text.trim().to_string(),
                        generator: llm.model.clone(),
                    };
                }
                Ok(_) => tracing::warn!("LLM returned an empty bio; using template"),
                Err(e) => tracing::warn!("LLM bio generation failed, using template: {e:#}"),
            }
        }
        self.fallback(self.template.bio(brief))
    }

    pub async fn angles(&self, brief: &ClientBrief) -> Generated<Vec<PitchAngle>> {
        if let Some(llm) = &self.llm {
            let prompt = format!(
                "Suggest up to {MAX_ANGLES} podcast interview angles. Reply with only a JSON \
                 array of objects with \"title\" and \"description\" strings.\n\n{}",
                describe_brief(brief)
            );
            let parsed = llm.complete(&prompt).await.and_then(|text| {
                serde_json::from_str::<Vec<PitchAngle>>(strip_code_fence(&text))
                    .map_err(|e| anyhow!("unparseable angles: {e}"))
            });
            match parsed {
                Ok(mut angles) if !angles.is_empty() => {
                    angles.retain(|a| !a.title.trim().is_empty());
                    angles.truncate(MAX_ANGLES);
                    return Generated {
                        value: angles,
                        generator: llm.model.clone(),
                    };
                }
                Ok(_) => tracing::warn!("LLM returned no angles; using template"),
                Err(e) => tracing::warn!("LLM angle generation failed, using template: {e:#}"),
            }
        }
        self.fallback(self.template.angles(brief))
    }

    pub async fn pitch(&self, input: &PitchInput) -> Generated<RenderedPitch> {
        if let Some(llm) = &self.llm {
            let prompt = format!(
                "Write a short pitch email to a podcast host proposing a guest. Reply with only \
                 a JSON object with \"subject\" and \"body\" strings.\n\n\
                 Guest: {}\nPodcast: {}\nHost: {}\nAngle: {}\nGuest bio: {}\nSigned: {}",
                input.client_name,
                input.podcast_title,
                input.host_name.as_deref().unwrap_or("unknown"),
                input.angle.as_deref().unwrap_or("(choose the best fit)"),
                input.bio.as_deref().unwrap_or("(none)"),
                input.sender_name.as_deref().unwrap_or("the team"),
            );
            let parsed = llm.complete(&prompt).await.and_then(|text| {
                serde_json::from_str::<PitchReply>(strip_code_fence(&text))
                    .map_err(|e| anyhow!("unparseable pitch: {e}"))
            });
            match parsed {
                Ok(reply) if !reply.subject.trim().is_empty() && !reply.body.trim().is_empty() => {
                    return Generated {
                        value: RenderedPitch {
                            subject: reply.subject.trim().to_string(),
                            body: reply.body.trim().to_string(),
                        },
                        generator: llm.model.clone(),
                    };
                }
                Ok(_) => tracing::warn!("LLM returned an empty pitch; using template"),
                Err(e) => tracing::warn!("LLM pitch generation failed, using template: {e:#}"),
            }
        }
        self.fallback(self.template.pitch(input))
    }
}

impl LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.7,
        };
        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.context("LLM request")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("LLM returned status {}", status.as_u16()));
        }
        let parsed: ChatResponse = response.json().await.context("decoding LLM response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("LLM response had no content"))
    }
}

fn describe_brief(brief: &ClientBrief) -> String {
    let mut out = format!("Client: {}\n", brief.client_name);
    if let Some(goals) = &brief.goals {
        out.push_str(&format!("Goals: {goals}\n"));
    }
    if let Some(audience) = &brief.target_audience {
        out.push_str(&format!("Target audience: {audience}\n"));
    }
    if !brief.keywords.is_empty() {
        out.push_str(&format!("Keywords: {}\n", brief.keywords.join(", ")));
    }
    for (question, answer) in &brief.answers {
        if !answer.trim().is_empty() {
            out.push_str(&format!("{question}: {}\n", answer.trim()));
        }
    }
    out
}

/// Models like to wrap JSON in markdown fences.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief() -> ClientBrief {
        ClientBrief {
            client_name: "Dana Lee".into(),
            goals: Some("Reach founders".into()),
            keywords: vec!["ai".into(), "ethics".into()],
            ..Default::default()
        }
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  [] "), "[]");
    }

    #[test]
    fn brief_description_lists_known_fields() {
        let text = describe_brief(&brief());
        assert!(text.contains("Client: Dana Lee"));
        assert!(text.contains("Keywords: ai, ethics"));
        assert!(!text.contains("Target audience"));
    }

    #[tokio::test]
    async fn template_only_reports_template() {
        let generator = Generator::template_only();
        let bio = generator.bio(&brief()).await;
        assert_eq!(bio.generator, TEMPLATE_GENERATOR);
        assert!(!bio.value.is_empty());
        let angles = generator.angles(&brief()).await;
        assert!(angles.value.len() <= MAX_ANGLES);
    }

    #[tokio::test]
    async fn unreachable_llm_falls_back() {
        let generator = Generator {
            template: TemplateGenerator,
            llm: Some(LlmClient {
                client: reqwest::Client::builder()
                    .timeout(Duration::from_secs(2))
                    .build()
                    .unwrap(),
                base_url: "http://127.0.0.1:9".into(),
                api_key: None,
                model: "test-model".into(),
            }),
        };
        let pitch = generator
            .pitch(&PitchInput {
                client_name: "Dana Lee".into(),
                podcast_title: "Build Mode".into(),
                ..Default::default()
            })
            .await;
        assert_eq!(pitch.generator, TEMPLATE_GENERATOR);
        assert!(!pitch.value.subject.is_empty());
    }
}
