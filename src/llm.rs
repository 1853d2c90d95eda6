//! Gemini API collaborator
//!
//! The LLM is an external collaborator with two duties: classify an intent
//! when the rules are unsure, and phrase an approved answer in the assistant
//! persona. It is untrusted for compliance purposes: everything it produces
//! still passes through the guardrail filter.
//!
//! Uses a long-lived reqwest::Client for connection pooling, with the bounded
//! timeout from configuration.

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use crate::models::Intent;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// System prompt for intent classification, kept terse for token economy.
fn classifier_prompt() -> String {
    let catalog = Intent::CATALOG
        .iter()
        .map(|i| i.tag())
        .collect::<Vec<_>>()
        .join("|");

    format!(
        "Classify a Croatian deposit-insurance query. Reply with ONE category name only.\n\
         \n\
         Categories:\n{catalog}\n\
         \n\
         coverage=bank fails/lose money, payout_timing=when get money, \
         limit_calc=specific amounts, panic=news worried, \
         financial_advice_restricted=asking advice, \
         bank_stability_restricted=is bank X safe"
    )
}

/// System prompt for answer phrasing: informational only, no advice verbs,
/// Croatian, calm tone.
const FORMATTER_SYSTEM_PROMPT: &str = "\
Ti si digitalni asistent agencije za osiguranje depozita.

STROGA PRAVILA (ZAKONSKA OBVEZA):
- NIKADA ne daji financijske savjete
- NIKADA ne koristi rijeci: trebao bi, trebala bi, preporucujem, savjetujem, moras
- NIKADA ne procjenjuj stabilnost banaka
- NIKADA ne garantiraj ishode

DOPUSTENO:
- Koristi ISKLJUCIVO odobreni sadrzaj koji ti se daje
- Objasnjavaj kako sustav funkcionira (informativno, ne savjetodavno)
- Budi smiren, jednostavan i informativan
- Odgovaraj na hrvatskom jeziku";

/// External text-completion collaborator. A trait seam so the classifier and
/// pipeline can be tested against mocks without network access.
#[async_trait]
pub trait LlmCollaborator: Send + Sync {
    /// Classify user text into the fixed intent catalog.
    async fn classify_intent(&self, text: &str) -> Result<Intent>;

    /// Phrase an approved answer for the user's question.
    async fn phrase_answer(&self, question: &str, approved_answer: &str) -> Result<String>;
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model_name: String,
    fallback_model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.llm_timeout)
            .build()
            .map_err(AssistantError::HttpError)?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model_name: config.model_name.clone(),
            fallback_model: config.fallback_model.clone(),
            base_url: config.gemini_api_url.clone(),
        })
    }

    /// One generateContent call against a specific model.
    async fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        user_text: &str,
        temperature: f32,
        max_output_tokens: i32,
    ) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AssistantError::LlmUnavailable(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: user_text.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
        };

        info!(model = %model, "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(AssistantError::LlmUnavailable(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                return map_transport_error(e);
            }
            error!("Failed to parse Gemini response: {}", e);
            AssistantError::LlmUnavailable(format!("Gemini parse error: {}", e))
        })?;

        let answer = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AssistantError::LlmUnavailable("Empty response from Gemini".to_string())
            })?;

        Ok(answer)
    }

    /// Primary model first; one attempt against the configured fallback model
    /// when Gemini rejects the request. A transport timeout is returned
    /// directly: the primary already cost a full `llm_timeout`, and a second
    /// attempt would double worst-case latency on the exact path the rules
    /// fallback upstream is meant to bound.
    async fn generate_with_fallback(
        &self,
        system_prompt: &str,
        user_text: &str,
        temperature: f32,
        max_output_tokens: i32,
    ) -> Result<String> {
        match self
            .generate(&self.model_name, system_prompt, user_text, temperature, max_output_tokens)
            .await
        {
            Ok(answer) => Ok(answer),
            Err(err @ AssistantError::LlmTimeout(_)) => Err(err),
            Err(primary_err) if self.fallback_model != self.model_name => {
                warn!(
                    "Primary model '{}' failed ({}), trying fallback '{}'",
                    self.model_name, primary_err, self.fallback_model
                );
                self.generate(
                    &self.fallback_model,
                    system_prompt,
                    user_text,
                    temperature,
                    max_output_tokens,
                )
                .await
            }
            Err(primary_err) => Err(primary_err),
        }
    }
}

#[async_trait]
impl LlmCollaborator for GeminiClient {
    async fn classify_intent(&self, text: &str) -> Result<Intent> {
        let reply = self
            .generate_with_fallback(&classifier_prompt(), text, 0.0, 50)
            .await?;

        parse_intent_reply(&reply)
    }

    async fn phrase_answer(&self, question: &str, approved_answer: &str) -> Result<String> {
        let prompt = format!(
            "Korisnikovo pitanje: {}\n\nOdobrene informacije:\n{}\n\n\
             Formuliraj konacan odgovor na hrvatskom jeziku - prijateljski, smireno i informativno.",
            question, approved_answer
        );

        self.generate_with_fallback(FORMATTER_SYSTEM_PROMPT, &prompt, 0.3, 1000)
            .await
    }
}

/// Timeouts and other transport failures map to distinct variants: the
/// fallback-model attempt only applies to the latter.
fn map_transport_error(e: reqwest::Error) -> AssistantError {
    if e.is_timeout() {
        warn!("Gemini API timed out: {}", e);
        AssistantError::LlmTimeout(format!("Gemini API timeout: {}", e))
    } else {
        error!("Gemini API request failed: {}", e);
        AssistantError::LlmUnavailable(format!("Gemini API error: {}", e))
    }
}

/// Map a model reply onto the catalog; a partial match is accepted, anything
/// else is out-of-catalog.
fn parse_intent_reply(reply: &str) -> Result<Intent> {
    let cleaned = reply.trim().to_lowercase();
    if cleaned.is_empty() {
        return Err(AssistantError::OutOfCatalog(cleaned));
    }

    if let Ok(intent) = cleaned.parse::<Intent>() {
        return Ok(intent);
    }

    for intent in Intent::CATALOG {
        if cleaned.contains(intent.tag()) || intent.tag().contains(cleaned.as_str()) {
            return Ok(intent);
        }
    }

    Err(AssistantError::OutOfCatalog(cleaned))
}

//
// ================= Wire types =================
//

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
