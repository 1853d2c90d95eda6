//! Request pipeline
//!
//! CLASSIFY → POLICY → {RESTRICT | CALCULATE | RESPOND} → GUARDRAIL → DONE.
//! No back-edges: a failed calculation terminates in a clarification request
//! instead of retrying, and a guardrail match substitutes the disclaimer
//! without ever re-generating the offending text.
//!
//! `process` never returns an error. The legal requirement is "never give
//! unfiltered output", not "never fail": every internal fault degrades to the
//! clarification or disclaimer template.

use crate::calculator;
use crate::classifier::Classifier;
use crate::config::{AssistantConfig, ClassificationMode};
use crate::error::Result;
use crate::guardrail;
use crate::knowledge::KnowledgeBase;
use crate::llm::{GeminiClient, LlmCollaborator};
use crate::models::{Action, ProcessingResult};
use crate::policy::PolicyEngine;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_RESPONSE_CHARS: usize = 2000;

/// Returned when the calculator cannot find any amounts, or when an internal
/// fault leaves no better answer.
pub const CLARIFICATION_RESPONSE: &str = "Nisam uspio prepoznati iznose u vašem pitanju. \
Molim navedite iznos i banku, na primjer: \"Imam 80.000 € u jednoj banci i 50.000 € u drugoj. \
Koliko mi je osigurano?\"";

/// The assembled pipeline: classifier, policy engine and guardrail over the
/// process-wide read-only reference data.
pub struct Assistant {
    config: AssistantConfig,
    classifier: Classifier,
    policy: PolicyEngine,
    llm: Option<Arc<dyn LlmCollaborator>>,
}

impl Assistant {
    /// Build the assistant from configuration. Fails fast when the knowledge
    /// base is incomplete; request handling itself cannot fail.
    pub fn new(config: AssistantConfig) -> Result<Self> {
        let llm: Option<Arc<dyn LlmCollaborator>> = match config.mode {
            ClassificationMode::Llm => Some(Arc::new(GeminiClient::new(&config)?)),
            ClassificationMode::Rules => None,
        };
        Self::with_collaborator(config, llm)
    }

    /// Build with an explicit collaborator (tests inject mocks here).
    pub fn with_collaborator(
        config: AssistantConfig,
        llm: Option<Arc<dyn LlmCollaborator>>,
    ) -> Result<Self> {
        let kb = KnowledgeBase::load()?;
        let policy = PolicyEngine::new(kb);
        let classifier = Classifier::new(config.clone(), llm.clone());

        Ok(Self {
            config,
            classifier,
            policy,
            llm,
        })
    }

    /// Process one user question end to end.
    pub async fn process(&self, question: &str) -> ProcessingResult {
        let request_id = Uuid::new_v4();
        let classification = self.classifier.classify(question).await;

        let decision = self.policy.decide(&classification, question);
        let approved = self.policy.approved_answer(&decision).to_string();

        let mut calculation = None;
        let mut llm_used = false;

        let response = match decision.action {
            // Restricted: the template goes out verbatim, never LLM-phrased.
            Action::Restrict => approved,

            Action::Calculate => match calculator::parse_and_calculate(question) {
                Ok(result) => {
                    let text = format!(
                        "{}\n\n**Izračun:**\n{}",
                        approved,
                        result.format_result()
                    );
                    calculation = Some(result);
                    text
                }
                Err(e) => {
                    // Terminal clarification state, no retry.
                    warn!(request_id = %request_id, "Calculation failed: {}", e);
                    CLARIFICATION_RESPONSE.to_string()
                }
            },

            Action::Respond => match &self.llm {
                Some(llm) => match llm.phrase_answer(question, &approved).await {
                    Ok(phrased) => {
                        llm_used = true;
                        phrased
                    }
                    Err(e) => {
                        warn!(
                            request_id = %request_id,
                            "LLM phrasing failed, returning approved text: {}", e
                        );
                        approved
                    }
                },
                None => approved,
            },
        };

        // Unconditional output filtering, whatever branch produced the text.
        let (filtered, verdict) = guardrail::filter(&response);
        if !verdict.passed {
            warn!(
                request_id = %request_id,
                intent = %classification.intent,
                phrase = verdict.matched_phrase.as_deref().unwrap_or(""),
                "Outbound response replaced by disclaimer"
            );
        }
        let final_text = guardrail::clamp_length(&filtered, MAX_RESPONSE_CHARS);

        info!(
            request_id = %request_id,
            intent = %classification.intent,
            confidence = classification.confidence,
            action = %decision.action,
            llm_used = llm_used,
            guardrail_passed = verdict.passed,
            "Request processed"
        );

        ProcessingResult {
            request_id,
            intent: classification.intent,
            confidence: classification.confidence,
            source: classification.source,
            action: decision.action,
            calculation,
            response: final_text,
            guardrail: verdict,
            llm_used,
            processed_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }
}
