//! Intent classifier
//!
//! Orchestrates the pattern matcher and the optional LLM collaborator under a
//! confidence-gated fallback policy:
//!
//! 1. Run the rules.
//! 2. Rules confident (≥ rules_skip_threshold) → use rules, skip the LLM.
//! 3. Restricted intent at medium confidence (≥ restricted_skip_threshold) →
//!    use rules. Restricted categories never pay LLM cost or latency once
//!    reasonably matched, which also bounds worst-case exposure.
//! 4. Otherwise consult the LLM.
//! 5. LLM failure or out-of-catalog reply → rules result regardless of
//!    confidence. A request is never left unclassified by an outage.
//!
//! The gate itself is a pure function, kept separate from the I/O call so the
//! skip logic is testable without a network.

use crate::calculator;
use crate::config::{AssistantConfig, ClassificationMode};
use crate::llm::LlmCollaborator;
use crate::matcher::PatternMatcher;
use crate::models::{ClassificationResult, ClassificationSource, Intent};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of the pure gating decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    UseRules,
    ConsultLlm,
}

/// Decide whether the rules result stands or the LLM is consulted.
pub fn gate(rules: &ClassificationResult, config: &AssistantConfig) -> Gate {
    if config.mode == ClassificationMode::Rules {
        return Gate::UseRules;
    }

    if rules.confidence >= config.rules_skip_threshold {
        return Gate::UseRules;
    }

    if rules.intent.is_restricted() && rules.confidence >= config.restricted_skip_threshold {
        return Gate::UseRules;
    }

    Gate::ConsultLlm
}

pub struct Classifier {
    config: AssistantConfig,
    llm: Option<Arc<dyn LlmCollaborator>>,
}

impl Classifier {
    pub fn new(config: AssistantConfig, llm: Option<Arc<dyn LlmCollaborator>>) -> Self {
        Self { config, llm }
    }

    /// Classify user text. Always returns a result, never an error.
    pub async fn classify(&self, text: &str) -> ClassificationResult {
        let rules = PatternMatcher::classify(text);

        match gate(&rules, &self.config) {
            Gate::UseRules => {
                debug!(
                    intent = %rules.intent,
                    confidence = rules.confidence,
                    "Rules confident, skipping LLM"
                );
                rules
            }
            Gate::ConsultLlm => self.consult_llm(text, rules).await,
        }
    }

    async fn consult_llm(&self, text: &str, rules: ClassificationResult) -> ClassificationResult {
        let Some(llm) = self.llm.as_ref() else {
            return rules;
        };

        info!(
            rules_intent = %rules.intent,
            rules_confidence = rules.confidence,
            "Low rules confidence, consulting LLM"
        );

        match llm.classify_intent(text).await {
            Ok(intent) => ClassificationResult {
                intent,
                confidence: 0.95,
                source: ClassificationSource::Llm,
                entities: if intent == Intent::LimitCalc {
                    calculator::parse_deposits(text)
                } else {
                    Vec::new()
                },
            },
            Err(e) => {
                warn!("LLM classification failed, using rules result: {}", e);
                rules
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssistantError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockLlm {
        reply: Option<Intent>,
        calls: AtomicUsize,
    }

    impl MockLlm {
        fn unavailable() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn replying(intent: Intent) -> Self {
            Self {
                reply: Some(intent),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmCollaborator for MockLlm {
        async fn classify_intent(&self, _text: &str) -> Result<Intent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(intent) => Ok(intent),
                None => Err(AssistantError::LlmUnavailable("simulated outage".to_string())),
            }
        }

        async fn phrase_answer(&self, _question: &str, approved: &str) -> Result<String> {
            Ok(approved.to_string())
        }
    }

    fn llm_config() -> AssistantConfig {
        let mut config = AssistantConfig::rules_only();
        config.mode = ClassificationMode::Llm;
        config
    }

    #[test]
    fn gate_skips_llm_on_high_confidence() {
        let rules = ClassificationResult::rules(Intent::Coverage, 0.95);
        assert_eq!(gate(&rules, &llm_config()), Gate::UseRules);
    }

    #[test]
    fn gate_skips_llm_for_medium_confidence_restricted() {
        let rules = ClassificationResult::rules(Intent::FinancialAdviceRestricted, 0.75);
        assert_eq!(gate(&rules, &llm_config()), Gate::UseRules);

        // The same confidence on an unrestricted intent consults the LLM.
        let rules = ClassificationResult::rules(Intent::Coverage, 0.75);
        assert_eq!(gate(&rules, &llm_config()), Gate::ConsultLlm);
    }

    #[test]
    fn gate_in_rules_mode_never_consults() {
        let rules = ClassificationResult::rules(Intent::GeneralInfo, 0.1);
        assert_eq!(gate(&rules, &AssistantConfig::rules_only()), Gate::UseRules);
    }

    #[tokio::test]
    async fn restricted_match_never_contacts_llm() {
        let mock = Arc::new(MockLlm::replying(Intent::GeneralInfo));
        let classifier = Classifier::new(llm_config(), Some(mock.clone()));

        let result = classifier
            .classify("Trebao bih prebaciti novac u drugu banku?")
            .await;

        assert_eq!(result.intent, Intent::FinancialAdviceRestricted);
        assert_eq!(result.source, ClassificationSource::Rules);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn ambiguous_question_consults_llm() {
        let mock = Arc::new(MockLlm::replying(Intent::Coverage));
        let classifier = Classifier::new(llm_config(), Some(mock.clone()));

        let result = classifier
            .classify("Zanima me kako to sve skupa funkcionira kod vas")
            .await;

        assert_eq!(result.source, ClassificationSource::Llm);
        assert_eq!(result.intent, Intent::Coverage);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn llm_outage_falls_back_to_rules() {
        let mock = Arc::new(MockLlm::unavailable());
        let classifier = Classifier::new(llm_config(), Some(mock.clone()));

        let result = classifier.classify("Dobar dan, imam jedno pitanje").await;

        assert_eq!(result.source, ClassificationSource::Rules);
        assert_eq!(result.intent, Intent::GeneralInfo);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn rules_mode_skips_llm_entirely() {
        let mock = Arc::new(MockLlm::replying(Intent::Panic));
        let classifier = Classifier::new(AssistantConfig::rules_only(), Some(mock.clone()));

        let result = classifier.classify("Dobar dan, imam jedno pitanje").await;

        assert_eq!(result.source, ClassificationSource::Rules);
        assert_eq!(mock.call_count(), 0);
    }
}
