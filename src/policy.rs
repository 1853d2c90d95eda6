//! Policy engine
//!
//! Maps a classified intent to a response strategy and an approved knowledge
//! entry. The intent→action table is a total `match`: the compiler, not a
//! runtime lookup with a silent default, proves every intent has a decision.

use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
use crate::models::{Action, ClassificationResult, Intent};
use tracing::debug;

impl Action {
    /// The one action for each intent. Restricted intents can never reach
    /// `Respond`, and nothing but `LimitCalc` can reach `Calculate`.
    pub fn for_intent(intent: Intent) -> Action {
        match intent {
            Intent::FinancialAdviceRestricted | Intent::BankStabilityRestricted => {
                Action::Restrict
            }
            Intent::LimitCalc => Action::Calculate,
            Intent::GeneralInfo
            | Intent::LimitExplanation
            | Intent::Coverage
            | Intent::NonCoverage
            | Intent::JointAccounts
            | Intent::ForeignCurrency
            | Intent::AccountTypes
            | Intent::EuBanks
            | Intent::PayoutTiming
            | Intent::Panic => Action::Respond,
        }
    }
}

/// Routing decision for one classified request.
#[derive(Debug, Clone)]
pub struct PolicyDecision<'a> {
    pub intent: Intent,
    pub confidence: f32,
    pub action: Action,
    pub entry: Option<&'a KnowledgeEntry>,
}

/// Evaluates the static policy table against a classification.
pub struct PolicyEngine {
    kb: KnowledgeBase,
}

impl PolicyEngine {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Pure decision: action from the total table, entry from the knowledge
    /// base (keyword-matched within the intent's category).
    pub fn decide<'a>(
        &'a self,
        classification: &ClassificationResult,
        question: &str,
    ) -> PolicyDecision<'a> {
        let intent = classification.intent;
        let action = Action::for_intent(intent);
        let entry = self.kb.best_match(intent.tag(), question);

        debug_assert!(!(intent.is_restricted() && action == Action::Respond));
        debug_assert!(action != Action::Calculate || intent == Intent::LimitCalc);

        debug!(
            intent = %intent,
            action = %action,
            entry = entry.map(|e| e.id.as_str()).unwrap_or("none"),
            "Policy decision"
        );

        PolicyDecision {
            intent,
            confidence: classification.confidence,
            action,
            entry,
        }
    }

    /// Approved text for a decision, with a neutral fallback when no entry
    /// matched.
    pub fn approved_answer<'a>(&self, decision: &PolicyDecision<'a>) -> &'a str {
        match decision.entry {
            Some(entry) => &entry.approved_answer,
            None => {
                "Žao mi je, nemam specifičnu informaciju o tome. \
                 Molim obratite se HAOD-u izravno za više informacija."
            }
        }
    }
}
