//! End-to-end pipeline scenarios, rules mode unless a mock collaborator is
//! injected. No test here touches the network.

use async_trait::async_trait;
use deposit_insurance_assistant::config::{AssistantConfig, ClassificationMode};
use deposit_insurance_assistant::error::{AssistantError, Result};
use deposit_insurance_assistant::guardrail::GUARDRAIL_RESPONSE;
use deposit_insurance_assistant::llm::LlmCollaborator;
use deposit_insurance_assistant::models::{Action, ClassificationSource, Intent};
use deposit_insurance_assistant::pipeline::{Assistant, CLARIFICATION_RESPONSE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted collaborator: either fully unavailable, or replying with fixed
/// classification and phrasing.
struct MockLlm {
    classify_reply: Option<Intent>,
    phrase_reply: Option<String>,
    classify_calls: AtomicUsize,
}

impl MockLlm {
    fn unavailable() -> Self {
        Self {
            classify_reply: None,
            phrase_reply: None,
            classify_calls: AtomicUsize::new(0),
        }
    }

    fn phrasing(text: &str) -> Self {
        Self {
            classify_reply: Some(Intent::GeneralInfo),
            phrase_reply: Some(text.to_string()),
            classify_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmCollaborator for MockLlm {
    async fn classify_intent(&self, _text: &str) -> Result<Intent> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.classify_reply
            .ok_or_else(|| AssistantError::LlmUnavailable("simulated outage".to_string()))
    }

    async fn phrase_answer(&self, _question: &str, _approved: &str) -> Result<String> {
        self.phrase_reply
            .clone()
            .ok_or_else(|| AssistantError::LlmUnavailable("simulated outage".to_string()))
    }
}

fn rules_assistant() -> Assistant {
    Assistant::new(AssistantConfig::rules_only()).unwrap()
}

fn llm_assistant(mock: Arc<MockLlm>) -> Assistant {
    let mut config = AssistantConfig::rules_only();
    config.mode = ClassificationMode::Llm;
    Assistant::with_collaborator(config, Some(mock)).unwrap()
}

#[tokio::test]
async fn transfer_advice_is_restricted_without_llm() {
    let assistant = rules_assistant();
    let result = assistant
        .process("Trebao bih prebaciti novac u drugu banku?")
        .await;

    assert_eq!(result.intent, Intent::FinancialAdviceRestricted);
    assert_eq!(result.source, ClassificationSource::Rules);
    assert_eq!(result.action, Action::Restrict);
    assert!(!result.llm_used);
    assert!(result.guardrail.passed);
    assert!(result.response.contains("Ne mogu davati financijske savjete"));
}

#[tokio::test]
async fn restricted_response_is_byte_identical_across_inputs() {
    let assistant = rules_assistant();

    let first = assistant
        .process("Trebao bih prebaciti novac u drugu banku?")
        .await;
    let second = assistant
        .process("Daj mi savjet, što da napravim s novcem?")
        .await;

    assert_eq!(first.intent, Intent::FinancialAdviceRestricted);
    assert_eq!(second.intent, Intent::FinancialAdviceRestricted);
    assert_eq!(first.response, second.response);
}

#[tokio::test]
async fn stability_question_never_reaches_the_llm() {
    let mock = Arc::new(MockLlm::phrasing("nebitno"));
    let assistant = llm_assistant(mock.clone());

    let result = assistant
        .process("Je li banka X sigurna ili hoće li propasti?")
        .await;

    assert_eq!(result.intent, Intent::BankStabilityRestricted);
    assert_eq!(result.action, Action::Restrict);
    assert_eq!(mock.classify_calls.load(Ordering::SeqCst), 0);
    assert!(!result.llm_used);
    assert!(result.response.contains("Ne procjenjujem stabilnost"));
}

#[tokio::test]
async fn two_bank_calculation_round_trip() {
    let assistant = rules_assistant();
    let result = assistant.process("80.000 € u Banci A, 150k u Banci B").await;

    assert_eq!(result.intent, Intent::LimitCalc);
    assert_eq!(result.action, Action::Calculate);

    let calc = result.calculation.expect("calculation present");
    assert_eq!(calc.deposits.len(), 2);
    assert_eq!(calc.deposits[0].bank_name, "Banka A");
    assert_eq!(calc.deposits[0].amount, 80_000.0);
    assert_eq!(calc.deposits[1].bank_name, "Banka B");
    assert_eq!(calc.deposits[1].amount, 150_000.0);
    assert_eq!(calc.total_insured, 180_000.0);
    assert_eq!(calc.total_excess, 50_000.0);

    assert!(result.response.contains("**Izračun:**"));
    assert!(result.guardrail.passed);
}

#[tokio::test]
async fn same_bank_deposits_sum_before_limit() {
    let assistant = rules_assistant();
    let result = assistant.process("Imam 50k u A i 60k u A").await;

    assert_eq!(result.action, Action::Calculate);
    let calc = result.calculation.expect("calculation present");
    assert_eq!(calc.deposits.len(), 1);
    assert_eq!(calc.deposits[0].amount, 110_000.0);
    assert_eq!(calc.total_insured, 100_000.0);
    assert_eq!(calc.total_excess, 10_000.0);
}

#[tokio::test]
async fn calc_intent_without_amounts_asks_for_clarification() {
    let assistant = rules_assistant();
    let result = assistant.process("Izračunaj koliko mi je osigurano").await;

    assert_eq!(result.intent, Intent::LimitCalc);
    assert_eq!(result.action, Action::Calculate);
    assert!(result.calculation.is_none());
    assert_eq!(result.response, CLARIFICATION_RESPONSE);
}

#[tokio::test]
async fn llm_outage_falls_back_to_rules_and_kb_text() {
    let mock = Arc::new(MockLlm::unavailable());
    let assistant = llm_assistant(mock.clone());

    let result = assistant
        .process("Zanima me kako to sve skupa kod vas funkcionira")
        .await;

    // Ambiguous question below the rules-skip gate: the LLM was consulted,
    // failed, and the rules fallback answered with approved text.
    assert_eq!(mock.classify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.source, ClassificationSource::Rules);
    assert_eq!(result.intent, Intent::GeneralInfo);
    assert_eq!(result.action, Action::Respond);
    assert!(!result.llm_used);
    assert!(result.guardrail.passed);
    assert!(result.response.contains("HAOD"));
}

#[tokio::test]
async fn advisory_llm_output_is_replaced_by_disclaimer() {
    let mock = Arc::new(MockLlm::phrasing(
        "Preporučujem da prebacite novac u veću banku, ona je potpuno sigurna.",
    ));
    let assistant = llm_assistant(mock);

    let result = assistant.process("Bok, što je točno HAOD i čime se bavite?").await;

    assert_eq!(result.action, Action::Respond);
    assert!(result.llm_used);
    assert!(!result.guardrail.passed);
    assert_eq!(result.response, GUARDRAIL_RESPONSE);
}

#[tokio::test]
async fn panic_question_gets_calming_facts() {
    let assistant = rules_assistant();
    let result = assistant
        .process("Čuo sam na vijestima da je moja banka u problemima. Što da radim?")
        .await;

    assert_eq!(result.intent, Intent::Panic);
    assert_eq!(result.action, Action::Respond);
    assert!(result.guardrail.passed);
    assert!(result.response.contains("100.000 €"));
}

#[tokio::test]
async fn demo_questions_route_to_expected_actions() {
    let assistant = rules_assistant();

    let cases = [
        ("Bok Miran, što je točno HAOD i čime se vi bavite?", Intent::GeneralInfo, Action::Respond),
        ("Svugdje piše 100.000 eura po osobi po banci. Što to točno znači za mene?", Intent::LimitExplanation, Action::Respond),
        ("Ako moja banka propadne, znači li to da sam ostao bez svega?", Intent::Coverage, Action::Respond),
        ("Suprug i ja imamo zajednički račun. Kako se tu računa ovih 100.000 eura?", Intent::JointAccounts, Action::Respond),
        ("Koliko bih dugo čekao novac ako banka propadne?", Intent::PayoutTiming, Action::Respond),
        ("Što od mojih ulaganja nije pokriveno ovim osiguranjem depozita?", Intent::NonCoverage, Action::Respond),
    ];

    for (question, intent, action) in cases {
        let result = assistant.process(question).await;
        assert_eq!(result.intent, intent, "question: {}", question);
        assert_eq!(result.action, action, "question: {}", question);
        assert!(result.guardrail.passed, "question: {}", question);
        assert!(!result.response.is_empty());
    }
}
