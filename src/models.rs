//! Core data models for the deposit-insurance assistant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Deposit insurance limit in EUR, per depositor per bank.
/// Applied to each bank separately, never summed across banks.
pub const DEPOSIT_LIMIT: f64 = 100_000.0;

//
// ================= Intent =================
//

/// The classified purpose of a user question.
///
/// Fixed catalog, defined at process start, never extended at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    GeneralInfo,
    LimitExplanation,
    Coverage,
    NonCoverage,
    JointAccounts,
    ForeignCurrency,
    AccountTypes,
    EuBanks,
    PayoutTiming,
    LimitCalc,
    Panic,
    FinancialAdviceRestricted,
    BankStabilityRestricted,
}

impl Intent {
    /// The complete catalog, in declaration order.
    pub const CATALOG: [Intent; 13] = [
        Intent::GeneralInfo,
        Intent::LimitExplanation,
        Intent::Coverage,
        Intent::NonCoverage,
        Intent::JointAccounts,
        Intent::ForeignCurrency,
        Intent::AccountTypes,
        Intent::EuBanks,
        Intent::PayoutTiming,
        Intent::LimitCalc,
        Intent::Panic,
        Intent::FinancialAdviceRestricted,
        Intent::BankStabilityRestricted,
    ];

    /// Restricted intents must never receive a substantive answer.
    pub fn is_restricted(&self) -> bool {
        matches!(
            self,
            Intent::FinancialAdviceRestricted | Intent::BankStabilityRestricted
        )
    }

    /// Snake-case tag as used in the knowledge base and the LLM protocol.
    pub fn tag(&self) -> &'static str {
        match self {
            Intent::GeneralInfo => "general_info",
            Intent::LimitExplanation => "limit_explanation",
            Intent::Coverage => "coverage",
            Intent::NonCoverage => "non_coverage",
            Intent::JointAccounts => "joint_accounts",
            Intent::ForeignCurrency => "foreign_currency",
            Intent::AccountTypes => "account_types",
            Intent::EuBanks => "eu_banks",
            Intent::PayoutTiming => "payout_timing",
            Intent::LimitCalc => "limit_calc",
            Intent::Panic => "panic",
            Intent::FinancialAdviceRestricted => "financial_advice_restricted",
            Intent::BankStabilityRestricted => "bank_stability_restricted",
        }
    }
}

impl FromStr for Intent {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Intent::CATALOG
            .iter()
            .find(|intent| intent.tag() == s)
            .copied()
            .ok_or(())
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

//
// ================= Classification =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Rules,
    Llm,
}

/// A bank/amount pair extracted from the question text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedEntity {
    pub bank_name: Option<String>,
    pub amount: f64,
}

/// Produced once per request by the classifier; not mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f32,
    pub source: ClassificationSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<ExtractedEntity>,
}

impl ClassificationResult {
    pub fn rules(intent: Intent, confidence: f32) -> Self {
        Self {
            intent,
            confidence,
            source: ClassificationSource::Rules,
            entities: Vec::new(),
        }
    }
}

//
// ================= Policy =================
//

/// Policy-level response strategy for a classified intent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Respond,
    Calculate,
    Restrict,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Respond => "respond",
            Action::Calculate => "calculate",
            Action::Restrict => "restrict",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Calculator =================
//

/// A depositor's position at a single bank, after same-bank deposits
/// have been summed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankDeposit {
    pub bank_name: String,
    pub amount: f64,
    pub insured: f64,
    pub excess: f64,
}

/// Result of a coverage calculation across all mentioned banks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageResult {
    pub deposits: Vec<BankDeposit>,
    pub total_amount: f64,
    pub total_insured: f64,
    pub total_excess: f64,
    /// Amounts that could not be associated with a bank, reported
    /// rather than silently dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CoverageResult {
    /// Render the calculation as a Croatian markdown breakdown.
    pub fn format_result(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        for dep in &self.deposits {
            lines.push(format!("- **{}: {} €**", dep.bank_name, format_eur(dep.amount)));

            if dep.amount <= DEPOSIT_LIMIT {
                lines.push(format!(
                    "  - Cijeli iznos je unutar limita od {} €",
                    format_eur(DEPOSIT_LIMIT)
                ));
                lines.push(format!("  - Osigurano: {} €", format_eur(dep.insured)));
            } else {
                lines.push(format!(
                    "  - Do {} € je unutar limita",
                    format_eur(DEPOSIT_LIMIT)
                ));
                lines.push(format!("  - Osigurano: {} €", format_eur(dep.insured)));
                lines.push(format!(
                    "  - Iznad limita: {} € (nije pokriveno)",
                    format_eur(dep.excess)
                ));
            }
        }

        lines.push(String::new());
        lines.push("**Ukupno:**".to_string());
        lines.push(format!("- Ukupni depoziti: {} €", format_eur(self.total_amount)));
        lines.push(format!("- Osigurano: {} €", format_eur(self.total_insured)));
        if self.total_excess > 0.0 {
            lines.push(format!(
                "- Neosigurano (iznad limita): {} €",
                format_eur(self.total_excess)
            ));
        }

        lines.join("\n")
    }
}

/// Format a whole-euro amount with dot thousand separators (80000 → "80.000").
pub fn format_eur(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }

    if whole < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

//
// ================= Guardrail =================
//

/// Category of forbidden output the guardrail scans for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenCategory {
    FinancialAdvice,
    StabilityClaim,
    Guarantee,
    ImperativeInstruction,
}

impl fmt::Display for ForbiddenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ForbiddenCategory::FinancialAdvice => "financial_advice",
            ForbiddenCategory::StabilityClaim => "stability_claim",
            ForbiddenCategory::Guarantee => "guarantee",
            ForbiddenCategory::ImperativeInstruction => "imperative_instruction",
        };
        write!(f, "{}", s)
    }
}

/// Ephemeral verdict computed for each outbound text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ForbiddenCategory>,
}

impl GuardrailVerdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            matched_phrase: None,
            category: None,
        }
    }

    pub fn blocked(phrase: String, category: ForbiddenCategory) -> Self {
        Self {
            passed: false,
            matched_phrase: Some(phrase),
            category: Some(category),
        }
    }
}

//
// ================= Final Result =================
//

/// Result of processing one user question end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub request_id: Uuid,
    pub intent: Intent,
    pub confidence: f32,
    pub source: ClassificationSource,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<CoverageResult>,
    pub response: String,
    pub guardrail: GuardrailVerdict,
    pub llm_used: bool,
    pub processed_at: DateTime<Utc>,
}
