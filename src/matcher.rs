//! Rule-based pattern matcher
//!
//! Keyword rules over normalized (folded) text produce an intent, a
//! confidence score and any extracted bank/amount entities. Restricted
//! categories sit first in the priority order: an ambiguous sentence that
//! contains both an informational keyword and a restricted cue classifies
//! restricted.
//!
//! All patterns below are stored pre-folded (lowercase, ASCII), so accented
//! and unaccented colloquial input hit the same rules.

use crate::calculator;
use crate::models::{ClassificationResult, ClassificationSource, Intent};
use crate::normalize;

/// Static keyword tables — zero allocation

const BANK_STABILITY_PATTERNS: &[&str] = &[
    // Asking if a specific bank is safe
    "je li banka x sigurna",
    "banka x sigurna",
    "je li banka sigurna",
    "banka sigurna",
    "sigurna banka",
    "je li sigurna",
    "je li stabilna",
    "stabilna banka",
    // Asking about bank failure
    "hoce li propasti",
    "ce li propasti",
    "ce li prezivjeti",
    "hoce li banka",
    // Common Croatian bank names + sigurna/stabilna/propasti
    "pbz sigurna",
    "pbz stabilna",
    "pbz propasti",
    "zaba sigurna",
    "zaba stabilna",
    "zaba propasti",
    "erste sigurna",
    "erste stabilna",
    "erste propasti",
    "otp sigurna",
    "otp stabilna",
    "otp propasti",
    "rba sigurna",
    "rba stabilna",
    "rba propasti",
    "addiko sigurna",
    "addiko propasti",
    "hpb sigurna",
    "hpb propasti",
    // General patterns
    "mozes li mi reci je li",
    "je li ta banka",
    "je li ova banka",
    "hoce li",
];

const FINANCIAL_ADVICE_PATTERNS: &[&str] = &[
    "sto mi savjetujes",
    "sto da napravim s novcem",
    "preporucujes li",
    "isplati li se",
    "da li da ulozim",
    "daj mi savjet",
    "daj savjet",
    "koju stednju",
    "koju banku",
    "kako da postupim",
    // Moving/transferring money questions
    "mogu li premjestiti",
    "mogu li prebaciti",
    "da li da premjestim",
    "da li da prebacim",
    "premjestiti novac",
    "prebaciti novac",
    "premjestiti u jednu",
    "prebaciti u jednu",
    "staviti sve u jednu",
    "drzati sve u jednoj",
    "rasporediti novac",
    "raspodijeliti novac",
    // "trebam li" is context-dependent, handled in classify()
];

const LIMIT_CALC_PATTERNS: &[&str] = &[
    "koliko mi je od toga osigurano",
    "koliko bi od toga bilo",
    "koliko bi bilo osigurano",
    "koliko bi bilo pokriveno",
    "koliko je osigurano",
    "koliko od toga",
    "recimo da imam",
    "u jednoj banci i",
    "u jednoj banci a",
    "€ u jednoj banci",
    "€ u drugoj banci",
    "eura u jednoj banci",
    "eura u drugoj banci",
    "izracunaj",
];

const PANIC_PATTERNS: &[&str] = &[
    // News-triggered panic
    "na vijestima cuo",
    "cuo na vijestima",
    "vidio na vijestima",
    "vijest je izasla",
    "nema sluzbenih obavijesti",
    "nema jos sluzbenih",
    "svi pricaju",
    // Bank trouble indicators
    "banka u problemima",
    "moja banka u problemima",
    "trcati po novac",
    "odmah trcati",
    // Crowd behavior
    "svi dizu novac",
    "svi povlace",
    "panicno dizu",
    "panicno",
    "panika",
    // Crisis language
    "dogodi najgore",
    "ako se bas sad dogodi",
    "najgori scenarij",
    "odmah reagirati",
    "trebam li cekati ili odmah",
    "imam vise od 100.000",
    "sigurno propasti",
    "sve iznad toga",
    "znaci li to da ce",
];

const COVERAGE_PATTERNS: &[&str] = &[
    "banka zatvori",
    "banka propadne",
    "banka propala",
    "ako banka propadne",
    "ako se banka zatvori",
    "propast banke",
    "ostajem bez novaca",
    "ostajem bez novca",
    "ostati bez novca",
    "bez novaca",
    "izgubim novac",
    "izgubiti novac",
    "dvije banke",
    "vise banaka",
    "svaka banka posebno",
    "sve skupa ili",
    "gleda li se",
    "ostao bez svega",
    "izgubiti sve",
    "bez svega",
    "stvarno biti isplaceno",
    "stvarno isplaceno",
    "stvarno biti pokriveno",
    "koliko mogu biti siguran",
    "hoce li stvarno",
    "sto je pokriveno",
    "sto je osigurano",
    "je li pokriveno",
    "jesam li zasticen",
];

const JOINT_ACCOUNTS_PATTERNS: &[&str] = &[
    "zajednicki racun",
    "zajednickom racunu",
    "suprug i ja",
    "supruga i ja",
    "nas dvoje",
    "zajednicka stednja",
    "dijeli na",
];

const FOREIGN_CURRENCY_PATTERNS: &[&str] = &[
    "devizna stednja",
    "devizni racun",
    "orocena stednja",
    "orocenje",
    "devizna i orocena",
    "u stranoj valuti",
];

const ACCOUNT_TYPES_PATTERNS: &[&str] = &[
    "tekuci racun",
    "ziro racun",
    "stedni racun",
    "tekuceg, ziro",
    "tekuci, ziro",
    "razlika za osiguranje",
    "razlika izmedu",
    "vrste racuna",
    "sve to pokriveno",
];

const EU_BANKS_PATTERNS: &[&str] = &[
    "banci iz druge drzave",
    "druge drzave eu",
    "druga drzava eu",
    "drugoj drzavi eu",
    "novac u banci iz druge",
    "eu banka",
    "inozemna banka",
    "strana banka",
    "stiti li to haod",
];

const PAYOUT_TIMING_PATTERNS: &[&str] = &[
    "koliko bih dugo cekao",
    "koliko dugo cekao",
    "koliko dugo bih",
    "cekao novac",
    "rok isplate",
    "rokovi isplate",
    "kad cu dobiti",
    "kada cu dobiti",
    "kad mogu dobiti",
    "kada mogu dobiti",
    "kada isplata",
    "vrijeme isplate",
    "koliko traje isplata",
    "dobiti novac",
    "nakon sto banka",
    "koliko dugo cekam",
    "propasti banke",
];

const LIMIT_EXPLANATION_PATTERNS: &[&str] = &[
    "100.000 eura po osobi",
    "sto to tocno znaci",
    "sto znaci limit",
    "sto tisuca",
    "sto to znaci za mene",
    "po osobi po banci",
];

const NON_COVERAGE_PATTERNS: &[&str] = &[
    "nije pokriveno",
    "nije osigurano",
    "sto nije",
    "mojih ulaganja",
    "od ulaganja",
    "investicijski fond",
    "fondovi",
    "dionice",
    "obveznice",
];

const GENERAL_INFO_PATTERNS: &[&str] = &[
    "sto je haod",
    "sto je tocno haod",
    "cime se bavite",
    "cime se vi bavite",
    "tko ste vi",
    "sto radite",
    "o haod-u",
];

/// Category priority order: restricted and specific categories first, so a
/// tie resolves to the stricter / more specific intent.
const CATEGORY_PRIORITY: &[(Intent, &[&str])] = &[
    (Intent::BankStabilityRestricted, BANK_STABILITY_PATTERNS),
    (Intent::EuBanks, EU_BANKS_PATTERNS),
    (Intent::PayoutTiming, PAYOUT_TIMING_PATTERNS),
    (Intent::Panic, PANIC_PATTERNS),
    (Intent::LimitCalc, LIMIT_CALC_PATTERNS),
    (Intent::FinancialAdviceRestricted, FINANCIAL_ADVICE_PATTERNS),
    (Intent::JointAccounts, JOINT_ACCOUNTS_PATTERNS),
    (Intent::ForeignCurrency, FOREIGN_CURRENCY_PATTERNS),
    (Intent::AccountTypes, ACCOUNT_TYPES_PATTERNS),
    (Intent::Coverage, COVERAGE_PATTERNS),
    (Intent::NonCoverage, NON_COVERAGE_PATTERNS),
    (Intent::LimitExplanation, LIMIT_EXPLANATION_PATTERNS),
    (Intent::GeneralInfo, GENERAL_INFO_PATTERNS),
];

/// Explanation questions about the limit must not trigger the calculator.
const EXPLANATION_PHRASES: &[&str] = &[
    "sto znaci",
    "sto to znaci",
    "sto to tocno znaci",
    "po osobi po banci",
];

/// Phrases that signal the user wants their numbers run.
const ASKING_CALCULATION: &[&str] = &[
    "koliko mi je",
    "koliko bi",
    "koliko od toga",
    "izracunaj",
    "recimo da imam",
];

const BANK_MENTIONS: &[&str] = &[
    "banci", "banka", "banke", "banku", "bankom", "banaka",
    "prvoj", "drugoj", "trecoj",
    "jednoj", "dvije", "tri",
];

/// Context indicators that flip an ambiguous "trebam li" from advice-seeking
/// to panic.
const PANIC_CONTEXT_INDICATORS: &[&str] = &[
    "vijesti", "novine", "portal", "problemi", "propadne", "propast",
    "svi dizu", "panicno", "panika", "najgore", "kriza",
];

/// Match strength for one category: (hits, confidence).
///
/// Confidence curve: 0.70 base + 0.10 per extra hit (capped 0.95), plus a
/// bonus for the longest matched pattern (capped 0.15), total capped 0.98.
fn match_score(folded: &str, patterns: &[&str]) -> (usize, f32) {
    let mut hits = 0usize;
    let mut best_len = 0usize;

    for pattern in patterns {
        if folded.contains(pattern) {
            hits += 1;
            best_len = best_len.max(pattern.len());
        }
    }

    if hits == 0 {
        return (0, 0.0);
    }

    let base = (0.7 + hits as f32 * 0.1).min(0.95);
    let length_bonus = (best_len as f32 / 50.0).min(0.15);

    (hits, (base + length_bonus).min(0.98))
}

/// Rule-based pattern matcher.
pub struct PatternMatcher;

impl PatternMatcher {
    /// Classify normalized text against the rule tables.
    ///
    /// Never errors: with no rule fired the result is `general_info` at low
    /// confidence.
    pub fn classify(text: &str) -> ClassificationResult {
        let folded = normalize::fold(text);

        let mut scores: Vec<(Intent, usize, f32)> = Vec::new();
        for (intent, patterns) in CATEGORY_PRIORITY {
            let (hits, confidence) = match_score(&folded, patterns);
            if hits > 0 {
                scores.push((*intent, hits, confidence));
            }
        }

        let entities = calculator::parse_deposits(text);
        let has_amounts = !entities.is_empty();
        let mentions_bank = BANK_MENTIONS.iter().any(|p| folded.contains(p))
            || entities.iter().any(|e| e.bank_name.is_some());
        let is_explanation = EXPLANATION_PHRASES.iter().any(|p| folded.contains(p));

        // Amounts plus a bank mention is a calculation even without patterns,
        // unless the user is asking what the limit means.
        if has_amounts && mentions_bank && !is_explanation {
            return ClassificationResult {
                intent: Intent::LimitCalc,
                confidence: 0.95,
                source: ClassificationSource::Rules,
                entities,
            };
        }

        if scores.is_empty() {
            let result = Self::apply_trebam_li(&folded, Intent::GeneralInfo, 0.4);
            return ClassificationResult::rules(result.0, result.1);
        }

        // Priority selection: a later (less specific) category must beat the
        // current best by more than 0.15 to displace it.
        let mut best_intent = scores[0].0;
        let mut best_confidence = scores[0].2;
        for (intent, _, confidence) in scores.iter().skip(1) {
            if *confidence > best_confidence + 0.15 {
                best_intent = *intent;
                best_confidence = *confidence;
            }
        }

        // Calc boost when the user both provides amounts and asks for math.
        if has_amounts {
            if let Some((_, _, calc_conf)) =
                scores.iter().find(|(i, _, _)| *i == Intent::LimitCalc)
            {
                let asking = ASKING_CALCULATION.iter().any(|q| folded.contains(q));
                if asking && *calc_conf >= 0.7 {
                    best_intent = Intent::LimitCalc;
                    best_confidence = (calc_conf + 0.1).min(0.95);
                }
            }
        }

        // Bank stability always wins once reasonably matched: fail-safe bias
        // toward the stricter category.
        if let Some((_, _, stability_conf)) = scores
            .iter()
            .find(|(i, _, _)| *i == Intent::BankStabilityRestricted)
        {
            if *stability_conf >= 0.7 {
                return ClassificationResult::rules(Intent::BankStabilityRestricted, 0.95);
            }
        }

        let (intent, confidence) =
            Self::apply_trebam_li(&folded, best_intent, best_confidence);

        ClassificationResult {
            intent,
            confidence,
            source: ClassificationSource::Rules,
            entities: if intent == Intent::LimitCalc {
                entities
            } else {
                Vec::new()
            },
        }
    }

    /// "trebam li" alone is advice-seeking; inside a panic context it is a
    /// worried citizen asking what happens next.
    fn apply_trebam_li(folded: &str, intent: Intent, confidence: f32) -> (Intent, f32) {
        if !folded.contains("trebam li") {
            return (intent, confidence);
        }

        let panic_context = PANIC_CONTEXT_INDICATORS.iter().any(|p| folded.contains(p));

        if panic_context {
            if intent == Intent::FinancialAdviceRestricted {
                return (Intent::Panic, confidence.max(0.75));
            }
            (intent, confidence)
        } else if matches!(intent, Intent::LimitCalc | Intent::BankStabilityRestricted) {
            (intent, confidence)
        } else {
            (Intent::FinancialAdviceRestricted, confidence.max(0.75))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_question_is_restricted_advice() {
        let result = PatternMatcher::classify("Trebao bih prebaciti novac u drugu banku?");
        assert_eq!(result.intent, Intent::FinancialAdviceRestricted);
        assert!(result.confidence >= 0.90);
    }

    #[test]
    fn stability_question_is_restricted() {
        let result = PatternMatcher::classify("Je li banka X sigurna ili hoće li propasti?");
        assert_eq!(result.intent, Intent::BankStabilityRestricted);
        assert!(result.confidence >= 0.90);
    }

    #[test]
    fn accented_and_unaccented_input_agree() {
        let accented = PatternMatcher::classify("Hoće li banka propasti?");
        let ascii = PatternMatcher::classify("Hoce li banka propasti?");
        assert_eq!(accented.intent, ascii.intent);
        assert_eq!(accented.intent, Intent::BankStabilityRestricted);
    }

    #[test]
    fn amounts_with_banks_auto_detect_calculation() {
        let result = PatternMatcher::classify(
            "Imam 80.000 € u jednoj banci i 150.000 € u drugoj. Koliko mi je osigurano?",
        );
        assert_eq!(result.intent, Intent::LimitCalc);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.entities.len(), 2);
    }

    #[test]
    fn k_shorthand_also_triggers_calculation() {
        let result = PatternMatcher::classify("Imam 50k u A i 60k u A");
        assert_eq!(result.intent, Intent::LimitCalc);
        assert_eq!(result.entities.len(), 2);
    }

    #[test]
    fn limit_explanation_is_not_a_calculation() {
        let result = PatternMatcher::classify(
            "Svugdje piše 100.000 eura po osobi po banci. Što to točno znači za mene?",
        );
        assert_eq!(result.intent, Intent::LimitExplanation);
    }

    #[test]
    fn no_match_falls_back_to_general_info() {
        let result = PatternMatcher::classify("Dobar dan!");
        assert_eq!(result.intent, Intent::GeneralInfo);
        assert!(result.confidence < 0.5);
        assert_eq!(result.source, ClassificationSource::Rules);
    }

    #[test]
    fn trebam_li_defaults_to_advice() {
        let result = PatternMatcher::classify("Trebam li otvoriti još jedan račun?");
        assert_eq!(result.intent, Intent::FinancialAdviceRestricted);
        assert!(result.confidence >= 0.70);
    }

    #[test]
    fn trebam_li_in_panic_context_is_panic() {
        let result = PatternMatcher::classify(
            "Čuo sam na vijestima da je moja banka u problemima. Trebam li čekati ili odmah reagirati?",
        );
        assert_eq!(result.intent, Intent::Panic);
    }

    #[test]
    fn classic_demo_questions() {
        let cases = [
            ("Bok Miran, što je točno HAOD i čime se vi bavite?", Intent::GeneralInfo),
            ("Suprug i ja imamo zajednički račun. Kako se tu računa ovih 100.000 eura?", Intent::JointAccounts),
            ("Je li devizna štednja i oročena štednja isto u ovom sustavu osiguranja?", Intent::ForeignCurrency),
            ("Što od mojih ulaganja nije pokriveno ovim osiguranjem depozita?", Intent::NonCoverage),
            ("Ako imam novac u banci iz druge države EU, štiti li to HAOD?", Intent::EuBanks),
            ("Koliko bih dugo čekao novac ako banka propadne?", Intent::PayoutTiming),
        ];

        for (question, expected) in cases {
            let result = PatternMatcher::classify(question);
            assert_eq!(result.intent, expected, "question: {}", question);
        }
    }
}
