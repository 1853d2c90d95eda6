//! Output guardrail filter
//!
//! Last line of defense: every outbound response passes through here
//! regardless of which pipeline branch produced it, because the LLM
//! collaborator is untrusted for compliance purposes.
//!
//! Matching runs over folded text (lowercase, diacritics stripped) and the
//! corpus holds folded stems, so "preporučujem", "preporucujem" and
//! "preporuka" all hit the same "preporuc" entry. On any match the ENTIRE
//! response is replaced by the disclaimer; partial redaction could leak a
//! mangled-but-still-advisory sentence.

use crate::models::{ForbiddenCategory, GuardrailVerdict};
use crate::normalize;
use tracing::warn;

/// Forbidden stems and phrases, pre-folded, grouped by category.
/// Category order is also scan order.
const FORBIDDEN_CORPUS: &[(ForbiddenCategory, &[&str])] = &[
    (
        ForbiddenCategory::FinancialAdvice,
        &[
            // Direct advice ("preporuc" covers preporucujem/preporucam/preporuka)
            "preporuc",
            "savjetujem",
            "moj savjet",
            "savjet je da",
            "predlazem da",
            "sugerir",
            "sugerujem",
            // Should/ought language
            "trebao bi",
            "trebala bi",
            "trebali bi",
            "trebas",
            "moras",
            "bi trebao",
            "bi trebala",
            // Best course of action
            "najbolje bi bilo",
            "najbolje je da",
            "bilo bi najbolje",
            "bilo bi pametno",
            "bilo bi mudro",
            "pametno bi bilo",
            "mudro bi bilo",
            // Opinion as advice
            "ja bih na tvom mjestu",
            "na tvom mjestu bih",
            "da sam ja tebe",
            "da sam na tvom mjestu",
        ],
    ),
    (
        ForbiddenCategory::StabilityClaim,
        &[
            "banka je sigurna",
            "banka je potpuno sigurna",
            "banka je stabilna",
            "banka je solventna",
            "banka nece propasti",
            "banka ce prezivjeti",
            "banka je u dobrom stanju",
            "ne brinite sve je sigurno",
            "nema razloga za brigu",
            "banka ce sigurno",
            "nece propasti",
            "sigurno nece",
        ],
    ),
    (
        ForbiddenCategory::Guarantee,
        &[
            "garantiram",
            "jamcim",
            "obecavam",
            "100% sigurno",
            "apsolutno sigurno",
            "potpuno sigurno",
            "nema nikakve sanse",
            "nema sanse",
            "nemoguce je",
            "sigurno ces dobiti",
            "definitivno ces",
        ],
    ),
    (
        ForbiddenCategory::ImperativeInstruction,
        &[
            "stavi novac",
            "prebaci novac",
            "povuci novac",
            "podigni novac",
            "otvori racun",
            "zatvori racun",
            "ulozi u",
            "ne ulazi",
            "kupi",
            "prodaj",
            "cekaj da",
            "ne cekaj",
            "nemoj",
        ],
    ),
];

/// Imperative starters and money actions that form advice even when the
/// exact phrase is split across a sentence.
const IMPERATIVE_STARTERS: &[&str] = &["trebao bi", "trebala bi", "moras", "trebas", "nemoj"];
const ACTION_WORDS: &[&str] = &[
    "prebaciti", "povuci", "podici", "uloziti", "staviti", "zatvoriti", "otvoriti",
];

/// Replacement returned whenever forbidden content is detected.
pub const GUARDRAIL_RESPONSE: &str = "Kao digitalni asistent za osiguranje depozita, mogu dati \
samo informativna objašnjenja o sustavu osiguranja depozita. Ne dajem financijske savjete niti \
procjene stabilnosti banaka jer to nije moja uloga. Za takve informacije obratite se svojoj \
banci, ovlaštenom financijskom savjetniku ili nadležnim institucijama.";

/// Scan outbound text. Returns the text to send and the verdict.
pub fn filter(text: &str) -> (String, GuardrailVerdict) {
    let folded = normalize::fold(text);

    for (category, phrases) in FORBIDDEN_CORPUS {
        for phrase in *phrases {
            if folded.contains(phrase) {
                warn!(
                    category = %category,
                    phrase = %phrase,
                    "Guardrail blocked outbound response"
                );
                return (
                    GUARDRAIL_RESPONSE.to_string(),
                    GuardrailVerdict::blocked(phrase.to_string(), *category),
                );
            }
        }
    }

    // Split-form advice: an imperative starter anywhere plus a money action
    // anywhere is still advice.
    for starter in IMPERATIVE_STARTERS {
        if folded.contains(starter) {
            for action in ACTION_WORDS {
                if folded.contains(action) {
                    let matched = format!("{}...{}", starter, action);
                    warn!(phrase = %matched, "Guardrail blocked advice pattern");
                    return (
                        GUARDRAIL_RESPONSE.to_string(),
                        GuardrailVerdict::blocked(matched, ForbiddenCategory::FinancialAdvice),
                    );
                }
            }
        }
    }

    (text.to_string(), GuardrailVerdict::pass())
}

/// Keep responses bounded; truncate at a sentence boundary when possible.
pub fn clamp_length(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_length).collect();
    if let Some(last_period) = truncated.rfind('.') {
        if last_period > max_length * 7 / 10 {
            return truncated[..=last_period].to_string();
        }
    }

    format!("{}...", truncated)
}
