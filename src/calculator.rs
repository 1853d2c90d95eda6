//! Deposit coverage calculator
//!
//! Parses monetary amounts and bank references out of free Croatian text and
//! applies the per-depositor-per-bank insurance limit.
//!
//! Association heuristic (deterministic): an amount binds to the nearest bank
//! reference that starts after it, because Croatian phrasing puts the bank
//! after the amount ("80.000 € u Banci A"). If no reference follows, the
//! nearest preceding one is used ("u prvoj banci imam 80.000 €"). Amounts
//! with no reference at all get a synthetic "Banka N" label and a warning;
//! they are never silently dropped.

use crate::error::{AssistantError, Result};
use crate::models::{BankDeposit, CoverageResult, ExtractedEntity, DEPOSIT_LIMIT};
use crate::normalize;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// k/K shorthand: "80k", "200K", "50 k", "1.5k" — multiplies by 1000.
    static ref K_SUFFIX: Regex = Regex::new(r"(\d+(?:[.,]\d+)?)\s*k\b").unwrap();
    /// European grouping: 80.000, 1.250.000
    static ref EURO_GROUPED: Regex = Regex::new(r"\d{1,3}(?:\.\d{3})+").unwrap();
    /// US grouping: 80,000
    static ref US_GROUPED: Regex = Regex::new(r"\d{1,3}(?:,\d{3})+").unwrap();
    /// Plain integers of at least four digits: 80000
    static ref PLAIN: Regex = Regex::new(r"\d{4,}").unwrap();

    /// "u banci A", "u jednoj banci", "u 2. banci", "kod banke" — bank noun
    /// required; the ordinal may be a word or a digit with a period.
    static ref REF_FULL: Regex = Regex::new(
        r"\b(?:u|kod)\s+(?:(prvoj|jednoj|drugoj|trecoj|istoj|[123]\.)\s+)?bank\w*(?:\s+([a-z][a-z0-9]{0,11})\b)?"
    )
    .unwrap();
    /// "u drugoj", "u istoj" — ordinal with the bank noun elided.
    static ref REF_ORDINAL: Regex =
        Regex::new(r"\b(?:u|kod)\s+(prvoj|jednoj|drugoj|trecoj|istoj)\b").unwrap();
    /// "u A" — a bare single-letter bank name.
    static ref REF_LETTER: Regex = Regex::new(r"\b(?:u|kod)\s+([a-z])\b").unwrap();
}

/// Words that can trail the bank noun without being a bank name.
/// "a" is deliberately absent: the conjunction takes a comma before it in
/// Croatian ("u banci, a u drugoj"), so a bare "u banci a" is a name.
const NAME_STOPWORDS: &[&str] = &[
    "i", "u", "o", "s", "te", "pa", "ili", "je", "li", "sam", "su", "se", "mi", "bi",
    "ima", "imam", "imamo", "koliko", "novac", "novca", "jos", "oko", "na", "od", "toga",
];

/// Rewrite k-suffixed shorthand to plain numbers on already-folded text.
fn normalize_amounts(folded: &str) -> String {
    K_SUFFIX
        .replace_all(folded, |caps: &Captures| {
            let num: f64 = caps[1].replace(',', ".").parse().unwrap_or(0.0);
            format!("{}", (num * 1000.0).round() as i64)
        })
        .into_owned()
}

#[derive(Debug, Clone, Copy)]
struct AmountSpan {
    start: usize,
    end: usize,
    value: f64,
}

/// All monetary amounts with their byte spans, in order of appearance.
fn extract_amounts(text: &str) -> Vec<AmountSpan> {
    let mut spans: Vec<AmountSpan> = Vec::new();

    let mut push_matches = |re: &Regex, strip: char| {
        for m in re.find_iter(text) {
            let overlaps = spans
                .iter()
                .any(|s| m.start() < s.end && s.start < m.end());
            if overlaps {
                continue;
            }
            let clean: String = m.as_str().chars().filter(|c| *c != strip).collect();
            if let Ok(value) = clean.parse::<f64>() {
                spans.push(AmountSpan {
                    start: m.start(),
                    end: m.end(),
                    value,
                });
            }
        }
    };

    push_matches(&EURO_GROUPED, '.');
    push_matches(&US_GROUPED, ',');
    push_matches(&PLAIN, ' ');

    spans.sort_by_key(|s| s.start);
    spans
}

#[derive(Debug, Clone)]
struct BankRef {
    start: usize,
    key: String,
    label: String,
}

/// All bank references with their byte spans, in order of appearance.
///
/// Ordinals map to positional keys (jednoj/prvoj → 1, drugoj → 2,
/// trećoj → 3); "istoj" reuses the previous reference; named banks are keyed
/// by their folded name; bare "u banci" references get sequential positional
/// keys of their own.
fn extract_bank_refs(folded: &str) -> Vec<BankRef> {
    // (start, end, ordinal, name)
    let mut raw: Vec<(usize, usize, Option<String>, Option<String>)> = Vec::new();

    for caps in REF_FULL.captures_iter(folded) {
        let whole = caps.get(0).unwrap();
        let ordinal = caps.get(1).map(|m| m.as_str().to_string());
        let name = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .filter(|n| !NAME_STOPWORDS.contains(&n.as_str()));
        raw.push((whole.start(), whole.end(), ordinal, name));
    }

    let mut push_non_overlapping = |raw: &mut Vec<(usize, usize, Option<String>, Option<String>)>,
                                    start: usize,
                                    end: usize,
                                    ordinal: Option<String>,
                                    name: Option<String>| {
        if !raw.iter().any(|r| start < r.1 && r.0 < end) {
            raw.push((start, end, ordinal, name));
        }
    };

    for caps in REF_ORDINAL.captures_iter(folded) {
        let whole = caps.get(0).unwrap();
        push_non_overlapping(
            &mut raw,
            whole.start(),
            whole.end(),
            Some(caps[1].to_string()),
            None,
        );
    }

    for caps in REF_LETTER.captures_iter(folded) {
        let whole = caps.get(0).unwrap();
        push_non_overlapping(
            &mut raw,
            whole.start(),
            whole.end(),
            None,
            Some(caps[1].to_string()),
        );
    }

    raw.sort_by_key(|r| r.0);

    let mut refs: Vec<BankRef> = Vec::new();
    let mut anonymous_seq = 0usize;

    for (start, _end, ordinal, name) in raw {
        let (key, label) = match (ordinal.as_deref(), name) {
            (Some("istoj"), _) => match refs.last() {
                Some(prev) => (prev.key.clone(), prev.label.clone()),
                None => ("banka-1".to_string(), "Banka 1".to_string()),
            },
            (Some(ord), _) => {
                let n = match ord {
                    "prvoj" | "jednoj" | "1." => 1,
                    "drugoj" | "2." => 2,
                    _ => 3,
                };
                (format!("banka-{}", n), format!("Banka {}", n))
            }
            (None, Some(name)) => {
                let label = format!("Banka {}", capitalize(&name));
                (name, label)
            }
            (None, None) => {
                anonymous_seq += 1;
                (
                    format!("banka-{}", anonymous_seq),
                    format!("Banka {}", anonymous_seq),
                )
            }
        };

        refs.push(BankRef { start, key, label });
    }

    refs
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Lightweight entity extraction for the pattern matcher: amounts with their
/// associated bank labels, no limit math.
pub fn parse_deposits(text: &str) -> Vec<ExtractedEntity> {
    let folded = normalize_amounts(&normalize::fold(text));
    let amounts = extract_amounts(&folded);
    let refs = extract_bank_refs(&folded);

    amounts
        .iter()
        .map(|amount| ExtractedEntity {
            bank_name: associate(amount, &refs).map(|r| r.label.clone()),
            amount: amount.value,
        })
        .collect()
}

/// Nearest following reference, else nearest preceding one.
fn associate<'a>(amount: &AmountSpan, refs: &'a [BankRef]) -> Option<&'a BankRef> {
    refs.iter()
        .filter(|r| r.start >= amount.end)
        .min_by_key(|r| r.start)
        .or_else(|| {
            refs.iter()
                .filter(|r| r.start < amount.start)
                .max_by_key(|r| r.start)
        })
}

/// Parse the question and compute per-bank coverage.
///
/// Multiple deposits at the same bank are summed before the limit is applied;
/// the limit is per depositor per bank, never per deposit line. Zero parsed
/// amounts is a `ParseFailure` the pipeline turns into a clarification
/// request.
pub fn parse_and_calculate(text: &str) -> Result<CoverageResult> {
    let folded = normalize_amounts(&normalize::fold(text));
    let amounts = extract_amounts(&folded);

    if amounts.is_empty() {
        return Err(AssistantError::ParseFailure(
            "no monetary amounts found".to_string(),
        ));
    }

    let refs = extract_bank_refs(&folded);
    let mut warnings: Vec<String> = Vec::new();

    // Insertion-ordered grouping: (key, label, summed amount)
    let mut groups: Vec<(String, String, f64)> = Vec::new();
    let mut synthetic_seq = refs.len();

    for amount in &amounts {
        let (key, label) = match associate(amount, &refs) {
            Some(bank_ref) => (bank_ref.key.clone(), bank_ref.label.clone()),
            None => {
                synthetic_seq += 1;
                let label = format!("Banka {}", synthetic_seq);
                warnings.push(format!(
                    "iznos {} € nije povezan ni s jednom bankom",
                    crate::models::format_eur(amount.value)
                ));
                (format!("banka-{}", synthetic_seq), label)
            }
        };

        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, _, sum)) => *sum += amount.value,
            None => groups.push((key, label, amount.value)),
        }
    }

    let deposits: Vec<BankDeposit> = groups
        .into_iter()
        .map(|(_, bank_name, amount)| BankDeposit {
            bank_name,
            insured: amount.min(DEPOSIT_LIMIT),
            excess: (amount - DEPOSIT_LIMIT).max(0.0),
            amount,
        })
        .collect();

    let total_amount = deposits.iter().map(|d| d.amount).sum();
    let total_insured = deposits.iter().map(|d| d.insured).sum();
    let total_excess = deposits.iter().map(|d| d.excess).sum();

    Ok(CoverageResult {
        deposits,
        total_amount,
        total_insured,
        total_excess,
        warnings,
    })
}
