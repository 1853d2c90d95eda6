//! Pre-approved knowledge base
//!
//! Read-only reference data embedded at compile time and loaded once at
//! startup. Every response the assistant gives (outside the calculator
//! breakdown) starts from one of these approved texts; the guardrail still
//! scans the final output.

use crate::error::{AssistantError, Result};
use crate::models::Intent;
use crate::normalize;
use serde::{Deserialize, Serialize};

const EMBEDDED_KB: &str = include_str!("../data/knowledge_base.json");

/// A single pre-approved entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub approved_answer: String,
}

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    entries: Vec<KnowledgeEntry>,
}

/// Immutable store of approved answers, shared read-only across requests.
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Parse the embedded knowledge base and verify that every intent in the
    /// catalog resolves to at least one entry. A missing key fails startup,
    /// not the first unlucky request.
    pub fn load() -> Result<Self> {
        let file: KnowledgeFile = serde_json::from_str(EMBEDDED_KB)?;
        let kb = Self {
            entries: file.entries,
        };

        for intent in Intent::CATALOG {
            if kb.entries_for(intent.tag()).is_empty() {
                return Err(AssistantError::KnowledgeBase(format!(
                    "no knowledge entry for intent '{}'",
                    intent.tag()
                )));
            }
        }

        Ok(kb)
    }

    pub fn entries_for(&self, category: &str) -> Vec<&KnowledgeEntry> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Best entry for a category: keyword overlap against the folded query,
    /// first entry on a tie.
    pub fn best_match(&self, category: &str, query: &str) -> Option<&KnowledgeEntry> {
        let entries = self.entries_for(category);
        if entries.len() <= 1 {
            return entries.into_iter().next();
        }

        let folded = normalize::fold(query);

        let mut best: Option<(usize, &KnowledgeEntry)> = None;
        for entry in entries {
            let score = entry
                .keywords
                .iter()
                .filter(|kw| folded.contains(normalize::fold(kw).as_str()))
                .count();
            // strictly greater keeps the first entry on a tie
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, entry));
            }
        }

        best.map(|(_, entry)| entry)
    }
}
