//! Deposit-Insurance Assistant
//!
//! A compliance decision pipeline for citizen questions about deposit
//! insurance:
//! - classifies intent with rules plus a confidence-gated LLM fallback
//! - routes through a static policy table (respond / calculate / restrict)
//! - computes per-bank coverage against the insurance limit
//! - filters every outbound response against a forbidden-phrase corpus
//!
//! PIPELINE:
//! CLASSIFY → POLICY → {RESTRICT | CALCULATE | RESPOND} → GUARDRAIL → DONE

pub mod api;
pub mod calculator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod guardrail;
pub mod knowledge;
pub mod llm;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod policy;

pub use error::Result;

// Re-export common types
pub use classifier::{gate, Classifier, Gate};
pub use config::{AssistantConfig, ClassificationMode};
pub use matcher::PatternMatcher;
pub use models::*;
pub use pipeline::Assistant;
