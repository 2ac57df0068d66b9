//! Domain types shared across the Plandeck crates.
//!
//! Field names follow the client-side vocabulary; `#[serde(rename)]`
//! attributes bind each field to the name the planning backend actually
//! emits. Every wire-facing struct is defensive: missing fields default
//! rather than failing the whole payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many citations an assistant turn shows; the rest stay in the data.
pub const DISPLAY_CITATION_CAP: usize = 4;

/// One selectable group of related planning records ("a site as a repo").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bundle {
    #[serde(rename = "site_bundle_id")]
    pub id: String,
    #[serde(rename = "council_name")]
    pub group_name: String,
    #[serde(rename = "n_apps")]
    pub activity_count: u32,
    #[serde(rename = "sample_address")]
    pub sample_label: String,
    #[serde(rename = "first_app")]
    pub first_timestamp: String,
    #[serde(rename = "last_app")]
    pub last_timestamp: String,
}

/// One timestamped historical record within a bundle.
///
/// Ordering is server-defined; the client stores commits as received and
/// never re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commit {
    #[serde(rename = "planning_reference")]
    pub reference: String,
    #[serde(rename = "event_dt")]
    pub event_timestamp: String,
    #[serde(rename = "normalised_application_type")]
    pub category: String,
    #[serde(rename = "normalised_decision")]
    pub decision: String,
    pub heading: String,
    #[serde(rename = "proposal")]
    pub description: String,
    #[serde(rename = "raw_address")]
    pub address: String,
    pub url: Option<String>,
}

/// Backend-derived summary of a bundle. Treated as an opaque snapshot; the
/// client renders it but computes nothing from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overview {
    #[serde(rename = "n_commits")]
    pub commit_count: u32,
    pub stage: String,
    #[serde(rename = "days_span")]
    pub day_span: Option<i64>,
    pub churn_score: f64,
    pub type_counts: BTreeMap<String, u32>,
    pub decision_counts: BTreeMap<String, u32>,
    pub insights: Vec<String>,
    pub next_actions: Vec<String>,
    pub latest: Option<LatestActivity>,
    // Extra buckets the backend emits alongside the distilled summary.
    pub main_count: Option<u32>,
    pub amend_count: Option<u32>,
    pub cond_count: Option<u32>,
    pub condition_debt: Option<f64>,
}

/// The most recent record in a bundle, as summarized by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatestActivity {
    #[serde(rename = "planning_reference")]
    pub reference: String,
    pub date: String,
    #[serde(rename = "type")]
    pub category: String,
    pub decision: String,
    pub heading: String,
    pub url: Option<String>,
}

/// A clickable external reference attached to an assistant answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Citation {
    #[serde(rename = "planning_reference")]
    pub reference: String,
    pub url: Option<String>,
}

/// Wire shape of a `/chat` response. Extra fields (the backend attaches an
/// overview block) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Populated for assistant turns only; user turns carry an empty list.
    pub citations: Vec<Citation>,
    pub at: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a user turn with the given text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            citations: Vec::new(),
            at: Utc::now(),
        }
    }

    /// Create an assistant turn with the given text and citations.
    pub fn assistant(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            citations,
            at: Utc::now(),
        }
    }

    /// The citations shown in the UI: capped at [`DISPLAY_CITATION_CAP`],
    /// while `self.citations` keeps the full list.
    pub fn displayed_citations(&self) -> &[Citation] {
        let cap = self.citations.len().min(DISPLAY_CITATION_CAP);
        &self.citations[..cap]
    }
}

/// A synthesized-speech payload ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self {
            media_type: "audio/mpeg".to_string(),
            bytes,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
