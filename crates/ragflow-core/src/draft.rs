//! Staging types for the ingest-review-commit knowledge base workflow.
//!
//! Grounded in `original_source/app/services/staging.py`: drafts live in a
//! fast key-value store with a TTL. A draft groups the chunks extracted from
//! one uploaded file (or created manually); chunks are only embedded and
//! written to the row/vector stores on commit.

use crate::document::DocumentMetadata;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a staged draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// Awaiting review; not yet visible to retrieval.
    Draft,
    /// Embedded and written to the row/vector store.
    Committed,
}

/// A staged batch of Q&A chunks awaiting review and commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    /// Staging-area primary key.
    pub id: String,
    /// Identifier of the source upload this draft was extracted from, if
    /// any (manually created drafts have none).
    pub file_id: Option<String>,
    /// Original filename, or a caller-supplied label for manual drafts.
    pub filename: String,
    /// Current lifecycle state.
    pub status: DraftStatus,
    /// When this draft was staged.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When this draft expires if left uncommitted.
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl Draft {
    /// True if `now` is past `expires_at` and the draft was never committed.
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.status != DraftStatus::Committed && now >= self.expires_at
    }
}

/// One staged question/answer pair within a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Staging-area primary key for this chunk.
    pub id: String,
    /// Identifier of the draft this chunk belongs to.
    pub draft_id: String,
    /// The proposed question text.
    pub question: String,
    /// The proposed answer text.
    pub answer: String,
    /// Proposed metadata, carried through to the committed `Document`.
    pub metadata: DocumentMetadata,
}

impl Chunk {
    /// True if both `question` and `answer` are non-empty, the invariant
    /// commit validates before embedding (spec §4.10 step 1).
    pub fn has_content(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }

    /// The row-store content string committed documents are built from:
    /// `"Question: " + question + "\nAnswer: " + answer`.
    pub fn to_document_content(&self) -> String {
        format!("Question: {}\nAnswer: {}", self.question, self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_draft(status: DraftStatus) -> Draft {
        let now = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        Draft {
            id: "d1".into(),
            file_id: Some("f1".into()),
            filename: "faq.json".into(),
            status,
            created_at: now,
            expires_at: now + Duration::days(7),
        }
    }

    #[test]
    fn expires_after_ttl_unless_committed() {
        let draft = sample_draft(DraftStatus::Draft);
        let past_expiry = draft.expires_at + Duration::seconds(1);
        assert!(draft.is_expired(past_expiry));

        let committed = sample_draft(DraftStatus::Committed);
        assert!(!committed.is_expired(past_expiry));
    }

    #[test]
    fn empty_question_or_answer_fails_has_content() {
        let chunk = Chunk {
            id: "c1".into(),
            draft_id: "d1".into(),
            question: "  ".into(),
            answer: "Some answer".into(),
            metadata: DocumentMetadata::default(),
        };
        assert!(!chunk.has_content());
    }

    #[test]
    fn document_content_interleaves_question_and_answer() {
        let chunk = Chunk {
            id: "c1".into(),
            draft_id: "d1".into(),
            question: "How do I reset my password?".into(),
            answer: "Click Forgot Password.".into(),
            metadata: DocumentMetadata::default(),
        };
        assert_eq!(
            chunk.to_document_content(),
            "Question: How do I reset my password?\nAnswer: Click Forgot Password."
        );
    }
}
