//! Editor @mention Engine
//!
//! Watches the caret for an active `@query` run, suggests matching records,
//! and on accept splices a mention token into the text and links the
//! mentioned record to the edited one in the background.
//!
//! Token format: `@[type:id|title]`. The link it creates always has type
//! `mentions` and editor-mention provenance.
//!
//! Suggestion lookups are unthrottled (the editor's input cadence is the
//! throttle) but generation-guarded like every other search here: only the
//! last-issued lookup may populate the popup.

use crate::models::{contexts, CreateLinkPayload, RecordRef};
use crate::services::error::LinkServiceError;
use crate::services::mutation::LinkMutator;

/// Maximum suggestions shown in the popup.
pub const SUGGEST_LIMIT: usize = 10;

/// An active mention run: the `@` and everything typed after it up to the
/// caret. Offsets are byte positions into the editor text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRange {
    pub start: usize,
    pub end: usize,
    pub query: String,
}

/// Find the mention run ending at the caret, if any. The run starts at the
/// nearest `@` before the caret and is broken by any whitespace, so
/// "see @week" at caret 9 yields query "week" while "a @b c" at the end
/// yields nothing.
pub fn find_mention_range(text: &str, caret: usize) -> Option<MentionRange> {
    let head = text.get(..caret)?;
    let start = head.rfind('@')?;
    let query = &head[start + 1..];
    if query.chars().any(char::is_whitespace) {
        return None;
    }
    Some(MentionRange {
        start,
        end: caret,
        query: query.to_string(),
    })
}

/// Replace a mention run with the accepted record's token. Returns the new
/// text and the caret position just after the token.
pub fn splice_token(text: &str, range: &MentionRange, record: &RecordRef) -> (String, usize) {
    let title = record
        .title
        .clone()
        .unwrap_or_else(|| record.fallback_title());
    let token = format!("@[{}:{}|{}]", record.record_type, record.id, title);
    let mut out = String::with_capacity(text.len() + token.len());
    out.push_str(&text[..range.start]);
    out.push_str(&token);
    let caret = out.len();
    out.push_str(&text[range.end..]);
    (out, caret)
}

/// The accepted mention, ready to apply to the editor.
#[derive(Debug, Clone)]
pub struct MentionInsert {
    pub text: String,
    pub caret: usize,
    pub record: RecordRef,
}

/// Mention popup state for one editor, bound to the record being edited.
pub struct MentionEngine {
    mutator: LinkMutator,
    host: RecordRef,
    generation: u64,
    active: Option<MentionRange>,
    suggestions: Vec<RecordRef>,
    cursor: usize,
}

impl MentionEngine {
    pub fn new(mutator: LinkMutator, host: RecordRef) -> Self {
        Self {
            mutator,
            host,
            generation: 0,
            active: None,
            suggestions: Vec::new(),
            cursor: 0,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }

    pub fn suggestions(&self) -> &[RecordRef] {
        &self.suggestions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&RecordRef> {
        self.suggestions.get(self.cursor)
    }

    /// Track an input change. Returns the lookup generation to pass to
    /// `run_suggest`, or `None` when no mention run is active (the popup
    /// hides).
    pub fn note_input(&mut self, text: &str, caret: usize) -> Option<u64> {
        match find_mention_range(text, caret) {
            Some(range) => {
                self.active = Some(range);
                self.generation += 1;
                Some(self.generation)
            }
            None => {
                self.dismiss();
                None
            }
        }
    }

    /// Run the suggestion lookup for a noted generation. Stale generations
    /// return false and leave the popup untouched.
    pub async fn run_suggest(&mut self, generation: u64) -> Result<bool, LinkServiceError> {
        if generation != self.generation {
            return Ok(false);
        }
        let query = match &self.active {
            Some(range) => range.query.clone(),
            None => return Ok(false),
        };
        if query.is_empty() {
            self.suggestions.clear();
            self.cursor = 0;
            return Ok(true);
        }
        let records = match self
            .mutator
            .backend()
            .search_records(&query, SUGGEST_LIMIT)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("mention suggestion lookup failed: {}", e);
                Vec::new()
            }
        };
        if generation != self.generation {
            return Ok(false);
        }
        if records.is_empty() {
            // No matches: the popup hides rather than showing an empty list.
            self.dismiss();
            return Ok(true);
        }
        self.suggestions = records;
        self.cursor = 0;
        Ok(true)
    }

    /// Arrow keys move the popup cursor, clamped to the suggestion list.
    pub fn move_selection(&mut self, delta: i32) -> usize {
        if self.suggestions.is_empty() {
            self.cursor = 0;
            return 0;
        }
        let next = self.cursor as i64 + delta as i64;
        self.cursor = next.clamp(0, self.suggestions.len() as i64 - 1) as usize;
        self.cursor
    }

    /// Escape: hide the popup, leave the text alone.
    pub fn dismiss(&mut self) {
        self.active = None;
        self.suggestions.clear();
        self.cursor = 0;
    }

    /// Accept the cursor suggestion: splice its token over the mention run
    /// and hand back the edit. Linking is the caller's next step (or use
    /// `apply`, which spawns it).
    pub fn accept(&mut self, text: &str) -> Option<MentionInsert> {
        let range = self.active.clone()?;
        let record = self.selected()?.clone();
        let (text, caret) = splice_token(text, &range, &record);
        self.dismiss();
        Some(MentionInsert {
            text,
            caret,
            record,
        })
    }

    /// Accept and link in the background. The token appears immediately;
    /// the link lands whenever the request does.
    pub fn apply(&mut self, text: &str) -> Option<MentionInsert> {
        let insert = self.accept(text)?;
        let mutator = self.mutator.clone();
        let host = self.host.clone();
        let record = insert.record.clone();
        tokio::spawn(async move {
            link_mention(&mutator, &host, &record).await;
        });
        Some(insert)
    }

    /// Link the mentioned record to the host record.
    pub async fn link_mention(&self, record: &RecordRef) {
        link_mention(&self.mutator, &self.host, record).await;
    }
}

async fn link_mention(mutator: &LinkMutator, host: &RecordRef, record: &RecordRef) {
    let payload = CreateLinkPayload {
        src_type: host.record_type.clone(),
        src_id: host.id.clone(),
        dst_type: record.record_type.clone(),
        dst_id: record.id.clone(),
        link_type: "mentions".to_string(),
        label: None,
        created_by: "ui".to_string(),
        context_type: contexts::EDITOR_MENTION.to_string(),
        context_id: host.id.clone(),
    };
    let notifier = mutator.notifier();
    match mutator.create_silent(&payload).await {
        Ok(result) if result.duplicate => {
            notifier.info("Already linked (mentions).");
        }
        Ok(_) => {
            notifier.info("Mention linked.");
        }
        Err(e) => {
            tracing::warn!("mention link failed: {}", e);
            notifier.error("Couldn't create link.");
        }
    }
}
