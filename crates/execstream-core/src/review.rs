//! Review narration splitting
//!
//! After proposing code, the model appends a safety review wrapped in one of
//! `<safe>`, `<warning>` or `<unsafe>`. [`ReviewTagSplitter`] watches the text
//! that follows a function call, latches the category once an opening marker
//! shows up, and re-emits the narration with every marker stripped.
//!
//! Text seen before the category is known is swallowed.

use crate::error::{Error, Result};
use crate::types::{Event, ReviewCategory};
use aho_corasick::AhoCorasick;
use tracing::debug;

/// All six marker tokens, stripped from every emitted fragment
const MARKERS: [&str; 6] = [
    "<safe>",
    "</safe>",
    "<warning>",
    "</warning>",
    "<unsafe>",
    "</unsafe>",
];

#[derive(Debug, Clone)]
enum ReviewState {
    /// No opening marker seen yet
    Watching { narration: String },

    /// Category latched for the rest of the turn
    Classified {
        category: ReviewCategory,
        /// Tail that may still grow into a marker, possibly once an inner
        /// marker completes and is stripped
        held: String,
    },
}

/// Separates tagged review narration from the text stream
#[derive(Debug, Clone)]
pub struct ReviewTagSplitter {
    state: ReviewState,
    markers: AhoCorasick,
}

impl ReviewTagSplitter {
    /// Create a splitter in the watching state
    pub fn new() -> Result<Self> {
        let markers = AhoCorasick::new(MARKERS).map_err(|e| {
            Error::internal(format!("Failed to build review marker matcher: {}", e))
        })?;

        Ok(Self {
            state: ReviewState::Watching {
                narration: String::new(),
            },
            markers,
        })
    }

    /// The latched category, if any
    pub fn category(&self) -> Option<ReviewCategory> {
        match &self.state {
            ReviewState::Watching { .. } => None,
            ReviewState::Classified { category, .. } => Some(*category),
        }
    }

    /// Feed one text fragment, returning the review slice it releases
    pub fn push(&mut self, fragment: &str) -> Option<Event> {
        let (category, text) = match &mut self.state {
            ReviewState::Watching { narration } => {
                let fragment_start = narration.len();
                narration.push_str(fragment);

                let category = detect(narration)?;
                debug!(category = %category, "review category latched");

                // a marker split across the fragment boundary is emitted from its start
                let from = self
                    .markers
                    .find_iter(narration.as_str())
                    .filter(|m| m.start() < fragment_start && fragment_start < m.end())
                    .map(|m| m.start())
                    .next()
                    .unwrap_or(fragment_start);
                (category, narration[from..].to_string())
            }
            ReviewState::Classified { category, held } => {
                let mut text = std::mem::take(held);
                text.push_str(fragment);
                (*category, text)
            }
        };

        let cleaned = self.strip(&text);
        let (emit, held) = cleaned.split_at(cleaned.len() - partial_marker_len(&cleaned));

        let event = (!emit.is_empty()).then(|| Event::review(category, emit));
        self.state = ReviewState::Classified {
            category,
            held: held.to_string(),
        };
        event
    }

    /// Release whatever is still held back at end of stream
    pub fn finish(&mut self) -> Option<Event> {
        match &mut self.state {
            ReviewState::Classified { category, held } if !held.is_empty() => {
                let text = std::mem::take(held);
                Some(Event::review(*category, text))
            }
            _ => None,
        }
    }

    /// Remove every marker, repeating until none is left
    fn strip(&self, text: &str) -> String {
        let mut current = text.to_string();
        while self.markers.is_match(current.as_str()) {
            current = self.markers.replace_all(&current, &[""; MARKERS.len()]);
        }
        current
    }
}

/// Find the category whose opening marker appears, in precedence order
fn detect(narration: &str) -> Option<ReviewCategory> {
    ReviewCategory::PRECEDENCE
        .into_iter()
        .find(|category| narration.contains(category.opening_marker()))
}

/// Length of the longest suffix of `text` that could still produce a marker
///
/// The suffix is a run of `<`-led segments that are each a marker prefix:
/// `<sa<sa` becomes `<safe>` once `fe>fe>` arrives and the inner marker is
/// stripped.
fn partial_marker_len(text: &str) -> usize {
    let mut start = text.len();
    for (i, _) in text.rmatch_indices('<') {
        if !MARKERS.iter().any(|marker| marker.starts_with(&text[i..start])) {
            break;
        }
        start = i;
    }
    text.len() - start
}
