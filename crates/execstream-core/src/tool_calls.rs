//! Tool-call dialect normalization
//!
//! Providers stream an in-progress invocation either as a top-level
//! `function_call` fragment or as an indexed `tool_calls` list. Both are
//! resolved here into one canonical shape so the rest of the pipeline has a
//! single code path.

use crate::types::{Delta, FunctionCallDelta};
use tracing::trace;

/// A delta after dialect resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalDelta {
    /// Text fragment, carried over unchanged
    pub content: Option<String>,

    /// Function-call fragment, whichever dialect it came from
    pub function_call: Option<FunctionCallDelta>,

    /// Whether the raw delta carried a non-empty `tool_calls` list
    ///
    /// Set even when the entry carries neither name nor arguments yet. A
    /// legacy `function_call` fragment leaves it unset.
    pub call_observed: bool,
}

impl CanonicalDelta {
    /// True when the delta contributes nothing
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.function_call.is_none() && !self.call_observed
    }
}

/// Rewrites provider-specific call fragments into the canonical shape
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolCallNormalizer;

impl ToolCallNormalizer {
    /// Resolve a raw delta into its canonical form
    ///
    /// For the indexed dialect only the first entry is used; its `function`
    /// fragment is treated as a top-level function-call fragment.
    pub fn normalize(&self, delta: Delta) -> CanonicalDelta {
        let Delta {
            content,
            function_call,
            tool_calls,
        } = delta;

        match tool_calls {
            Some(calls) if !calls.is_empty() => {
                if calls.len() > 1 {
                    trace!(entries = calls.len(), "using first tool-call entry of delta");
                }
                let function = calls.into_iter().next().and_then(|call| call.function);
                CanonicalDelta {
                    content,
                    function_call: function,
                    call_observed: true,
                }
            }
            _ => CanonicalDelta {
                content,
                function_call,
                call_observed: false,
            },
        }
    }
}
