//! Delta merging
//!
//! Every streamed field is suffix-appendable: a later fragment extends the
//! field, it never rewrites it. Merging therefore only ever appends.

use crate::tool_calls::CanonicalDelta;
use crate::types::FunctionCallDelta;

/// Folds a fragment into accumulated state
pub trait Merge<Fragment: ?Sized> {
    /// Append `fragment` onto `self`, field by field
    fn merge(&mut self, fragment: &Fragment);
}

/// Append a string fragment, creating the field when absent
///
/// A present-but-empty fragment still creates the field.
fn append(slot: &mut Option<String>, fragment: Option<&str>) {
    if let Some(fragment) = fragment {
        slot.get_or_insert_with(String::new).push_str(fragment);
    }
}

impl Merge<FunctionCallDelta> for FunctionCallDelta {
    fn merge(&mut self, fragment: &FunctionCallDelta) {
        append(&mut self.name, fragment.name.as_deref());
        append(&mut self.arguments, fragment.arguments.as_deref());
    }
}

/// Merged state of every delta seen so far in one turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    /// Accumulated text
    pub content: Option<String>,

    /// Accumulated function call (name and arguments text)
    pub function_call: Option<FunctionCallDelta>,
}

impl Accumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Functional form of [`Merge::merge`]
    pub fn merged(mut self, delta: &CanonicalDelta) -> Self {
        self.merge(delta);
        self
    }

    /// Accumulated function name, if any fragment carried one
    pub fn function_name(&self) -> Option<&str> {
        self.function_call.as_ref()?.name.as_deref()
    }

    /// Accumulated arguments text (empty when none arrived)
    pub fn arguments(&self) -> &str {
        self.function_call
            .as_ref()
            .and_then(|call| call.arguments.as_deref())
            .unwrap_or_default()
    }
}

impl Merge<CanonicalDelta> for Accumulator {
    fn merge(&mut self, delta: &CanonicalDelta) {
        append(&mut self.content, delta.content.as_deref());

        if let Some(fragment) = &delta.function_call {
            self.function_call
                .get_or_insert_with(FunctionCallDelta::default)
                .merge(fragment);
        }
    }
}
