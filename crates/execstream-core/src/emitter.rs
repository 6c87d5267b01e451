//! Stream event emission
//!
//! [`StreamEventEmitter`] consumes the raw deltas of one assistant turn in
//! order and produces typed [`Event`]s:
//!
//! 1. the delta is normalized and merged into the turn's accumulator
//! 2. text becomes a `Message`, or goes through the review splitter once a
//!    function call has been detected
//! 3. the accumulated function call is inspected for new code
//!
//! A call to the execution function has its arguments parsed as partial JSON.
//! A call to a direct-code alias (`python`, `functions`) has its raw arguments
//! taken as the code. Any other function name ends the turn with a single
//! fallback `Code` event carrying the name. The name is taken as complete once
//! its first argument fragment or a text fragment arrives, or at the end of
//! the stream.
//!
//! Only the indexed `tool_calls` shape switches later text over to review
//! narration. Text after a legacy `function_call` stays a `Message`.

use crate::accumulator::{Accumulator, Merge};
use crate::config::EmitterConfig;
use crate::error::Result;
use crate::partial_json::{parse_partial_json, PartialJson};
use crate::review::ReviewTagSplitter;
use crate::stream::{EventIter, EventStream};
use crate::tool_calls::ToolCallNormalizer;
use crate::types::{Delta, Event, ReviewCategory};
use futures::Stream;
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Where a turn is in its lifecycle
///
/// Each transition happens at most once, which makes the function-call
/// latch and the language latch structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    /// Nothing seen yet
    Idle,

    /// Plain text so far, no function call
    TextOnly,

    /// Function call detected, language not known yet
    AwaitingLanguage,

    /// Language latched; code deltas flow
    StreamingCode { language: String },

    /// Upstream ended normally, keeping the latched language if any
    Done { language: Option<String> },

    /// Turn ended early on an unrecognized function name
    Aborted,
}

/// Turns the ordered deltas of one response into typed events
#[derive(Debug, Clone)]
pub struct StreamEventEmitter {
    config: EmitterConfig,
    normalizer: ToolCallNormalizer,
    accumulator: Accumulator,
    state: TurnState,
    /// One-way latch, survives the end of the turn; routes later text to review
    call_detected: bool,
    /// Longest code prefix already emitted
    emitted_code: String,
    review: ReviewTagSplitter,
}

impl StreamEventEmitter {
    /// Create an emitter for a fresh turn
    pub fn new(config: EmitterConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            normalizer: ToolCallNormalizer,
            accumulator: Accumulator::new(),
            state: TurnState::Idle,
            call_detected: false,
            emitted_code: String::new(),
            review: ReviewTagSplitter::new()?,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// Whether a function call has been seen this turn
    pub fn function_call_detected(&self) -> bool {
        self.call_detected
    }

    /// The latched code language
    pub fn language(&self) -> Option<&str> {
        match &self.state {
            TurnState::StreamingCode { language }
            | TurnState::Done {
                language: Some(language),
            } => Some(language),
            _ => None,
        }
    }

    /// All code emitted so far
    pub fn emitted_code(&self) -> &str {
        &self.emitted_code
    }

    /// Merged state of the deltas seen so far
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Latched review category, if any
    pub fn review_category(&self) -> Option<ReviewCategory> {
        self.review.category()
    }

    /// Check if the turn was cut short by the unrecognized-function fallback
    pub fn is_aborted(&self) -> bool {
        self.state == TurnState::Aborted
    }

    /// Check if the turn is over, normally or not
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TurnState::Done { .. } | TurnState::Aborted)
    }

    /// Consume one delta, returning the events it produces
    ///
    /// Deltas arriving after the turn ended are ignored.
    pub fn process(&mut self, delta: Delta) -> Vec<Event> {
        if self.is_terminal() {
            trace!("ignoring delta after end of turn");
            return Vec::new();
        }

        let delta = self.normalizer.normalize(delta);
        self.accumulator.merge(&delta);

        if delta.call_observed && !self.call_detected {
            debug!("function call detected");
            self.call_detected = true;
        }

        if (delta.call_observed || delta.function_call.is_some())
            && matches!(self.state, TurnState::Idle | TurnState::TextOnly)
        {
            self.state = TurnState::AwaitingLanguage;
        }

        let text = delta.content.as_deref().filter(|text| !text.is_empty());

        // text after the name settles it
        if text.is_some() {
            if let Some(event) = self.abort_unrecognized() {
                return counted(vec![event]);
            }
        }

        let mut events = Vec::new();

        if let Some(text) = text {
            if self.call_detected {
                events.extend(self.review.push(text));
            } else {
                if self.state == TurnState::Idle {
                    self.state = TurnState::TextOnly;
                }
                events.push(Event::message(text));
            }
        }

        events.extend(self.inspect_call());
        counted(events)
    }

    /// End the turn normally, releasing anything still held back
    pub fn finish(&mut self) -> Vec<Event> {
        if self.is_terminal() {
            return Vec::new();
        }

        if let Some(event) = self.abort_unrecognized() {
            return counted(vec![event]);
        }

        let events: Vec<Event> = self.review.finish().into_iter().collect();
        let outcome = match self.state {
            TurnState::Idle | TurnState::TextOnly => "text",
            _ => "code",
        };
        metrics::counter!("execstream_turns_total", "outcome" => outcome).increment(1);
        debug!(outcome, code_len = self.emitted_code.len(), "turn finished");

        let language = self.language().map(str::to_string);
        self.state = TurnState::Done { language };
        counted(events)
    }

    /// Wrap an upstream delta stream into a lazy event stream
    pub fn into_stream<S>(self, upstream: S) -> EventStream<S>
    where
        S: Stream<Item = Delta>,
    {
        EventStream::new(self, upstream)
    }

    /// Wrap an upstream delta sequence into a lazy event iterator
    pub fn into_events<I>(self, deltas: I) -> EventIter<I::IntoIter>
    where
        I: IntoIterator<Item = Delta>,
    {
        EventIter::new(self, deltas.into_iter())
    }

    /// Look at the accumulated function call for new code
    fn inspect_call(&mut self) -> Option<Event> {
        // an empty name carries no information yet
        let name = self.accumulator.function_name().filter(|name| !name.is_empty())?;

        if name == self.config.execute_tool {
            let arguments = self.accumulator.arguments();
            if arguments.is_empty() {
                return None;
            }

            let args = match parse_partial_json(arguments) {
                PartialJson::Object(args) => args,
                PartialJson::NotObject(value) => {
                    debug!(kind = json_kind(&value), "function arguments are not an object");
                    return None;
                }
                PartialJson::Pending => return None,
            };

            if self.state == TurnState::AwaitingLanguage {
                // `code` must be present too, otherwise `language` may still be mid-token
                let language = args
                    .get("language")
                    .and_then(Value::as_str)
                    .filter(|language| !language.is_empty());
                if let (Some(language), true) = (language, args.contains_key("code")) {
                    self.latch_language(language.to_string());
                }
            }

            let TurnState::StreamingCode { language } = &self.state else {
                return None;
            };
            let code = args.get("code").and_then(Value::as_str)?;
            advance(&mut self.emitted_code, language, code)
        } else if self.config.is_direct_code_alias(name) {
            if self.accumulator.arguments().is_empty() {
                return None;
            }

            if self.state == TurnState::AwaitingLanguage {
                debug!(name, "direct code call, using fallback language");
                metrics::counter!("execstream_fallbacks_total", "kind" => "direct_code").increment(1);
                self.latch_language(self.config.fallback_language.clone());
            }

            let TurnState::StreamingCode { language } = &self.state else {
                return None;
            };
            advance(&mut self.emitted_code, language, self.accumulator.arguments())
        } else if self.accumulator.arguments().is_empty() {
            // the name may still be streaming in
            None
        } else {
            self.abort_unrecognized()
        }
    }

    /// End the turn on an accumulated name that is neither the execution
    /// function nor an alias
    fn abort_unrecognized(&mut self) -> Option<Event> {
        let name = self
            .accumulator
            .function_name()
            .filter(|name| !name.is_empty())
            .filter(|name| *name != self.config.execute_tool && !self.config.is_direct_code_alias(name))?
            .to_string();

        warn!(name = %name, "model invoked an unrecognized function, ending turn");
        metrics::counter!("execstream_fallbacks_total", "kind" => "unrecognized").increment(1);
        metrics::counter!("execstream_turns_total", "outcome" => "aborted").increment(1);

        self.state = TurnState::Aborted;
        Some(Event::code(self.config.fallback_language.clone(), name))
    }

    fn latch_language(&mut self, language: String) {
        debug!(language = %language, "code language latched");
        self.state = TurnState::StreamingCode { language };
    }
}

fn counted(events: Vec<Event>) -> Vec<Event> {
    for event in &events {
        metrics::counter!("execstream_events_total", "kind" => event.kind()).increment(1);
    }
    events
}

/// Emit whatever `code` adds beyond the already emitted prefix
fn advance(emitted: &mut String, language: &str, code: &str) -> Option<Event> {
    let Some(fresh) = code.strip_prefix(emitted.as_str()) else {
        warn!(
            emitted_len = emitted.len(),
            code_len = code.len(),
            "accumulated code no longer extends emitted code, skipping"
        );
        return None;
    };

    if fresh.is_empty() {
        return None;
    }

    let event = Event::code(language, fresh);
    emitted.push_str(fresh);
    Some(event)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
