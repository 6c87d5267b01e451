//! Lazy event sequences
//!
//! The emitter is driven by its consumer: each pull takes at most one delta
//! from upstream. Once the turn ends, normally or through the
//! unrecognized-function fallback, upstream is never polled again; dropping
//! the sequence drops upstream with it.

use crate::emitter::StreamEventEmitter;
use crate::types::{Delta, Event};
use futures::Stream;
use pin_project::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Events of one turn, pulled from an async delta stream
#[pin_project]
#[derive(Debug)]
pub struct EventStream<S> {
    #[pin]
    upstream: S,
    emitter: StreamEventEmitter,
    pending: VecDeque<Event>,
    exhausted: bool,
}

impl<S> EventStream<S> {
    /// Wrap `upstream` with a fresh emitter
    pub fn new(emitter: StreamEventEmitter, upstream: S) -> Self {
        Self {
            upstream,
            emitter,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// The emitter driving this stream
    pub fn emitter(&self) -> &StreamEventEmitter {
        &self.emitter
    }
}

impl<S> Stream for EventStream<S>
where
    S: Stream<Item = Delta>,
{
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(event));
            }
            if *this.exhausted {
                return Poll::Ready(None);
            }

            match ready!(this.upstream.as_mut().poll_next(cx)) {
                Some(delta) => {
                    this.pending.extend(this.emitter.process(delta));
                    if this.emitter.is_aborted() {
                        *this.exhausted = true;
                    }
                }
                None => {
                    this.pending.extend(this.emitter.finish());
                    *this.exhausted = true;
                }
            }
        }
    }
}

/// Events of one turn, pulled from a synchronous delta sequence
#[derive(Debug)]
pub struct EventIter<I> {
    upstream: I,
    emitter: StreamEventEmitter,
    pending: VecDeque<Event>,
    exhausted: bool,
}

impl<I> EventIter<I> {
    /// Wrap `upstream` with a fresh emitter
    pub fn new(emitter: StreamEventEmitter, upstream: I) -> Self {
        Self {
            upstream,
            emitter,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// The emitter driving this iterator
    pub fn emitter(&self) -> &StreamEventEmitter {
        &self.emitter
    }
}

impl<I> Iterator for EventIter<I>
where
    I: Iterator<Item = Delta>,
{
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.exhausted {
                return None;
            }

            match self.upstream.next() {
                Some(delta) => {
                    self.pending.extend(self.emitter.process(delta));
                    if self.emitter.is_aborted() {
                        self.exhausted = true;
                    }
                }
                None => {
                    self.pending.extend(self.emitter.finish());
                    self.exhausted = true;
                }
            }
        }
    }
}
