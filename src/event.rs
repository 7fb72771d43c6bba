// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in a lifecycle of a test run.
//!
//! Every message and lifecycle transition is published on the [`EventBus`]
//! as an [`Event`], in strict chronological order.

use std::{cell::RefCell, fmt};

use crate::{messages, test};

/// Single unit published on the [`EventBus`].
///
/// Wraps either a raw parser message ([`Event::Envelope`]), a domain
/// lifecycle notice, or the terminal [`Event::TestRunFinished`] marker.
#[derive(Clone, Debug)]
pub enum Event {
    /// Raw message of the external parser.
    Envelope(messages::Envelope),

    /// Source document has been parsed into a [`GherkinDocument`].
    ///
    /// [`GherkinDocument`]: messages::GherkinDocument
    GherkinSourceParsed(messages::GherkinDocument),

    /// [`Compiler`] has produced a [`Case`] out of a [`Pickle`].
    ///
    /// [`Case`]: test::Case
    /// [`Compiler`]: crate::Compiler
    /// [`Pickle`]: messages::Pickle
    TestCaseCreated(test::Case),

    /// [`Runner`] has started executing a [`Case`].
    ///
    /// [`Case`]: test::Case
    /// [`Runner`]: test::Runner
    TestCaseStarted(test::Case),

    /// [`Runner`] is about to execute a [`Step`].
    ///
    /// [`Runner`]: test::Runner
    /// [`Step`]: test::Step
    TestStepStarted(test::Step),

    /// A [`Step`] has finished with the given [`TestResult`].
    ///
    /// [`Step`]: test::Step
    /// [`TestResult`]: test::TestResult
    TestStepFinished(test::Step, test::TestResult),

    /// A [`Case`] has finished with the given aggregate [`TestResult`].
    ///
    /// [`Case`]: test::Case
    /// [`TestResult`]: test::TestResult
    TestCaseFinished(test::Case, test::TestResult),

    /// Terminal marker: no more events will be published.
    TestRunFinished,
}

/// Ordered, append-only publish channel.
///
/// Every subscriber receives every [`Event`] in publish order (broadcast,
/// not competing consumers). There is no unsubscription, no backpressure and
/// no persistence: the bus lives exactly as long as one [`execute()`] /
/// [`compile()`] invocation.
///
/// Construct one explicitly and thread it through the invocation; it is
/// never a hidden singleton.
///
/// Subscribers must not publish from within their callback.
///
/// [`compile()`]: crate::compile
/// [`execute()`]: crate::execute
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<Box<dyn FnMut(&Event)>>>,
}

impl EventBus {
    /// Creates a new [`EventBus`] with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a `subscriber` to be called with every subsequently
    /// published [`Event`].
    pub fn subscribe(&self, subscriber: impl FnMut(&Event) + 'static) {
        self.subscribers.borrow_mut().push(Box::new(subscriber));
    }

    /// Appends an [`Event`] to the stream, broadcasting it to every
    /// subscriber in registration order.
    pub fn publish(&self, event: Event) {
        for subscriber in self.subscribers.borrow_mut().iter_mut() {
            subscriber(&event);
        }
    }

    /// Publishes a raw parser message.
    pub fn envelope(&self, envelope: messages::Envelope) {
        self.publish(Event::Envelope(envelope));
    }

    /// Publishes a notice of a parsed source document.
    pub fn gherkin_source_parsed(&self, document: messages::GherkinDocument) {
        self.publish(Event::GherkinSourceParsed(document));
    }

    /// Publishes a notice of a freshly compiled [`Case`].
    ///
    /// [`Case`]: test::Case
    pub fn test_case_created(&self, case: &test::Case) {
        self.publish(Event::TestCaseCreated(case.clone()));
    }

    /// Publishes a notice of a [`Case`] starting to execute.
    ///
    /// [`Case`]: test::Case
    pub fn test_case_started(&self, case: &test::Case) {
        self.publish(Event::TestCaseStarted(case.clone()));
    }

    /// Publishes a notice of a [`Step`] starting to execute.
    ///
    /// [`Step`]: test::Step
    pub fn test_step_started(&self, step: &test::Step) {
        self.publish(Event::TestStepStarted(step.clone()));
    }

    /// Publishes a notice of a finished [`Step`].
    ///
    /// [`Step`]: test::Step
    pub fn test_step_finished(
        &self,
        step: &test::Step,
        result: &test::TestResult,
    ) {
        self.publish(Event::TestStepFinished(step.clone(), result.clone()));
    }

    /// Publishes a notice of a finished [`Case`].
    ///
    /// [`Case`]: test::Case
    pub fn test_case_finished(
        &self,
        case: &test::Case,
        result: &test::TestResult,
    ) {
        self.publish(Event::TestCaseFinished(case.clone(), result.clone()));
    }

    /// Publishes the terminal run-finished notice.
    pub fn test_run_finished(&self) {
        self.publish(Event::TestRunFinished);
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}
