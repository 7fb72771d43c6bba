// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Boundary to the external [Gherkin] parser.
//!
//! The grammar itself is not this crate's concern: a [`Source`] turns one
//! [`Document`] into a lazy sequence of [`Envelope`]s, and the [`Parser`]
//! adapter routes each of them to the [`EventBus`], the structural [`Query`]
//! index and the downstream [`Receiver`] of [`Pickle`]s.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference
//! [`Pickle`]: messages::Pickle

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use derive_more::derive::{Display, Error};
use tracing::debug;

use crate::{
    event::EventBus,
    messages::{self, Envelope, IdGenerator},
    receiver::Receiver,
};

/// Raw specification document handed to the external parser.
#[derive(Clone, Debug)]
pub struct Document {
    /// Identity of this document.
    pub uri: String,

    /// Raw text of this document.
    pub body: String,

    /// Dialect this document is written in.
    pub language: String,
}

impl Document {
    /// Creates a new [`Document`] in the default `en` dialect.
    #[must_use]
    pub fn new(uri: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            body: body.into(),
            language: "en".into(),
        }
    }

    /// Sets the dialect of this [`Document`].
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Configuration handed to a [`Source`] along with every [`Document`].
pub struct Options {
    /// Dialect to assume when the document doesn't declare one.
    pub default_dialect: String,

    /// Whether raw source messages should be included in the output.
    pub include_source: bool,

    /// Whether [`GherkinDocument`] messages should be included.
    ///
    /// [`GherkinDocument`]: messages::GherkinDocument
    pub include_gherkin_document: bool,

    /// Whether [`Pickle`] messages should be included.
    ///
    /// [`Pickle`]: messages::Pickle
    pub include_pickles: bool,

    /// Generator the parser must use for AST node and pickle ids.
    pub id_generator: Rc<dyn IdGenerator>,
}

/// External [Gherkin] parser: turns one [`Document`] into a lazy sequence
/// of [`Envelope`]s.
///
/// [Gherkin]: https://cucumber.io/docs/gherkin/reference
pub trait Source {
    /// Output sequence of messages.
    type Messages: Iterator<Item = Envelope>;

    /// Parses the given `document` into a sequence of [`Envelope`]s.
    fn parse(&mut self, document: &Document, options: &Options)
        -> Self::Messages;
}

/// [`Parser`] boundary error.
#[derive(Clone, Debug, Display, Error)]
pub enum Error {
    /// Malformed input document. Fatal for the invocation, but doesn't
    /// corrupt state built from documents already processed.
    #[display("{uri}: {text}")]
    Parse {
        /// Identity of the malformed document.
        uri: String,

        /// Parser's error description.
        text: String,
    },

    /// [`Envelope`] with no recognized payload: a contract violation
    /// between this core and the external parser, not user-recoverable.
    #[display("unknown message: {_0:?}")]
    UnknownMessage(#[error(not(source))] Envelope),
}

/// Structural index over parser messages.
///
/// Updated incrementally with every [`Envelope`], then queried by the
/// [`Compiler`] to resolve a pickle's enclosing document structure.
///
/// [`Compiler`]: crate::Compiler
#[derive(Debug, Default)]
pub struct Query {
    locations: HashMap<String, messages::Location>,
}

impl Query {
    /// Creates a new, empty [`Query`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes the given [`Envelope`].
    pub fn update(&mut self, envelope: &Envelope) {
        let Some(feature) = envelope
            .gherkin_document
            .as_ref()
            .and_then(|doc| doc.feature.as_ref())
        else {
            return;
        };
        self.index_children(&feature.children);
    }

    /// Resolves the [`Location`] of the AST node with the given id.
    ///
    /// [`Location`]: messages::Location
    #[must_use]
    pub fn location(&self, ast_node_id: &str) -> Option<messages::Location> {
        self.locations.get(ast_node_id).copied()
    }

    fn index_children(&mut self, children: &[messages::FeatureChild]) {
        for child in children {
            match child {
                messages::FeatureChild::Background(background) => {
                    self.locations
                        .insert(background.id.clone(), background.location);
                    self.index_steps(&background.steps);
                }
                messages::FeatureChild::Scenario(scenario) => {
                    self.locations
                        .insert(scenario.id.clone(), scenario.location);
                    self.index_steps(&scenario.steps);
                }
                messages::FeatureChild::Rule(rule) => {
                    self.locations.insert(rule.id.clone(), rule.location);
                    self.index_children(&rule.children);
                }
            }
        }
    }

    fn index_steps(&mut self, steps: &[messages::Step]) {
        for step in steps {
            self.locations.insert(step.id.clone(), step.location);
        }
    }
}

/// Adapter driving a [`Source`] over a sequence of [`Document`]s.
///
/// Every message is published on the [`EventBus`] and fed to the [`Query`]
/// index; [`Pickle`]s are forwarded to the downstream [`Receiver`] (the
/// [`Compiler`], usually), and attachments abort the invocation as parse
/// errors.
///
/// [`Compiler`]: crate::Compiler
/// [`Pickle`]: messages::Pickle
pub struct Parser<S, R> {
    source: S,
    receiver: R,
    event_bus: Rc<EventBus>,
    query: Rc<RefCell<Query>>,
    id_generator: Rc<dyn IdGenerator>,
}

impl<S, R> Parser<S, R>
where
    S: Source,
    R: Receiver<messages::Pickle>,
{
    /// Creates a new [`Parser`] adapter.
    #[must_use]
    pub fn new(
        source: S,
        receiver: R,
        event_bus: Rc<EventBus>,
        query: Rc<RefCell<Query>>,
        id_generator: Rc<dyn IdGenerator>,
    ) -> Self {
        Self {
            source,
            receiver,
            event_bus,
            query,
            id_generator,
        }
    }

    /// Parses one [`Document`], routing every resulting message.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] if the parser reports the document malformed, or
    /// [`Error::UnknownMessage`] on an unrecognized message shape. Either
    /// unwinds immediately out of the invocation.
    pub fn document(&mut self, document: &Document) -> crate::Result<()> {
        debug!(uri = document.uri.as_str(), "parsing document");
        let options = self.options(document);
        let Self {
            source,
            receiver,
            event_bus,
            query,
            ..
        } = self;

        for envelope in source.parse(document, &options) {
            event_bus.envelope(envelope.clone());
            query.borrow_mut().update(&envelope);

            match envelope {
                Envelope {
                    gherkin_document: Some(doc),
                    ..
                } => event_bus.gherkin_source_parsed(doc),
                Envelope {
                    pickle: Some(pickle),
                    ..
                } => receiver.accept(pickle)?,
                Envelope {
                    attachment: Some(attachment),
                    ..
                } => {
                    return Err(Error::Parse {
                        uri: document.uri.clone(),
                        text: attachment.text,
                    }
                    .into());
                }
                unknown => {
                    return Err(Error::UnknownMessage(unknown).into());
                }
            }
        }
        Ok(())
    }

    /// Signals that no more [`Document`]s will be parsed.
    ///
    /// # Errors
    ///
    /// If a downstream stage fails while flushing.
    pub fn done(&mut self) -> crate::Result<()> {
        self.receiver.done()
    }

    fn options(&self, document: &Document) -> Options {
        Options {
            default_dialect: document.language.clone(),
            include_source: false,
            include_gherkin_document: true,
            include_pickles: true,
            id_generator: Rc::clone(&self.id_generator),
        }
    }
}
