// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime core of a [Cucumber]-style testing framework: compiles parsed
//! [`Pickle`]s into executable [`Case`]s, routes them through a
//! composable [`Filter`] chain, and runs them, reporting progress on an
//! [`EventBus`].
//!
//! The pipeline is a chain of [`Receiver`]s:
//!
//! ```text
//! Parser -> Compiler -> filters... -> Runner
//! ```
//!
//! [`execute()`] wires the whole chain up; [`compile()`] does the same but
//! stops short of running, handing compiled cases to a caller-supplied
//! terminal [`Receiver`] instead.
//!
//! [Cucumber]: https://cucumber.io
//! [`Pickle`]: messages::Pickle

#![deny(rust_2018_idioms, unsafe_code)]

pub mod compiler;
pub mod event;
pub mod filter;
pub mod messages;
pub mod parser;
pub mod receiver;
pub mod test;

use std::{cell::RefCell, rc::Rc};

use derive_more::derive::{Display, Error, From};

#[doc(inline)]
pub use self::{
    compiler::Compiler,
    event::{Event, EventBus},
    filter::Filter,
    messages::IdGenerator,
    parser::{Document, Parser, Query, Source},
    receiver::Receiver,
    test::{Case, Runner, Step, TestResult},
};

/// Failure of a pipeline stage, carried up through every [`Receiver`] on
/// the way.
#[derive(Clone, Debug, Display, Error, From)]
pub enum Error {
    /// Failed to turn a source document into messages.
    Parser(parser::Error),

    /// Failed to compile a [`messages::Pickle`] into a [`Case`].
    Compiler(compiler::Error),
}

/// Result of a pipeline stage.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses, compiles, filters and executes the given `documents`,
/// publishing all lifecycle events on the given `event_bus`.
///
/// Filters apply in declaration order: the first one sees compiled
/// [`Case`]s first.
///
/// # Errors
///
/// If parsing or compiling any of the `documents` fails. Execution
/// failures are not errors: they surface as [`TestResult`]s inside
/// [`Event::TestStepFinished`] and [`Event::TestCaseFinished`].
pub fn execute<S: Source>(
    documents: &[Document],
    source: S,
    filters: Vec<Box<dyn Filter<Case>>>,
    event_bus: Rc<EventBus>,
    id_generator: Rc<dyn IdGenerator>,
) -> Result<()> {
    let runner = Runner::new(Rc::clone(&event_bus));
    compile(
        documents,
        source,
        Box::new(runner),
        filters,
        event_bus,
        id_generator,
    )
}

/// Parses and compiles the given `documents`, routing compiled [`Case`]s
/// through `filters` into `last_receiver`.
///
/// After the last document, `done()` propagates down the whole chain, so
/// buffering filters flush and `last_receiver` learns the stream ended.
///
/// # Errors
///
/// If parsing or compiling any of the `documents` fails.
pub fn compile<S: Source>(
    documents: &[Document],
    source: S,
    last_receiver: Box<dyn Receiver<Case>>,
    filters: Vec<Box<dyn Filter<Case>>>,
    event_bus: Rc<EventBus>,
    id_generator: Rc<dyn IdGenerator>,
) -> Result<()> {
    let chain = filter::compose(filters, last_receiver);
    let query = Rc::new(RefCell::new(Query::new()));

    let compiler = Compiler::new(
        chain,
        Rc::clone(&query),
        Rc::clone(&id_generator),
        Rc::clone(&event_bus),
    );
    let mut parser =
        Parser::new(source, compiler, event_bus, query, id_generator);

    for document in documents {
        parser.document(document)?;
    }
    parser.done()
}
