// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Receiver`] capability chaining the compile/execute pipeline together.

/// Capability implemented by every stage of the pipeline: the [`Compiler`]
/// (receiving [`Pickle`]s), every [`Filter`] stage and the [`Runner`]
/// (receiving [`Case`]s).
///
/// Stages are chained by handing each one the next [`Receiver`] downstream,
/// so no stage knows what comes after it.
///
/// [`Case`]: crate::test::Case
/// [`Compiler`]: crate::Compiler
/// [`Filter`]: crate::Filter
/// [`Pickle`]: crate::messages::Pickle
/// [`Runner`]: crate::test::Runner
pub trait Receiver<I> {
    /// Accepts the next `item` of the stream.
    ///
    /// # Errors
    ///
    /// If this stage (or any stage downstream) hits a fatal integration
    /// error, such as an unresolvable structural query.
    fn accept(&mut self, item: I) -> crate::Result<()>;

    /// Signals that no more items will be produced.
    ///
    /// Must be forwarded downstream exactly once, after any buffered items
    /// have been flushed.
    ///
    /// # Errors
    ///
    /// If flushing buffered items fails downstream.
    fn done(&mut self) -> crate::Result<()>;
}

impl<I, R: Receiver<I> + ?Sized> Receiver<I> for Box<R> {
    fn accept(&mut self, item: I) -> crate::Result<()> {
        (**self).accept(item)
    }

    fn done(&mut self) -> crate::Result<()> {
        (**self).done()
    }
}
