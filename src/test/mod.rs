// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution model: steps, test cases, results and the runner.

pub mod location;
pub mod result;
pub mod runner;

pub use self::{
    action::{Action, Pending},
    case::Case,
    location::Location,
    result::{Failure, Info, TestResult},
    runner::Runner,
    step::{Argument, Step, StepOrigin},
};

/// Polymorphic visitor over the execution model.
///
/// [`Case::describe_to()`] and [`Step::describe_to()`] call back into this
/// capability, so reporting code never needs to know concrete step kinds.
pub trait Visitor {
    /// Visits a [`Case`], before any of its [`Step`]s.
    fn test_case(&mut self, _case: &Case) {}

    /// Visits an ordinary [`Step`].
    fn test_step(&mut self, _step: &Step) {}

    /// Visits a hook [`Step`]. Defaults to treating it as an ordinary one.
    fn hook_step(&mut self, step: &Step) {
        self.test_step(step);
    }
}
