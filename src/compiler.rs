// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compilation of [`Pickle`]s into executable [`Case`]s.
//!
//! [`Pickle`]: messages::Pickle

use std::{cell::RefCell, rc::Rc};

use derive_more::derive::{Display, Error};
use tracing::debug;

use crate::{
    event::EventBus,
    messages::{self, IdGenerator},
    parser::Query,
    receiver::Receiver,
    test::{Action, Argument, Case, Location, Step},
};

/// [`Compiler`] integration error: a pickle referencing document structure
/// the [`Query`] index cannot resolve. Fatal and not retried, as it
/// indicates a contract violation between this core and the parser.
#[derive(Clone, Debug, Display, Error)]
pub enum Error {
    /// No source location for a pickle.
    #[display("no source location for pickle '{id}' ({uri})")]
    UnresolvedPickle {
        /// Id of the unresolvable pickle.
        id: String,

        /// Document the pickle claims to come from.
        uri: String,
    },

    /// No source location for a pickle step.
    #[display("no source location for pickle step '{id}'")]
    UnresolvedPickleStep {
        /// Id of the unresolvable pickle step.
        id: String,
    },
}

/// Definition of a Before- or After-hook materialized into every compiled
/// [`Case`].
///
/// Hook registries live outside this core, so the id is supplied by the
/// registering caller.
#[derive(Clone, Debug)]
pub struct Hook {
    id: String,
    text: String,
    action: Action,
}

impl Hook {
    /// Creates a new [`Hook`] definition.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            action,
        }
    }

    /// Id of this [`Hook`] definition.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// [`Receiver`] of [`Pickle`]s emitting exactly one [`Case`] per pickle, in
/// pickle order, to the downstream [`Receiver`] (the filter chain, then the
/// [`Runner`]).
///
/// Steps are ordered per the fixed hook convention: Before-hooks, scenario
/// steps, After-hooks. Every step gets a fresh id from the injected
/// [`IdGenerator`].
///
/// [`Pickle`]: messages::Pickle
/// [`Runner`]: crate::test::Runner
pub struct Compiler<R> {
    receiver: R,
    query: Rc<RefCell<Query>>,
    id_generator: Rc<dyn IdGenerator>,
    event_bus: Rc<EventBus>,
    before_hooks: Vec<Hook>,
    after_hooks: Vec<Hook>,
}

impl<R: Receiver<Case>> Compiler<R> {
    /// Creates a new [`Compiler`] with no hooks registered.
    #[must_use]
    pub fn new(
        receiver: R,
        query: Rc<RefCell<Query>>,
        id_generator: Rc<dyn IdGenerator>,
        event_bus: Rc<EventBus>,
    ) -> Self {
        Self {
            receiver,
            query,
            id_generator,
            event_bus,
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
        }
    }

    /// Registers a [`Hook`] to run before the scenario steps of every
    /// compiled [`Case`].
    #[must_use]
    pub fn with_before_hook(mut self, hook: Hook) -> Self {
        self.before_hooks.push(hook);
        self
    }

    /// Registers a [`Hook`] to run after the scenario steps of every
    /// compiled [`Case`].
    #[must_use]
    pub fn with_after_hook(mut self, hook: Hook) -> Self {
        self.after_hooks.push(hook);
        self
    }

    fn create_test_case(
        &self,
        pickle: &messages::Pickle,
    ) -> Result<Case, Error> {
        let location = self.pickle_location(pickle)?;

        let mut steps = Vec::with_capacity(
            self.before_hooks.len()
                + pickle.steps.len()
                + self.after_hooks.len(),
        );
        for hook in &self.before_hooks {
            steps.push(self.hook_step(hook, &location));
        }
        for pickle_step in &pickle.steps {
            steps.push(self.pickle_step(pickle, pickle_step)?);
        }
        for hook in &self.after_hooks {
            steps.push(self.hook_step(hook, &location));
        }

        let tags = pickle
            .tags
            .iter()
            .map(|tag| tag.name.clone())
            .collect();
        Ok(Case::new(
            self.id_generator.new_id(),
            pickle.id.clone(),
            pickle.name.clone(),
            location,
            tags,
            steps,
        ))
    }

    fn hook_step(&self, hook: &Hook, case_location: &Location) -> Step {
        let location = hook
            .action
            .location()
            .cloned()
            .unwrap_or_else(|| case_location.clone());
        Step::hook(
            self.id_generator.new_id(),
            hook.id.clone(),
            hook.text.clone(),
            location,
            hook.action.clone(),
        )
    }

    fn pickle_step(
        &self,
        pickle: &messages::Pickle,
        pickle_step: &messages::PickleStep,
    ) -> Result<Step, Error> {
        let ast_location = pickle_step
            .ast_node_ids
            .last()
            .and_then(|id| self.query.borrow().location(id))
            .ok_or_else(|| Error::UnresolvedPickleStep {
                id: pickle_step.id.clone(),
            })?;
        let argument = pickle_step.argument.as_ref().map(|arg| match arg {
            messages::PickleStepArgument::DocString(doc) => {
                Argument::DocString(doc.content.clone())
            }
            messages::PickleStepArgument::DataTable(table) => {
                Argument::DataTable(table.rows.clone())
            }
        });
        Ok(Step::new(
            self.id_generator.new_id(),
            pickle_step.id.clone(),
            pickle_step.text.clone(),
            Location::new(pickle.uri.clone(), ast_location.line),
            argument,
        ))
    }

    fn pickle_location(
        &self,
        pickle: &messages::Pickle,
    ) -> Result<Location, Error> {
        pickle
            .ast_node_ids
            .last()
            .and_then(|id| self.query.borrow().location(id))
            .map(|loc| Location::new(pickle.uri.clone(), loc.line))
            .ok_or_else(|| Error::UnresolvedPickle {
                id: pickle.id.clone(),
                uri: pickle.uri.clone(),
            })
    }
}

impl<R: Receiver<Case>> Receiver<messages::Pickle> for Compiler<R> {
    fn accept(&mut self, pickle: messages::Pickle) -> crate::Result<()> {
        let case = self.create_test_case(&pickle)?;
        debug!(
            pickle = pickle.id.as_str(),
            case = case.id(),
            "compiled test case"
        );
        self.event_bus.test_case_created(&case);
        self.receiver.accept(case)
    }

    fn done(&mut self) -> crate::Result<()> {
        self.receiver.done()
    }
}
