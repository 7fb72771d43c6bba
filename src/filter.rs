// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Composable transformation of the [`Case`] stream between the
//! [`Compiler`] and the [`Runner`].
//!
//! Neither of those knows about filtering: a [`Filter`] wraps the
//! downstream [`Receiver`] and returns another [`Receiver`] with the same
//! interface, so chains compose to arbitrary depth.
//!
//! [`Compiler`]: crate::Compiler
//! [`Runner`]: crate::test::Runner

use std::mem;

use regex::Regex;

use crate::{
    receiver::Receiver,
    test::{Action, Case, Location, Step},
};

/// Capability turning a downstream [`Receiver`] into an upstream one.
///
/// A filter may drop, duplicate, reorder (buffering is legal) or transform
/// items, as long as a transformed [`Case`] still satisfies the case
/// invariants and `done()` reaches the terminal receiver exactly once,
/// after all buffered items are flushed.
pub trait Filter<I> {
    /// Wraps the given downstream `receiver`, returning the receiver this
    /// stage exposes upstream.
    fn with_receiver(
        self: Box<Self>,
        receiver: Box<dyn Receiver<I>>,
    ) -> Box<dyn Receiver<I>>;
}

/// Composes `filters` onto the terminal `last_receiver`, folding from the
/// last filter to the first.
///
/// This way the first declared filter sees items first: declaration order
/// is "outermost first". No filters means the chain is the identity
/// function to `last_receiver`.
#[must_use]
pub fn compose<I>(
    filters: Vec<Box<dyn Filter<I>>>,
    last_receiver: Box<dyn Receiver<I>>,
) -> Box<dyn Receiver<I>> {
    filters
        .into_iter()
        .rev()
        .fold(last_receiver, |receiver, filter| {
            filter.with_receiver(receiver)
        })
}

/// [`Filter`] binding [`Action`]s to the steps they match, by regex over
/// the step text.
///
/// Step-definition matching itself is external to this core; this filter is
/// the seam where its outcome is applied. Steps matching no pattern are
/// forwarded unchanged (and stay undefined); hook steps and steps already
/// bound are never rebound.
#[derive(Debug, Default)]
pub struct ActivateSteps {
    activations: Vec<(Regex, Action)>,
}

impl ActivateSteps {
    /// Creates a new [`ActivateSteps`] filter with no activations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the given [`Action`] to every step whose text matches
    /// `pattern`.
    #[must_use]
    pub fn activate(mut self, pattern: Regex, action: Action) -> Self {
        self.activations.push((pattern, action));
        self
    }
}

impl Filter<Case> for ActivateSteps {
    fn with_receiver(
        self: Box<Self>,
        receiver: Box<dyn Receiver<Case>>,
    ) -> Box<dyn Receiver<Case>> {
        Box::new(ActivateStepsReceiver {
            activations: self.activations,
            receiver,
        })
    }
}

struct ActivateStepsReceiver {
    activations: Vec<(Regex, Action)>,
    receiver: Box<dyn Receiver<Case>>,
}

impl ActivateStepsReceiver {
    fn activate(&self, step: Step) -> Step {
        if step.is_hook() || step.action().is_some() {
            return step;
        }
        let matched = self
            .activations
            .iter()
            .find(|(pattern, _)| pattern.is_match(step.text()));
        match matched {
            Some((_, action)) => step.with_action(action.clone()),
            None => step,
        }
    }
}

impl Receiver<Case> for ActivateStepsReceiver {
    fn accept(&mut self, case: Case) -> crate::Result<()> {
        let steps = case
            .steps()
            .iter()
            .cloned()
            .map(|step| self.activate(step))
            .collect();
        self.receiver.accept(case.with_steps(steps))
    }

    fn done(&mut self) -> crate::Result<()> {
        self.receiver.done()
    }
}

/// [`Filter`] selecting [`Case`]s by tag.
///
/// Every listed tag must be carried by the case; a leading `~` negates,
/// requiring the tag to be absent.
#[derive(Debug)]
pub struct TagFilter {
    tags: Vec<String>,
}

impl TagFilter {
    /// Creates a new [`TagFilter`] out of the given tag list.
    #[must_use]
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }

    fn matches(&self, case: &Case) -> bool {
        self.tags.iter().all(|tag| match tag.strip_prefix('~') {
            Some(negated) => !case.has_tag(negated),
            None => case.has_tag(tag),
        })
    }
}

impl Filter<Case> for TagFilter {
    fn with_receiver(
        self: Box<Self>,
        receiver: Box<dyn Receiver<Case>>,
    ) -> Box<dyn Receiver<Case>> {
        Box::new(SelectReceiver {
            filter: *self,
            receiver,
        })
    }
}

/// [`Filter`] selecting [`Case`]s whose name matches any of the given
/// patterns.
#[derive(Debug)]
pub struct NameFilter {
    patterns: Vec<Regex>,
}

impl NameFilter {
    /// Creates a new [`NameFilter`] out of the given patterns.
    #[must_use]
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    fn matches(&self, case: &Case) -> bool {
        self.patterns
            .iter()
            .any(|pattern| case.matches_name(pattern))
    }
}

impl Filter<Case> for NameFilter {
    fn with_receiver(
        self: Box<Self>,
        receiver: Box<dyn Receiver<Case>>,
    ) -> Box<dyn Receiver<Case>> {
        Box::new(SelectReceiver {
            filter: NameSelect(*self),
            receiver,
        })
    }
}

struct NameSelect(NameFilter);

trait Select {
    fn matches(&self, case: &Case) -> bool;
}

impl Select for TagFilter {
    fn matches(&self, case: &Case) -> bool {
        TagFilter::matches(self, case)
    }
}

impl Select for NameSelect {
    fn matches(&self, case: &Case) -> bool {
        self.0.matches(case)
    }
}

struct SelectReceiver<S> {
    filter: S,
    receiver: Box<dyn Receiver<Case>>,
}

impl<S: Select> Receiver<Case> for SelectReceiver<S> {
    fn accept(&mut self, case: Case) -> crate::Result<()> {
        if self.filter.matches(&case) {
            self.receiver.accept(case)?;
        }
        Ok(())
    }

    fn done(&mut self) -> crate::Result<()> {
        self.receiver.done()
    }
}

/// [`Filter`] selecting and reordering [`Case`]s by source [`Location`].
///
/// Buffers every incoming case, then on `done()` flushes the ones matching
/// the requested locations, in request order, before forwarding `done()`
/// exactly once. Cases matching no requested location are dropped.
#[derive(Debug)]
pub struct LocationsFilter {
    locations: Vec<Location>,
}

impl LocationsFilter {
    /// Creates a new [`LocationsFilter`] out of the given locations.
    #[must_use]
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }
}

impl Filter<Case> for LocationsFilter {
    fn with_receiver(
        self: Box<Self>,
        receiver: Box<dyn Receiver<Case>>,
    ) -> Box<dyn Receiver<Case>> {
        Box::new(LocationsReceiver {
            locations: self.locations,
            buffer: Vec::new(),
            receiver,
        })
    }
}

struct LocationsReceiver {
    locations: Vec<Location>,
    buffer: Vec<Case>,
    receiver: Box<dyn Receiver<Case>>,
}

impl Receiver<Case> for LocationsReceiver {
    fn accept(&mut self, case: Case) -> crate::Result<()> {
        self.buffer.push(case);
        Ok(())
    }

    fn done(&mut self) -> crate::Result<()> {
        let mut buffered = mem::take(&mut self.buffer);
        for location in &self.locations {
            let (matching, rest): (Vec<_>, Vec<_>) = buffered
                .into_iter()
                .partition(|case| case.matches_location(location));
            for case in matching {
                self.receiver.accept(case)?;
            }
            buffered = rest;
        }
        self.receiver.done()
    }
}
