// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Messages crossing the parser boundary.
//!
//! An external [Gherkin] parser produces a stream of [`Envelope`]s, each
//! carrying exactly one of a [`GherkinDocument`], a [`Pickle`] or an
//! [`Attachment`] (a parse error). The core consumes these and produces
//! [`TestCase`] messages of its own.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

use std::cell::Cell;

use serde::{Deserialize, Serialize};

/// Capability producing identifiers unique within a single run.
///
/// Identifiers are deterministic only if the generator is: callers needing
/// reproducible ids must inject [`Incrementing`].
pub trait IdGenerator {
    /// Generates the next unique identifier.
    fn new_id(&self) -> String;
}

/// Deterministic [`IdGenerator`] yielding a monotonically increasing counter
/// as a string.
#[derive(Debug, Default)]
pub struct Incrementing {
    next: Cell<u64>,
}

impl IdGenerator for Incrementing {
    fn new_id(&self) -> String {
        let id = self.next.get();
        self.next.set(id + 1);
        id.to_string()
    }
}

/// Default [`IdGenerator`] yielding randomly-distributed unique identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Position inside a source document.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub struct Location {
    /// 1-based line number.
    pub line: u32,

    /// 1-based column number, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Location {
    /// Creates a new [`Location`] at the given `line`.
    #[must_use]
    pub const fn new(line: u32) -> Self {
        Self { line, column: None }
    }
}

/// Single unit of the parser's output stream.
///
/// Exactly one of the fields is expected to be filled; an [`Envelope`] with
/// none of them set is treated as a fatal integration error by the
/// [`Parser`].
///
/// [`Parser`]: crate::parser::Parser
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Parsed document structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gherkin_document: Option<GherkinDocument>,

    /// Fully resolved scenario instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickle: Option<Pickle>,

    /// Parse error report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl Envelope {
    /// Wraps a [`GherkinDocument`] into an [`Envelope`].
    #[must_use]
    pub fn gherkin_document(document: GherkinDocument) -> Self {
        Self {
            gherkin_document: Some(document),
            ..Self::default()
        }
    }

    /// Wraps a [`Pickle`] into an [`Envelope`].
    #[must_use]
    pub fn pickle(pickle: Pickle) -> Self {
        Self {
            pickle: Some(pickle),
            ..Self::default()
        }
    }

    /// Wraps an [`Attachment`] into an [`Envelope`].
    #[must_use]
    pub fn attachment(attachment: Attachment) -> Self {
        Self {
            attachment: Some(attachment),
            ..Self::default()
        }
    }
}

/// Parsed structure of a single source document.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GherkinDocument {
    /// Identity of the source document.
    pub uri: String,

    /// Top-level feature, if the document contains one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<Feature>,
}

/// Top-level feature of a [`GherkinDocument`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// [`Location`] of the feature keyword.
    pub location: Location,

    /// Keyword in the document's dialect (`Feature`, most of the time).
    pub keyword: String,

    /// Name of the feature.
    pub name: String,

    /// Tags attached to the feature.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// Child nodes, in document order.
    #[serde(default)]
    pub children: Vec<FeatureChild>,
}

/// Child node of a [`Feature`] or a [`Rule`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureChild {
    /// Background shared by the sibling scenarios.
    Background(Background),

    /// Scenario (or scenario outline, already expanded into pickles).
    Scenario(Scenario),

    /// Named grouping of scenarios. Parsers don't produce nested rules.
    Rule(Rule),
}

/// Background node of a [`GherkinDocument`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    /// Unique AST node id.
    pub id: String,

    /// [`Location`] of the background keyword.
    pub location: Location,

    /// Keyword in the document's dialect.
    pub keyword: String,

    /// Name of the background.
    pub name: String,

    /// Steps of the background, in document order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Scenario node of a [`GherkinDocument`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Unique AST node id.
    pub id: String,

    /// [`Location`] of the scenario keyword.
    pub location: Location,

    /// Keyword in the document's dialect.
    pub keyword: String,

    /// Name of the scenario.
    pub name: String,

    /// Tags attached to the scenario.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// Steps of the scenario, in document order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Rule node of a [`GherkinDocument`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique AST node id.
    pub id: String,

    /// [`Location`] of the rule keyword.
    pub location: Location,

    /// Keyword in the document's dialect.
    pub keyword: String,

    /// Name of the rule.
    pub name: String,

    /// Child nodes, in document order.
    #[serde(default)]
    pub children: Vec<FeatureChild>,
}

/// Step node of a [`GherkinDocument`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Unique AST node id.
    pub id: String,

    /// [`Location`] of the step keyword.
    pub location: Location,

    /// Keyword in the document's dialect (`Given`, `When`, ...).
    pub keyword: String,

    /// Text of the step, without the keyword.
    pub text: String,
}

/// Tag attached to a [`Feature`], [`Scenario`] or examples table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Unique AST node id.
    pub id: String,

    /// [`Location`] of the tag.
    pub location: Location,

    /// Name of the tag, including the leading `@`.
    pub name: String,
}

/// Fully resolved scenario instance, ready for compilation.
///
/// Outline placeholders are already substituted by the external parser.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pickle {
    /// Unique id of this pickle.
    pub id: String,

    /// Identity of the source document this pickle came from.
    pub uri: String,

    /// Name of the originating scenario.
    pub name: String,

    /// Dialect the source document was written in.
    pub language: String,

    /// Steps of this pickle, in execution order.
    #[serde(default)]
    pub steps: Vec<PickleStep>,

    /// Tags inherited from the feature and scenario.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<PickleTag>,

    /// AST node ids this pickle was derived from. The last one locates the
    /// pickle in its source document.
    pub ast_node_ids: Vec<String>,
}

/// Single step of a [`Pickle`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleStep {
    /// Unique id of this pickle step.
    pub id: String,

    /// Text of the step, placeholders substituted.
    pub text: String,

    /// Multiline argument attached to the step, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<PickleStepArgument>,

    /// AST node ids this step was derived from.
    pub ast_node_ids: Vec<String>,
}

/// Multiline argument of a [`PickleStep`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PickleStepArgument {
    /// Literal block of text.
    DocString(PickleDocString),

    /// Tabular data.
    DataTable(PickleTable),
}

/// Doc string argument of a [`PickleStep`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleDocString {
    /// Media type annotation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Literal content.
    pub content: String,
}

/// Data table argument of a [`PickleStep`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleTable {
    /// Cell values, row-major.
    pub rows: Vec<Vec<String>>,
}

/// Tag of a [`Pickle`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleTag {
    /// Name of the tag, including the leading `@`.
    pub name: String,

    /// AST node id of the originating [`Tag`].
    pub ast_node_id: String,
}

/// Out-of-band message of the parser, used to report parse errors.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Error description.
    pub text: String,

    /// Media type of the attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// Message form of a compiled [`Case`].
///
/// [`Case`]: crate::test::Case
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Unique id of the test case.
    pub id: String,

    /// Id of the [`Pickle`] this test case was compiled from.
    pub pickle_id: String,

    /// Name of the test case.
    pub name: String,

    /// Steps of the test case, in execution order.
    pub test_steps: Vec<TestStep>,
}

/// Message form of a compiled [`Step`].
///
/// Exactly one of [`pickle_step_id`] and [`hook_id`] is filled, classifying
/// the step as an ordinary or a hook one.
///
/// [`Step`]: crate::test::Step
/// [`hook_id`]: TestStep::hook_id
/// [`pickle_step_id`]: TestStep::pickle_step_id
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    /// Unique id of the test step.
    pub id: String,

    /// Text of the step.
    pub text: String,

    /// Back-reference to the originating [`PickleStep`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickle_step_id: Option<String>,

    /// Id of the hook this step was materialized from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_id: Option<String>,
}
