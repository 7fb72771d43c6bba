//! Outcome of executing a single [`Step`] or a whole [`Case`].
//!
//! [`Case`]: crate::test::Case
//! [`Step`]: crate::test::Step

use std::{any::Any, sync::Arc};

use derive_more::with_trait::{Debug, Display};

/// Alias for a [`catch_unwind()`] error.
///
/// [`catch_unwind()`]: std::panic::catch_unwind()
pub type Info = Arc<dyn Any + Send + 'static>;

/// Outcome of a single [`Step`] execution, or the aggregate outcome of a
/// [`Case`].
///
/// Exactly one variant is active; results are produced once per execution
/// and are immutable. A captured error is represented as a plain value
/// ([`Failure`]) rather than propagated, so results stay comparable across
/// boundaries.
///
/// [`Case`]: crate::test::Case
/// [`Step`]: crate::test::Step
#[derive(Clone, Debug, Default, Display)]
pub enum TestResult {
    /// No execution has been attempted yet.
    #[default]
    #[display("unknown")]
    Unknown,

    /// The action completed without raising.
    #[display("passed")]
    Passed,

    /// The action raised; the error is captured verbatim.
    #[display("failed: {_0}")]
    Failed(Failure),

    /// The step has no bound action. Not an error: a distinguished result
    /// used for reporting coverage gaps.
    #[display("undefined")]
    Undefined,

    /// A prior step of the same test case already failed, so this one was
    /// never invoked.
    #[display("skipped")]
    Skipped,

    /// The action explicitly signalled "not yet implemented".
    #[display("pending: {_0}")]
    Pending(String),
}

impl TestResult {
    /// Indicates whether this is a [`TestResult::Passed`].
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Indicates whether this is a [`TestResult::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Indicates whether this is a [`TestResult::Undefined`].
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Indicates whether this is a [`TestResult::Skipped`].
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Indicates whether this is a [`TestResult::Pending`].
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns the captured [`Failure`], if this is a
    /// [`TestResult::Failed`].
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the more severe of the two results, preferring `self` on a
    /// tie. Used to aggregate step results into a per-case result.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    const fn severity(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Passed => 1,
            Self::Skipped => 2,
            Self::Undefined => 3,
            Self::Pending(_) => 4,
            Self::Failed(_) => 5,
        }
    }
}

impl PartialEq for TestResult {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unknown, Self::Unknown)
            | (Self::Passed, Self::Passed)
            | (Self::Undefined, Self::Undefined)
            | (Self::Skipped, Self::Skipped) => true,
            (Self::Failed(l), Self::Failed(r)) => l == r,
            (Self::Pending(l), Self::Pending(r)) => l == r,
            _ => false,
        }
    }
}

/// Error captured from a raising action.
///
/// Holds the raised payload verbatim ([`Info`]), plus a message coerced out
/// of it for reporting.
#[derive(Clone, Debug, Display)]
#[display("{message}")]
pub struct Failure {
    /// Raised payload, untouched.
    #[debug(skip)]
    pub error: Info,

    /// Human-readable rendering of the payload.
    pub message: String,
}

impl Failure {
    /// Captures the payload of a [`catch_unwind()`] verbatim.
    ///
    /// [`catch_unwind()`]: std::panic::catch_unwind()
    #[must_use]
    pub fn from_unwind(payload: Box<dyn Any + Send + 'static>) -> Self {
        let error: Info = Arc::from(payload);
        let message = coerce_error(&error);
        Self { error, message }
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
            && self.message == other.message
    }
}

/// Renders a captured payload as a [`String`].
#[must_use]
pub fn coerce_error(err: &Info) -> String {
    if let Some(string) = err.downcast_ref::<String>() {
        string.clone()
    } else if let Some(&string) = err.downcast_ref::<&str>() {
        string.to_owned()
    } else {
        "(Could not resolve panic payload)".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> Failure {
        Failure::from_unwind(Box::new(message.to_owned()))
    }

    #[test]
    fn worst_prefers_more_severe_result() {
        let failed = TestResult::Failed(failure("boom"));
        assert_eq!(
            TestResult::Passed.worst(failed.clone()),
            failed.clone(),
        );
        assert_eq!(failed.clone().worst(TestResult::Skipped), failed);
        assert_eq!(
            TestResult::Unknown.worst(TestResult::Passed),
            TestResult::Passed,
        );
        assert_eq!(
            TestResult::Undefined.worst(TestResult::Passed),
            TestResult::Undefined,
        );
    }

    #[test]
    fn failures_compare_by_payload_identity() {
        let original = failure("boom");
        let same = original.clone();
        let other = failure("boom");

        assert_eq!(original, same);
        assert_ne!(original, other);
    }

    #[test]
    fn coerces_str_and_string_payloads() {
        assert_eq!(
            failure("oops").message,
            "oops",
        );
        let unresolvable = Failure::from_unwind(Box::new(7_i32));
        assert_eq!(unresolvable.message, "(Could not resolve panic payload)");
    }

    #[test]
    fn displays_by_kind() {
        assert_eq!(TestResult::Passed.to_string(), "passed");
        assert_eq!(
            TestResult::Pending("later".into()).to_string(),
            "pending: later",
        );
        assert_eq!(
            TestResult::Failed(failure("boom")).to_string(),
            "failed: boom",
        );
    }
}
