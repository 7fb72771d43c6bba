//! Executor of compiled (possibly filtered) [`Case`]s.

use std::rc::Rc;

use tracing::debug;

use crate::{event::EventBus, receiver::Receiver};

use super::{case::Case, result::TestResult};

/// Terminal [`Receiver`] of the pipeline: executes each incoming [`Case`]
/// and publishes lifecycle events around every case and step.
///
/// Exactly one [`Case`] executes at a time per [`Runner`]; event order
/// matches the order cases and steps were received.
///
/// Once a step of a case yields anything but [`TestResult::Passed`], all
/// subsequent ordinary steps of that case are reported as
/// [`TestResult::Skipped`] without invoking their action. Hook steps still
/// execute regardless, so After-hooks can clean up.
#[derive(Debug)]
pub struct Runner {
    event_bus: Rc<EventBus>,
}

impl Runner {
    /// Creates a new [`Runner`] publishing on the given [`EventBus`].
    #[must_use]
    pub fn new(event_bus: Rc<EventBus>) -> Self {
        Self { event_bus }
    }
}

impl Receiver<Case> for Runner {
    fn accept(&mut self, case: Case) -> crate::Result<()> {
        debug!(id = case.id(), name = case.name(), "executing test case");
        self.event_bus.test_case_started(&case);

        let mut aggregate = TestResult::Unknown;
        for step in case.steps() {
            self.event_bus.test_step_started(step);

            let keep_running = matches!(
                aggregate,
                TestResult::Unknown | TestResult::Passed,
            );
            let result = if keep_running || step.is_hook() {
                step.execute(&[])
            } else {
                TestResult::Skipped
            };

            self.event_bus.test_step_finished(step, &result);
            aggregate = aggregate.worst(result);
        }

        self.event_bus.test_case_finished(&case, &aggregate);
        Ok(())
    }

    fn done(&mut self) -> crate::Result<()> {
        debug!("test run finished");
        self.event_bus.test_run_finished();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::{
        event::Event,
        test::{Action, Location, Step},
    };

    use super::*;

    fn location() -> Location {
        Location::new("features/f.feature", 1)
    }

    fn case(steps: Vec<Step>) -> Case {
        Case::new("c1", "p1", "scenario", location(), Vec::new(), steps)
    }

    fn passing(id: &str) -> Step {
        Step::new(id, format!("ps-{id}"), "passes", location(), None)
            .with_action(Action::new(|_| Ok(())))
    }

    fn failing(id: &str) -> Step {
        Step::new(id, format!("ps-{id}"), "fails", location(), None)
            .with_action(Action::new(|_| panic!("boom")))
    }

    fn step_results(events: &[Event]) -> Vec<TestResult> {
        events
            .iter()
            .filter_map(|ev| match ev {
                Event::TestStepFinished(_, result) => Some(result.clone()),
                _ => None,
            })
            .collect()
    }

    fn run(case: Case) -> Vec<Event> {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |ev| sink.borrow_mut().push(ev.clone()));

        let mut runner = Runner::new(bus);
        runner.accept(case).unwrap();
        runner.done().unwrap();

        let events = seen.borrow().clone();
        events
    }

    #[test]
    fn skips_ordinary_steps_after_a_failure() {
        let events = run(case(vec![
            passing("s1"),
            failing("s2"),
            passing("s3"),
        ]));

        let results = step_results(&events);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_passed());
        assert!(results[1].is_failed());
        assert!(results[2].is_skipped());

        assert!(matches!(
            events.last(),
            Some(Event::TestRunFinished),
        ));
    }

    #[test]
    fn after_hooks_still_execute_after_a_failure() {
        let after = Step::hook(
            "h1",
            "after-hook",
            "After hook",
            location(),
            Action::new(|_| Ok(())),
        );
        let events = run(case(vec![failing("s1"), passing("s2"), after]));

        let results = step_results(&events);
        assert!(results[0].is_failed());
        assert!(results[1].is_skipped());
        assert!(results[2].is_passed());
    }

    #[test]
    fn undefined_step_short_circuits_the_rest() {
        let undefined =
            Step::new("s1", "ps1", "undefined", location(), None);
        let events = run(case(vec![undefined, passing("s2")]));

        let results = step_results(&events);
        assert!(results[0].is_undefined());
        assert!(results[1].is_skipped());
    }

    #[test]
    fn aggregates_the_worst_result_per_case() {
        let events = run(case(vec![passing("s1"), failing("s2")]));
        let aggregate = events
            .iter()
            .find_map(|ev| match ev {
                Event::TestCaseFinished(_, result) => Some(result.clone()),
                _ => None,
            })
            .unwrap();
        assert!(aggregate.is_failed());
    }

    #[test]
    fn empty_case_finishes_unknown() {
        let events = run(case(Vec::new()));
        assert!(matches!(
            events.first(),
            Some(Event::TestCaseStarted(_)),
        ));
        assert!(events.iter().any(|ev| matches!(
            ev,
            Event::TestCaseFinished(_, TestResult::Unknown),
        )));
    }
}
