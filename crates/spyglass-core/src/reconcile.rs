//! Reconciles declared expectations with recorded events.
//!
//! Sequence mode pairs expectation `i` with event `i` and reports every
//! positional mismatch. Unordered mode lets each expectation, in declaration
//! order, claim the first remaining event that satisfies all of its fields;
//! a claimed event cannot satisfy another expectation. Leftover events are a
//! failure only under strict size.

use core::fmt;

use crate::config::MatchPolicy;
use crate::failure::Failure;
use crate::group::ConstraintGroup;

/// Match `events` against `groups` under `policy`, returning every failure.
///
/// An empty result means the assertion passes.
pub fn reconcile<E: fmt::Debug>(
    groups: &[ConstraintGroup<E>],
    events: &[E],
    policy: MatchPolicy,
) -> Vec<Failure> {
    let (mut failures, leftovers) = if policy.strict_sequence {
        in_sequence(groups, events)
    } else {
        unordered(groups, events)
    };

    if policy.strict_size && !leftovers.is_empty() {
        failures.push(Failure::Unexpected {
            elements: leftovers
                .into_iter()
                .map(|position| (position, format!("{:?}", events[position])))
                .collect(),
        });
    }

    failures
}

fn in_sequence<E>(groups: &[ConstraintGroup<E>], events: &[E]) -> (Vec<Failure>, Vec<usize>) {
    let mut failures = Vec::new();

    for (position, group) in groups.iter().enumerate() {
        match events.get(position) {
            Some(event) => {
                if let Err(fields) = group.evaluate(event) {
                    failures.push(Failure::Mismatch {
                        index: group.index(),
                        fields,
                    });
                }
            }
            None => failures.push(Failure::Missing {
                index: group.index(),
                description: group.describe(),
            }),
        }
    }

    let leftovers = (groups.len()..events.len()).collect();
    (failures, leftovers)
}

fn unordered<E>(groups: &[ConstraintGroup<E>], events: &[E]) -> (Vec<Failure>, Vec<usize>) {
    let mut failures = Vec::new();
    let mut remaining: Vec<usize> = (0..events.len()).collect();

    for group in groups {
        let claimed = remaining
            .iter()
            .position(|&position| group.matches(&events[position]));

        match claimed {
            Some(slot) => {
                let position = remaining.remove(slot);
                tracing::debug!(
                    expectation = group.index(),
                    position,
                    "expectation claimed recorded event"
                );
            }
            None => failures.push(Failure::Unmatched {
                index: group.index(),
                description: group.describe(),
            }),
        }
    }

    (failures, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::FieldConstraint;
    use serde_json::{Value, json};

    fn group(index: usize, name: &'static str) -> ConstraintGroup<Value> {
        ConstraintGroup::with_constraints(
            index,
            vec![FieldConstraint::new("name", name, |event: &Value| {
                event["name"].clone()
            })],
        )
    }

    fn events(names: &[&str]) -> Vec<Value> {
        names.iter().map(|name| json!({"name": name})).collect()
    }

    #[test]
    fn test_nothing_declared_nothing_recorded() {
        let failures = reconcile::<Value>(&[], &[], MatchPolicy::strict());
        assert!(failures.is_empty());
    }

    #[test]
    fn test_sequence_reports_every_position() {
        let groups = vec![group(0, "a"), group(1, "b"), group(2, "c")];
        let failures = reconcile(&groups, &events(&["x", "b", "y"]), MatchPolicy::strict());

        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0], Failure::Mismatch { index: 0, .. }));
        assert!(matches!(failures[1], Failure::Mismatch { index: 2, .. }));
    }

    #[test]
    fn test_sequence_rejects_reordered_events() {
        let groups = vec![group(0, "b"), group(1, "a")];
        let failures = reconcile(&groups, &events(&["a", "b"]), MatchPolicy::strict());
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn test_sequence_missing_event() {
        let groups = vec![group(0, "a"), group(1, "b")];
        let failures = reconcile(&groups, &events(&["a"]), MatchPolicy::strict());

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], Failure::Missing { index: 1, .. }));
    }

    #[test]
    fn test_strict_size_reports_leftovers() {
        let groups = vec![group(0, "a")];
        let recorded = events(&["a", "b"]);

        let failures = reconcile(&groups, &recorded, MatchPolicy::strict());
        assert_eq!(failures.len(), 1);
        let Failure::Unexpected { elements } = &failures[0] else {
            panic!("expected leftover report, got {failures:?}");
        };
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].0, 1);
        assert!(elements[0].1.contains("\"b\""));

        let relaxed = MatchPolicy {
            strict_sequence: true,
            strict_size: false,
        };
        assert!(reconcile(&groups, &recorded, relaxed).is_empty());
    }

    #[test]
    fn test_unordered_matches_reversed_declarations() {
        let groups = vec![group(0, "b"), group(1, "a")];
        let unordered = MatchPolicy {
            strict_sequence: false,
            strict_size: true,
        };
        assert!(reconcile(&groups, &events(&["a", "b"]), unordered).is_empty());
    }

    #[test]
    fn test_unordered_event_claimed_once() {
        let groups = vec![group(0, "a"), group(1, "a")];
        let failures = reconcile(&groups, &events(&["a", "b"]), MatchPolicy::lenient());

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], Failure::Unmatched { index: 1, .. }));
    }

    #[test]
    fn test_unordered_first_fit_leaves_unclaimed_events() {
        let groups = vec![group(0, "a")];
        let unordered = MatchPolicy {
            strict_sequence: false,
            strict_size: true,
        };
        let failures = reconcile(&groups, &events(&["b", "a", "a"]), unordered);

        let Failure::Unexpected { elements } = &failures[0] else {
            panic!("expected leftover report, got {failures:?}");
        };
        let positions: Vec<usize> = elements.iter().map(|(position, _)| *position).collect();
        assert_eq!(positions, vec![0, 2]);
    }
}
