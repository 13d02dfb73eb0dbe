//! Status transitions coupled to side effects
//!
//! [`TransitionCoordinator`] moves any [`Transitionable`] entity along its
//! status machine. When the target status requires a side effect, the effect
//! runs under the entity's row lock against the staged copy, and the new
//! status is only written back if the effect reports full success. Two
//! callers racing on the same entity are serialized by that lock; the loser
//! sees the winner's status and gets `InvalidTransition`.

use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::events::{DomainEvent, EventSink};
use crate::models::{TransitionAudit, Transitionable};
use crate::storage::{Persistence, RowTable};

/// Result of a committed transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome<E: Transitionable> {
    pub entity_id: E::Id,
    pub old_status: E::Status,
    pub new_status: E::Status,
}

/// Drives entities of one kind through their status machine
pub struct TransitionCoordinator<'a, E: Transitionable> {
    table: &'a RowTable<E::Id, E>,
    persistence: &'a dyn Persistence,
    events: &'a dyn EventSink,
}

impl<'a, E: Transitionable> TransitionCoordinator<'a, E> {
    pub fn new(
        table: &'a RowTable<E::Id, E>,
        persistence: &'a dyn Persistence,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            table,
            persistence,
            events,
        }
    }

    /// Move entity `id` to `target`
    ///
    /// `side_effect` runs only when `E::requires_side_effect(target)`; any
    /// error it returns is reported as `SideEffectFailed` and the entity keeps
    /// its old status. An entity that cannot move from its current status to
    /// `target` fails with `InvalidTransition`.
    pub fn transition<F>(
        &self,
        id: E::Id,
        target: E::Status,
        audit: TransitionAudit,
        side_effect: F,
    ) -> StoreResult<TransitionOutcome<E>>
    where
        F: FnOnce(&E) -> StoreResult<()>,
    {
        debug!(entity = E::ENTITY_NAME, id = %id, to = %target, "Transition requested");

        let outcome = self
            .table
            .transact(id, |entity| {
                let from = entity.status();
                if !E::can_transition(from, target) {
                    return Err(StoreError::InvalidTransition {
                        from: from.to_string(),
                        to: target.to_string(),
                    });
                }

                entity.apply_transition(target, &audit);

                if E::requires_side_effect(target) {
                    side_effect(entity).map_err(|e| match e {
                        StoreError::SideEffectFailed { .. } => e,
                        other => StoreError::SideEffectFailed {
                            reason: other.to_string(),
                        },
                    })?;
                }

                Ok(TransitionOutcome::<E> {
                    entity_id: id,
                    old_status: from,
                    new_status: target,
                })
            })
            .map_err(|e| {
                warn!(entity = E::ENTITY_NAME, id = %id, to = %target, error = %e, "Transition rejected");
                e
            })?
            .ok_or_else(|| StoreError::NotFound {
                entity_type: E::ENTITY_NAME,
                identifier: id.to_string(),
            })?;

        // The side effect already happened; a failed write is reported but
        // the in-memory status stays, so a retry will see the new status.
        self.persistence.commit()?;

        info!(
            entity = E::ENTITY_NAME,
            id = %id,
            from = %outcome.old_status,
            to = %outcome.new_status,
            actor = %audit.actor,
            "Transition committed"
        );
        self.events.emit(&DomainEvent::Transitioned {
            entity_type: E::ENTITY_NAME,
            entity_id: id.to_string(),
            old_status: outcome.old_status.to_string(),
            new_status: outcome.new_status.to_string(),
            actor: audit.actor.clone(),
        });

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullSink, RecordingSink};
    use crate::models::{Report, ReportId, ReportStatus, UserId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoDisk;

    impl Persistence for NoDisk {
        fn commit(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    fn table_with(report: &Report) -> RowTable<ReportId, Report> {
        let table = RowTable::new("reports");
        table.insert_new(report.id, report.clone()).unwrap();
        table
    }

    fn audit() -> TransitionAudit {
        TransitionAudit::now("mod", None)
    }

    #[test]
    fn test_transition_without_side_effect() {
        let report = Report::new(UserId::new(), "spam", None);
        let table = table_with(&report);
        let sink = RecordingSink::new();
        let coordinator = TransitionCoordinator::new(&table, &NoDisk, &sink);

        let outcome = coordinator
            .transition(report.id, ReportStatus::Reviewed, audit(), |_| {
                panic!("review has no side effect")
            })
            .unwrap();

        assert_eq!(outcome.old_status, ReportStatus::Pending);
        assert_eq!(outcome.new_status, ReportStatus::Reviewed);
        let stored = table.get(report.id).unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Reviewed);
        assert_eq!(stored.resolved_by.as_deref(), Some("mod"));
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_failed_side_effect_keeps_status() {
        let report = Report::new(UserId::new(), "spam", None);
        let table = table_with(&report);
        let sink = RecordingSink::new();
        let coordinator = TransitionCoordinator::new(&table, &NoDisk, &sink);

        let err = coordinator
            .transition(report.id, ReportStatus::Resolved, audit(), |_| {
                Err(StoreError::Io("permission denied".into()))
            })
            .unwrap_err();

        assert!(matches!(err, StoreError::SideEffectFailed { .. }));
        let stored = table.get(report.id).unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Pending);
        assert!(stored.resolved_by.is_none());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_invalid_transition() {
        let mut report = Report::new(UserId::new(), "spam", None);
        report.status = ReportStatus::Dismissed;
        let table = table_with(&report);
        let coordinator = TransitionCoordinator::new(&table, &NoDisk, &NullSink);

        let err = coordinator
            .transition(report.id, ReportStatus::Resolved, audit(), |_| Ok(()))
            .unwrap_err();

        match err {
            StoreError::InvalidTransition { from, to } => {
                assert_eq!(from, "dismissed");
                assert_eq!(to, "resolved");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_entity() {
        let table: RowTable<ReportId, Report> = RowTable::new("reports");
        let coordinator = TransitionCoordinator::new(&table, &NoDisk, &NullSink);

        let err = coordinator
            .transition(ReportId::new(), ReportStatus::Reviewed, audit(), |_| Ok(()))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_racing_resolves_run_side_effect_once() {
        let report = Report::new(UserId::new(), "spam", None);
        let table = table_with(&report);
        let coordinator = TransitionCoordinator::new(&table, &NoDisk, &NullSink);
        let effects = AtomicUsize::new(0);

        let successes: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        coordinator
                            .transition(report.id, ReportStatus::Resolved, audit(), |_| {
                                effects.fetch_add(1, Ordering::SeqCst);
                                Ok(())
                            })
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap() as usize)
                .sum()
        });

        assert_eq!(successes, 1);
        assert_eq!(effects.load(Ordering::SeqCst), 1);
    }
}
