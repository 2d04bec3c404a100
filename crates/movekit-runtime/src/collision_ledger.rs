//! [`CollisionLedger`] – engine-side collision sessions keyed by the
//! contacting object.
//!
//! Hard (contact) and soft (proximity) collisions are tracked in two
//! independent maps.  Each `(kind, object)` pair owns at most one engine
//! collision session at a time; asking for a second one is a
//! [`MoveError::DuplicateCollision`] and leaves the ledger untouched.
//!
//! The ledger talks to the engine itself so that an entry and its engine
//! session are always created and torn down together:
//!
//! | Call | Engine traffic | Ledger effect |
//! |---|---|---|
//! | [`begin_hard`][CollisionLedger::begin_hard] | `start_hard_collision` | insert |
//! | [`refresh_hard`][CollisionLedger::refresh_hard] | `update_hard_collision` | – |
//! | [`begin_soft`][CollisionLedger::begin_soft] | `start_soft_collision` | insert |
//! | [`finish`][CollisionLedger::finish] | `end_collision` | remove (even on failure) |
//! | [`end_all`][CollisionLedger::end_all] | `end_collision` per entry, stops at the first failure | clear |

use std::collections::HashMap;

use movekit_hal::MovementEngine;
use movekit_types::{CollisionHandle, CollisionKind, EngineOp, MoveError, ObjectId, SessionHandle, Vec3};
use tracing::{debug, error};

/// One active collision session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEntry {
    pub object: ObjectId,
    pub handle: CollisionHandle,
}

/// Active hard and soft collision sessions of one movement session.
#[derive(Debug, Default)]
pub struct CollisionLedger {
    hard: HashMap<ObjectId, CollisionHandle>,
    soft: HashMap<ObjectId, CollisionHandle>,
}

impl CollisionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: CollisionKind) -> &HashMap<ObjectId, CollisionHandle> {
        match kind {
            CollisionKind::Hard => &self.hard,
            CollisionKind::Soft => &self.soft,
        }
    }

    fn map_mut(&mut self, kind: CollisionKind) -> &mut HashMap<ObjectId, CollisionHandle> {
        match kind {
            CollisionKind::Hard => &mut self.hard,
            CollisionKind::Soft => &mut self.soft,
        }
    }

    // ── Bookkeeping ─────────────────────────────────────────────────────────

    /// Engine handle tracked for `(kind, object)`.
    pub fn get(&self, kind: CollisionKind, object: ObjectId) -> Option<CollisionHandle> {
        self.map(kind).get(&object).copied()
    }

    pub fn contains(&self, kind: CollisionKind, object: ObjectId) -> bool {
        self.map(kind).contains_key(&object)
    }

    pub fn len(&self, kind: CollisionKind) -> usize {
        self.map(kind).len()
    }

    /// True when neither kind has an active entry.
    pub fn is_empty(&self) -> bool {
        self.hard.is_empty() && self.soft.is_empty()
    }

    /// Entries of one kind, ordered by object id.
    pub fn entries(&self, kind: CollisionKind) -> Vec<CollisionEntry> {
        let mut entries: Vec<CollisionEntry> = self
            .map(kind)
            .iter()
            .map(|(&object, &handle)| CollisionEntry { object, handle })
            .collect();
        entries.sort_by_key(|e| e.object);
        entries
    }

    pub fn remove(&mut self, kind: CollisionKind, object: ObjectId) -> Option<CollisionHandle> {
        self.map_mut(kind).remove(&object)
    }

    /// Drop every entry of `kind` without telling the engine.
    pub fn clear(&mut self, kind: CollisionKind) {
        self.map_mut(kind).clear();
    }

    /// Drop every entry of both kinds without telling the engine.
    pub fn clear_all(&mut self) {
        self.hard.clear();
        self.soft.clear();
    }

    fn ensure_vacant(&self, kind: CollisionKind, object: ObjectId) -> Result<(), MoveError> {
        if self.contains(kind, object) {
            return Err(MoveError::DuplicateCollision { kind, object });
        }
        Ok(())
    }

    // ── Engine-backed operations ────────────────────────────────────────────

    /// Start a hard collision with `object` along `normal`.
    pub fn begin_hard(
        &mut self,
        engine: &mut dyn MovementEngine,
        session: SessionHandle,
        object: ObjectId,
        normal: Vec3,
    ) -> Result<CollisionHandle, MoveError> {
        self.ensure_vacant(CollisionKind::Hard, object)?;
        let handle = engine
            .start_hard_collision(session, normal)
            .map_err(MoveError::engine(EngineOp::StartHardCollision))?;
        self.hard.insert(object, handle);
        debug!(%object, %handle, "hard collision started");
        Ok(handle)
    }

    /// Forward a fresh contact normal for a tracked hard collision.  Does
    /// nothing for untracked objects.
    pub fn refresh_hard(
        &mut self,
        engine: &mut dyn MovementEngine,
        session: SessionHandle,
        object: ObjectId,
        normal: Vec3,
    ) -> Result<(), MoveError> {
        let Some(handle) = self.get(CollisionKind::Hard, object) else {
            return Ok(());
        };
        engine
            .update_hard_collision(session, handle, normal)
            .map_err(MoveError::engine(EngineOp::UpdateHardCollision))
    }

    /// Start a soft collision with the proximity zone of `object`.
    pub fn begin_soft(
        &mut self,
        engine: &mut dyn MovementEngine,
        session: SessionHandle,
        object: ObjectId,
        other_center: Vec3,
        closest_distance: f32,
        max_distance: f32,
    ) -> Result<CollisionHandle, MoveError> {
        self.ensure_vacant(CollisionKind::Soft, object)?;
        let handle = engine
            .start_soft_collision(session, other_center, closest_distance, max_distance)
            .map_err(MoveError::engine(EngineOp::StartSoftCollision))?;
        self.soft.insert(object, handle);
        debug!(%object, %handle, closest_distance, max_distance, "soft collision started");
        Ok(handle)
    }

    /// End the `kind` collision with `object`.  The entry is removed whether
    /// or not the engine accepts the end call.  Untracked objects are
    /// ignored.
    pub fn finish(
        &mut self,
        engine: &mut dyn MovementEngine,
        session: SessionHandle,
        kind: CollisionKind,
        object: ObjectId,
    ) -> Result<(), MoveError> {
        let Some(handle) = self.remove(kind, object) else {
            return Ok(());
        };
        debug!(%object, %handle, %kind, "collision ended");
        engine
            .end_collision(session, handle)
            .map_err(MoveError::engine(EngineOp::EndCollision))
    }

    /// End every collision of the given kinds, in order.
    ///
    /// Draining stops at the first engine failure; the remaining entries of
    /// that kind and every later kind are dropped without an end call.  All
    /// listed kinds are cleared either way.
    pub fn end_all(
        &mut self,
        engine: &mut dyn MovementEngine,
        session: SessionHandle,
        kinds: &[CollisionKind],
    ) -> Result<(), MoveError> {
        let mut outcome = Ok(());
        for &kind in kinds {
            if outcome.is_ok() {
                for entry in self.entries(kind) {
                    if let Err(fault) = engine.end_collision(session, entry.handle) {
                        error!(object = %entry.object, handle = %entry.handle, %kind, %fault,
                            "failed to end collision");
                        outcome = Err(MoveError::engine(EngineOp::EndCollision)(fault));
                        break;
                    }
                }
            }
            self.clear(kind);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movekit_hal::scripted::ScriptedEngine;
    use movekit_types::{
        EngineFault, MovementSettings, ObjectSnapshot, SixDofControl, SixDofSettings,
    };

    fn engine_with_session() -> (ScriptedEngine, SessionHandle) {
        let mut engine = ScriptedEngine::new();
        let session = engine
            .start_6dof(
                &MovementSettings::default(),
                &SixDofSettings::default(),
                &SixDofControl::default(),
                &ObjectSnapshot::default(),
            )
            .unwrap();
        (engine, session)
    }

    #[test]
    fn distinct_objects_each_get_an_entry() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        for id in 1..=3 {
            ledger
                .begin_hard(&mut engine, session, ObjectId(id), Vec3::up())
                .unwrap();
        }
        assert_eq!(ledger.len(CollisionKind::Hard), 3);
        assert_eq!(ledger.len(CollisionKind::Soft), 0);
    }

    #[test]
    fn duplicate_begin_is_rejected_without_engine_call() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        let first = ledger
            .begin_hard(&mut engine, session, ObjectId(7), Vec3::up())
            .unwrap();

        let err = ledger
            .begin_hard(&mut engine, session, ObjectId(7), Vec3::up())
            .unwrap_err();
        assert_eq!(
            err,
            MoveError::DuplicateCollision {
                kind: CollisionKind::Hard,
                object: ObjectId(7)
            }
        );
        assert_eq!(engine.count(EngineOp::StartHardCollision), 1);
        assert_eq!(ledger.get(CollisionKind::Hard, ObjectId(7)), Some(first));
    }

    #[test]
    fn same_object_may_be_hard_and_soft() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        ledger
            .begin_hard(&mut engine, session, ObjectId(1), Vec3::up())
            .unwrap();
        ledger
            .begin_soft(&mut engine, session, ObjectId(1), Vec3::zero(), 0.5, 1.0)
            .unwrap();
        assert!(ledger.contains(CollisionKind::Hard, ObjectId(1)));
        assert!(ledger.contains(CollisionKind::Soft, ObjectId(1)));
    }

    #[test]
    fn finish_removes_entry_even_when_engine_fails() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        ledger
            .begin_hard(&mut engine, session, ObjectId(4), Vec3::up())
            .unwrap();
        engine.fail_next(EngineOp::EndCollision, EngineFault::Internal("lost".into()));

        let result = ledger.finish(&mut engine, session, CollisionKind::Hard, ObjectId(4));
        assert!(matches!(
            result,
            Err(MoveError::Engine {
                operation: EngineOp::EndCollision,
                ..
            })
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn finish_untracked_object_is_noop() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        ledger
            .finish(&mut engine, session, CollisionKind::Soft, ObjectId(99))
            .unwrap();
        assert_eq!(engine.count(EngineOp::EndCollision), 0);
    }

    #[test]
    fn refresh_forwards_normal_for_tracked_object_only() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        ledger
            .begin_hard(&mut engine, session, ObjectId(2), Vec3::up())
            .unwrap();
        ledger
            .refresh_hard(&mut engine, session, ObjectId(2), Vec3::forward())
            .unwrap();
        ledger
            .refresh_hard(&mut engine, session, ObjectId(3), Vec3::forward())
            .unwrap();
        assert_eq!(engine.count(EngineOp::UpdateHardCollision), 1);
    }

    #[test]
    fn end_all_hard_leaves_soft_intact() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        ledger
            .begin_hard(&mut engine, session, ObjectId(1), Vec3::up())
            .unwrap();
        ledger
            .begin_soft(&mut engine, session, ObjectId(2), Vec3::zero(), 0.5, 1.0)
            .unwrap();

        ledger
            .end_all(&mut engine, session, &[CollisionKind::Hard])
            .unwrap();
        assert_eq!(ledger.len(CollisionKind::Hard), 0);
        assert_eq!(ledger.len(CollisionKind::Soft), 1);
        assert_eq!(engine.count(EngineOp::EndCollision), 1);
    }

    #[test]
    fn end_all_stops_at_first_failure_but_clears() {
        let (mut engine, session) = engine_with_session();
        let mut ledger = CollisionLedger::new();
        for id in 1..=3 {
            ledger
                .begin_hard(&mut engine, session, ObjectId(id), Vec3::up())
                .unwrap();
        }
        ledger
            .begin_soft(&mut engine, session, ObjectId(9), Vec3::zero(), 0.5, 1.0)
            .unwrap();
        engine.fail_next(EngineOp::EndCollision, EngineFault::Internal("lost".into()));

        let result = ledger.end_all(&mut engine, session, &CollisionKind::ALL);
        assert!(result.is_err());
        assert!(ledger.is_empty());
        // Only the failing call was issued; the rest were dropped.
        assert_eq!(engine.count(EngineOp::EndCollision), 1);
    }

    #[test]
    fn entries_are_ordered_by_object() {
        let mut ledger = CollisionLedger::new();
        for id in [5, 1, 3] {
            ledger.soft.insert(ObjectId(id), CollisionHandle::new());
        }
        let ids: Vec<i64> = ledger
            .entries(CollisionKind::Soft)
            .iter()
            .map(|e| e.object.0)
            .collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
