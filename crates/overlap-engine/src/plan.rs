//! Plan-level availability service over injected collaborators.
//!
//! A plan's time slots live in an external store, display names in an external
//! directory, and user-facing failures go to a notification sink. None of these
//! are reached through globals: [`PlanService`] borrows each behind a narrow
//! trait, so the overlap computation itself stays a pure function.
//!
//! In-memory implementations of every collaborator are provided for tests and
//! for the command-line tool.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::conflict::has_time_conflict;
use crate::error::{OverlapError, Result};
use crate::ingest::{self, IngestPolicy, TimeSlotsRecord};
use crate::interval::Interval;
use crate::names::{DisplayNameLookup, NameResolver};
use crate::overlap::{self, OverlapWindow, ParticipantAvailability};

/// Threshold used when a plan overview is requested without one.
pub const DEFAULT_MIN_OVERLAP: usize = 2;

/// Identifies one plan within a party.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanKey {
    pub party_id: String,
    pub plan_id: String,
}

impl PlanKey {
    pub fn new(party_id: impl Into<String>, plan_id: impl Into<String>) -> Self {
        Self {
            party_id: party_id.into(),
            plan_id: plan_id.into(),
        }
    }
}

/// Persistence for per-participant time slots.
pub trait TimeSlotStore {
    /// Every participant's record for `plan`.
    fn plan_slots(&self, plan: &PlanKey) -> Result<Vec<TimeSlotsRecord>>;

    /// One participant's record, if they have saved any slots.
    fn participant_slots(
        &self,
        plan: &PlanKey,
        participant_id: &str,
    ) -> Result<Option<TimeSlotsRecord>>;

    /// Create or replace a participant's record.
    fn save_slots(&self, plan: &PlanKey, record: TimeSlotsRecord) -> Result<()>;

    fn delete_slots(&self, plan: &PlanKey, participant_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

pub trait NotificationSink {
    fn push(&self, notification: Notification);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
}

pub trait SessionProvider {
    /// The signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Everything a plan's calendar view needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOverview {
    pub participants: Vec<ParticipantAvailability>,
    /// Windows meeting the service's threshold.
    pub overlaps: Vec<OverlapWindow>,
    /// Windows where every participant is available.
    pub full_overlaps: Vec<OverlapWindow>,
    /// Denominator for colour grading; includes participants with no slots.
    pub total_participants: usize,
}

/// Loads, aggregates and edits one plan's availability.
pub struct PlanService<'a> {
    store: &'a dyn TimeSlotStore,
    directory: &'a dyn DisplayNameLookup,
    notifier: &'a dyn NotificationSink,
    session: &'a dyn SessionProvider,
    resolver: NameResolver,
    min_overlap_count: usize,
    policy: IngestPolicy,
}

impl<'a> PlanService<'a> {
    pub fn new(
        store: &'a dyn TimeSlotStore,
        directory: &'a dyn DisplayNameLookup,
        notifier: &'a dyn NotificationSink,
        session: &'a dyn SessionProvider,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            session,
            resolver: NameResolver::default(),
            min_overlap_count: DEFAULT_MIN_OVERLAP,
            policy: IngestPolicy::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: NameResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_min_overlap_count(mut self, min_overlap_count: usize) -> Self {
        self.min_overlap_count = min_overlap_count;
        self
    }

    pub fn with_policy(mut self, policy: IngestPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load every participant's slots for `plan` and aggregate them.
    ///
    /// # Errors
    /// Store failures, malformed slots under a strict policy and an invalid
    /// threshold are pushed to the notification sink and returned.
    pub fn overview(&self, plan: &PlanKey) -> Result<PlanOverview> {
        let records = self.report(self.store.plan_slots(plan))?;

        let ids: Vec<String> = records.iter().map(|r| r.participant_id.clone()).collect();
        let names = if ids.is_empty() {
            HashMap::new()
        } else {
            self.resolver.resolve(self.directory, &ids)
        };

        let participants = self.report(ingest::ingest(
            &records,
            &names,
            self.resolver.placeholder(),
            self.policy,
        ))?;
        let overlaps = self.report(overlap::compute_overlaps(
            &participants,
            self.min_overlap_count,
        ))?;
        let full_overlaps = overlap::full_overlap_windows(&participants);

        tracing::debug!(
            party = %plan.party_id,
            plan = %plan.plan_id,
            participants = participants.len(),
            overlaps = overlaps.len(),
            "plan overview computed"
        );

        Ok(PlanOverview {
            total_participants: participants.len(),
            participants,
            overlaps,
            full_overlaps,
        })
    }

    /// Whether the signed-in user may edit `participant_id`'s slots.
    pub fn can_edit(&self, participant_id: &str) -> bool {
        self.session
            .current_user()
            .is_some_and(|user| user.id == participant_id)
    }

    /// Add a slot to `participant_id`'s availability.
    ///
    /// # Errors
    /// `NotSignedIn`, `PermissionDenied` unless `participant_id` is the signed-in
    /// user, `TimeConflict` if it overlaps one of their slots, or a store error.
    /// Every error is also pushed as a notification.
    pub fn add_slot(
        &self,
        plan: &PlanKey,
        participant_id: &str,
        interval: Interval,
    ) -> Result<Vec<Interval>> {
        self.report(self.edit_own(plan, participant_id, |slots| {
            ensure_free(slots, interval, None)?;
            slots.push(interval);
            Ok(())
        }))
    }

    /// Move or resize the slot at `index`.
    ///
    /// # Errors
    /// As [`add_slot`](Self::add_slot), plus `SlotIndexOutOfRange`.
    pub fn move_slot(
        &self,
        plan: &PlanKey,
        participant_id: &str,
        index: usize,
        interval: Interval,
    ) -> Result<Vec<Interval>> {
        self.report(self.edit_own(plan, participant_id, |slots| {
            check_index(slots, index)?;
            ensure_free(slots, interval, Some(index))?;
            slots[index] = interval;
            Ok(())
        }))
    }

    /// Remove the slot at `index`.
    ///
    /// # Errors
    /// `NotSignedIn`, `PermissionDenied`, `SlotIndexOutOfRange` or a store error.
    pub fn remove_slot(
        &self,
        plan: &PlanKey,
        participant_id: &str,
        index: usize,
    ) -> Result<Vec<Interval>> {
        self.report(self.edit_own(plan, participant_id, |slots| {
            check_index(slots, index)?;
            slots.remove(index);
            Ok(())
        }))
    }

    /// Apply `edit` to the signed-in user's slots and persist the result.
    ///
    /// Malformed stored slots are always dropped here, whatever the overview
    /// policy, so a bad record can still be repaired; indices passed to `edit`
    /// refer to the remaining slots. An edit that leaves no slots deletes the
    /// record.
    fn edit_own<F>(&self, plan: &PlanKey, participant_id: &str, edit: F) -> Result<Vec<Interval>>
    where
        F: FnOnce(&mut Vec<Interval>) -> Result<()>,
    {
        let user = self.session.current_user().ok_or(OverlapError::NotSignedIn)?;
        if user.id != participant_id {
            return Err(OverlapError::PermissionDenied {
                participant_id: participant_id.to_string(),
            });
        }

        let (mut slots, dropped) = match self.store.participant_slots(plan, &user.id)? {
            Some(record) => {
                let slots = ingest::record_intervals(&record, IngestPolicy::SkipInvalid)?;
                let dropped = record.slots.len() - slots.len();
                (slots, dropped)
            }
            None => (Vec::new(), 0),
        };

        edit(&mut slots)?;

        if slots.is_empty() {
            self.store.delete_slots(plan, &user.id)?;
        } else {
            self.store.save_slots(
                plan,
                TimeSlotsRecord {
                    participant_id: user.id.clone(),
                    slots: ingest::to_slot_records(&slots),
                },
            )?;
        }

        if dropped > 0 {
            self.notifier.push(Notification::info(format!(
                "Removed {} invalid time slot(s) from {}'s availability",
                dropped, user.display_name
            )));
        }
        tracing::debug!(participant = %user.id, slots = slots.len(), "time slots saved");
        Ok(slots)
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::warn!(error = %err, "plan operation failed");
            self.notifier.push(Notification::error(err.to_string()));
        }
        result
    }
}

fn check_index(slots: &[Interval], index: usize) -> Result<()> {
    if index >= slots.len() {
        return Err(OverlapError::SlotIndexOutOfRange {
            index,
            len: slots.len(),
        });
    }
    Ok(())
}

fn ensure_free(slots: &[Interval], candidate: Interval, exclude: Option<usize>) -> Result<()> {
    if has_time_conflict(candidate.start(), candidate.end(), slots, exclude) {
        return Err(OverlapError::TimeConflict {
            start: candidate.start(),
            end: candidate.end(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

/// A [`TimeSlotStore`] backed by a map, one entry per plan and participant.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<PlanKey, BTreeMap<String, TimeSlotsRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a plan with `records`, replacing any with the same participant id.
    pub fn with_records(
        self,
        plan: &PlanKey,
        records: impl IntoIterator<Item = TimeSlotsRecord>,
    ) -> Result<Self> {
        for record in records {
            self.save_slots(plan, record)?;
        }
        Ok(self)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<PlanKey, BTreeMap<String, TimeSlotsRecord>>>>
    {
        self.records
            .lock()
            .map_err(|_| OverlapError::Store("time-slot store lock poisoned".to_string()))
    }
}

impl TimeSlotStore for MemoryStore {
    fn plan_slots(&self, plan: &PlanKey) -> Result<Vec<TimeSlotsRecord>> {
        Ok(self
            .lock()?
            .get(plan)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    fn participant_slots(
        &self,
        plan: &PlanKey,
        participant_id: &str,
    ) -> Result<Option<TimeSlotsRecord>> {
        Ok(self
            .lock()?
            .get(plan)
            .and_then(|records| records.get(participant_id).cloned()))
    }

    fn save_slots(&self, plan: &PlanKey, record: TimeSlotsRecord) -> Result<()> {
        self.lock()?
            .entry(plan.clone())
            .or_default()
            .insert(record.participant_id.clone(), record);
        Ok(())
    }

    fn delete_slots(&self, plan: &PlanKey, participant_id: &str) -> Result<()> {
        if let Some(records) = self.lock()?.get_mut(plan) {
            records.remove(participant_id);
        }
        Ok(())
    }
}

/// A [`NotificationSink`] that keeps every notification in order.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    pushed: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.pushed
            .lock()
            .map(|pushed| pushed.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for MemoryNotifier {
    fn push(&self, notification: Notification) {
        if let Ok(mut pushed) = self.pushed.lock() {
            pushed.push(notification);
        }
    }
}

/// A [`SessionProvider`] with a fixed user, or none.
#[derive(Debug, Clone, Default)]
pub struct FixedSession {
    user: Option<CurrentUser>,
}

impl FixedSession {
    pub fn signed_in(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user: Some(CurrentUser {
                id: id.into(),
                display_name: display_name.into(),
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl SessionProvider for FixedSession {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}
