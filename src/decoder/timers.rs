use embassy_time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimerSlot {
    Hold,
    Release,
    Repeat,
}

/// What the hold timer expects to find when it fires. Each checkpoint re-arms
/// the hold slot for the next one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HoldCheckpoint {
    LongPress,
    ExtraLong,
    Accelerate,
    SuperLong,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReleasePurpose {
    FinalizeTaps,
    ComboExpiry,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimerPurpose {
    Hold(HoldCheckpoint),
    Release(ReleasePurpose),
    Repeat,
}

impl TimerPurpose {
    pub const fn slot(self) -> TimerSlot {
        match self {
            TimerPurpose::Hold(_) => TimerSlot::Hold,
            TimerPurpose::Release(_) => TimerSlot::Release,
            TimerPurpose::Repeat => TimerSlot::Repeat,
        }
    }
}

/// Identifies one arming of a slot. Re-arming or cancelling the slot makes
/// every earlier handle stale.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimerHandle {
    pub slot: TimerSlot,
    generation: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PendingTimer {
    pub handle: TimerHandle,
    pub purpose: TimerPurpose,
    pub deadline: Instant,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TimerBank {
    hold: Option<PendingTimer>,
    release: Option<PendingTimer>,
    repeat: Option<PendingTimer>,
    generation: u32,
}

impl TimerBank {
    pub(crate) const fn new() -> Self {
        Self {
            hold: None,
            release: None,
            repeat: None,
            generation: 0,
        }
    }

    fn slot_mut(&mut self, slot: TimerSlot) -> &mut Option<PendingTimer> {
        match slot {
            TimerSlot::Hold => &mut self.hold,
            TimerSlot::Release => &mut self.release,
            TimerSlot::Repeat => &mut self.repeat,
        }
    }

    fn slot(&self, slot: TimerSlot) -> Option<PendingTimer> {
        match slot {
            TimerSlot::Hold => self.hold,
            TimerSlot::Release => self.release,
            TimerSlot::Repeat => self.repeat,
        }
    }

    /// Arms `purpose` on its slot, replacing whatever the slot held.
    pub(crate) fn arm(&mut self, purpose: TimerPurpose, now: Instant, after: Duration) -> TimerHandle {
        self.generation = self.generation.wrapping_add(1);
        let handle = TimerHandle {
            slot: purpose.slot(),
            generation: self.generation,
        };
        *self.slot_mut(handle.slot) = Some(PendingTimer {
            handle,
            purpose,
            deadline: now + after,
        });
        handle
    }

    pub(crate) fn cancel(&mut self, slot: TimerSlot) -> bool {
        self.slot_mut(slot).take().is_some()
    }

    pub(crate) fn purpose(&self, slot: TimerSlot) -> Option<TimerPurpose> {
        self.slot(slot).map(|pending| pending.purpose)
    }

    pub(crate) fn pending(&self) -> impl Iterator<Item = PendingTimer> {
        [self.hold, self.release, self.repeat].into_iter().flatten()
    }

    /// Earliest deadline first; ties go to the timer armed first.
    pub(crate) fn next_due(&self) -> Option<PendingTimer> {
        self.pending()
            .min_by_key(|pending| (pending.deadline, pending.handle.generation))
    }

    /// Removes and returns the timer if `handle` is still the live arming of
    /// its slot.
    pub(crate) fn take(&mut self, handle: TimerHandle) -> Option<PendingTimer> {
        let slot = self.slot_mut(handle.slot);
        if matches!(*slot, Some(pending) if pending.handle == handle) {
            slot.take()
        } else {
            None
        }
    }
}
