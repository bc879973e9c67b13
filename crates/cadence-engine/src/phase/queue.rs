use std::collections::HashSet;

use crate::frame::{ProcessHandle, ScheduleOptions};

/// Double-buffered handle queue for a single phase.
///
/// `this_frame` is the buffer being drained and `next_frame` the one
/// accumulating registrations for the upcoming drain. Swapping at the start
/// of a pass and appending new work to the other buffer keeps mid-drain
/// registration safe without iterator-invalidation tricks; both buffers are
/// cleared-and-reused rather than reallocated.
///
/// The drain is driven stepwise (`begin_run` / `next_scheduled` /
/// `finish_run`) so the scheduler can invoke processes and apply their
/// buffered commands without holding a borrow of the queue.
#[derive(Debug, Default)]
pub(crate) struct PhaseQueue {
    this_frame: Vec<ProcessHandle>,
    next_frame: Vec<ProcessHandle>,
    recurring: HashSet<ProcessHandle>,
    cursor: usize,
    running: bool,
    flush_pending: bool,
}

impl PhaseQueue {
    /// Queues a handle. Inserting the same handle into the same buffer twice
    /// is a no-op.
    ///
    /// The live buffer is targeted only for `immediate` scheduling while a
    /// pass runs; everything else accumulates for the next drain.
    pub(crate) fn schedule(&mut self, handle: ProcessHandle, opts: ScheduleOptions) {
        if opts.recurring {
            self.recurring.insert(handle);
        }

        let queue = if self.running && opts.immediate {
            &mut self.this_frame
        } else {
            &mut self.next_frame
        };
        if !queue.contains(&handle) {
            queue.push(handle);
        }
    }

    /// Starts a drain pass: swaps the buffers and resets the cursor.
    ///
    /// Returns false when a pass is already in progress; the request is
    /// remembered and reported by `finish_run` so the caller re-runs once the
    /// active pass completes.
    pub(crate) fn begin_run(&mut self) -> bool {
        if self.running {
            self.flush_pending = true;
            return false;
        }
        self.running = true;
        std::mem::swap(&mut self.this_frame, &mut self.next_frame);
        self.cursor = 0;
        true
    }

    /// Yields the next handle of the current pass.
    ///
    /// Entries appended mid-drain via immediate scheduling extend the live
    /// buffer and are reached by the same pass.
    pub(crate) fn next_scheduled(&mut self) -> Option<ProcessHandle> {
        let handle = self.this_frame.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(handle)
    }

    /// Ends the pass: empties the drained buffer for reuse and reports
    /// whether a flush was requested while the pass ran.
    pub(crate) fn finish_run(&mut self) -> bool {
        self.this_frame.clear();
        self.cursor = 0;
        self.running = false;
        std::mem::take(&mut self.flush_pending)
    }

    pub(crate) fn is_recurring(&self, handle: ProcessHandle) -> bool {
        self.recurring.contains(&handle)
    }

    /// Whether a drain pass is in progress.
    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    /// Removes `handle` from the accumulating buffer and the recurrence set.
    ///
    /// An entry already swapped into the draining buffer still runs this
    /// tick; cancellation only affects future scheduling.
    pub(crate) fn cancel(&mut self, handle: ProcessHandle) {
        self.next_frame.retain(|queued| *queued != handle);
        self.recurring.remove(&handle);
    }

    /// Empties both buffers and the recurrence set.
    ///
    /// The running/flush flags belong to the drain pass and are reset by
    /// `finish_run`, so clearing mid-pass simply ends that pass early.
    pub(crate) fn clear(&mut self) {
        self.this_frame.clear();
        self.next_frame.clear();
        self.recurring.clear();
        self.cursor = 0;
    }

    /// True while `handle` is still due to run: queued for the next drain or
    /// not yet reached by the current pass.
    pub(crate) fn references(&self, handle: ProcessHandle) -> bool {
        self.next_frame.contains(&handle) || self.this_frame[self.cursor..].contains(&handle)
    }

    /// Outstanding work in either buffer.
    pub(crate) fn has_work(&self) -> bool {
        !self.this_frame.is_empty() || !self.next_frame.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles<const N: usize>() -> [ProcessHandle; N] {
        std::array::from_fn(|i| ProcessHandle::new(i as u64))
    }

    fn immediate() -> ScheduleOptions {
        ScheduleOptions {
            immediate: true,
            ..ScheduleOptions::default()
        }
    }

    #[test]
    fn drains_in_insertion_order() {
        let mut queue = PhaseQueue::default();
        let [a, b] = handles();

        queue.schedule(a, ScheduleOptions::default());
        queue.schedule(b, ScheduleOptions::default());

        assert!(queue.begin_run());
        assert_eq!(queue.next_scheduled(), Some(a));
        assert_eq!(queue.next_scheduled(), Some(b));
        assert_eq!(queue.next_scheduled(), None);
        assert!(!queue.finish_run());
        assert!(!queue.has_work());
    }

    #[test]
    fn duplicate_scheduling_is_idempotent() {
        let mut queue = PhaseQueue::default();
        let [a] = handles();

        queue.schedule(a, ScheduleOptions::default());
        queue.schedule(a, ScheduleOptions::default());

        assert!(queue.begin_run());
        assert_eq!(queue.next_scheduled(), Some(a));
        assert_eq!(queue.next_scheduled(), None);
    }

    #[test]
    fn default_scheduling_mid_pass_waits_for_the_next_drain() {
        let mut queue = PhaseQueue::default();
        let [a, b] = handles();

        queue.schedule(a, ScheduleOptions::default());
        assert!(queue.begin_run());
        queue.schedule(b, ScheduleOptions::default());

        assert_eq!(queue.next_scheduled(), Some(a));
        assert_eq!(queue.next_scheduled(), None);
        queue.finish_run();

        assert!(queue.begin_run());
        assert_eq!(queue.next_scheduled(), Some(b));
    }

    #[test]
    fn immediate_scheduling_extends_the_live_pass() {
        let mut queue = PhaseQueue::default();
        let [a, b] = handles();

        queue.schedule(a, ScheduleOptions::default());
        assert!(queue.begin_run());
        assert_eq!(queue.next_scheduled(), Some(a));

        queue.schedule(b, immediate());
        assert_eq!(queue.next_scheduled(), Some(b));
        assert_eq!(queue.next_scheduled(), None);
    }

    #[test]
    fn immediate_outside_a_pass_behaves_like_default() {
        let mut queue = PhaseQueue::default();
        let [a] = handles();

        queue.schedule(a, immediate());
        assert!(queue.begin_run());
        assert_eq!(queue.next_scheduled(), Some(a));
    }

    #[test]
    fn reentrant_begin_sets_the_pending_flush() {
        let mut queue = PhaseQueue::default();
        let [a] = handles();

        queue.schedule(a, ScheduleOptions::default());
        assert!(queue.begin_run());
        assert!(!queue.begin_run());

        while queue.next_scheduled().is_some() {}
        assert!(queue.finish_run());

        // The flush was consumed; the follow-up pass ends quietly.
        assert!(queue.begin_run());
        assert!(!queue.finish_run());
    }

    #[test]
    fn cancel_touches_only_the_next_frame() {
        let mut queue = PhaseQueue::default();
        let [a] = handles();

        queue.schedule(a, ScheduleOptions::default());
        assert!(queue.begin_run());

        // Re-queued for the next tick, then canceled before it runs there.
        queue.schedule(a, ScheduleOptions::default());
        queue.cancel(a);

        // The in-pass entry is not retracted.
        assert_eq!(queue.next_scheduled(), Some(a));
        queue.finish_run();
        assert!(!queue.has_work());
    }

    #[test]
    fn cancel_clears_the_recurrence_marking() {
        let mut queue = PhaseQueue::default();
        let [a] = handles();

        queue.schedule(
            a,
            ScheduleOptions {
                recurring: true,
                ..ScheduleOptions::default()
            },
        );
        assert!(queue.is_recurring(a));

        queue.cancel(a);
        assert!(!queue.is_recurring(a));
        assert!(!queue.has_work());
    }

    #[test]
    fn references_tracks_pending_entries_only() {
        let mut queue = PhaseQueue::default();
        let [a] = handles();

        queue.schedule(a, ScheduleOptions::default());
        assert!(queue.references(a));

        assert!(queue.begin_run());
        assert!(queue.references(a));
        assert_eq!(queue.next_scheduled(), Some(a));
        assert!(!queue.references(a));

        queue.schedule(a, ScheduleOptions::default());
        assert!(queue.references(a));
    }

    #[test]
    fn clear_empties_everything() {
        let mut queue = PhaseQueue::default();
        let [a, b] = handles();

        queue.schedule(
            a,
            ScheduleOptions {
                recurring: true,
                ..ScheduleOptions::default()
            },
        );
        queue.schedule(b, ScheduleOptions::default());

        queue.clear();
        assert!(!queue.has_work());
        assert!(!queue.is_recurring(a));
    }
}
