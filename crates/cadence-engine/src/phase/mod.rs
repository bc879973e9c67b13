//! Phase queues.
//!
//! Internal double-buffered queues, one per declared phase. The public
//! scheduling surface lives in `sched`; the queues only track handles.

mod queue;

pub(crate) use queue::PhaseQueue;
