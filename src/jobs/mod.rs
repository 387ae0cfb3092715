//! Content-generation jobs: submission, status polling and results.
//!
//! Polling is caller-driven. [`Poller::poll_until_terminal`] repeats status
//! checks at a fixed interval and stops on a terminal status, on
//! cancellation, or when too many checks in a row fail transiently.

pub mod cancel;
pub mod engine;
pub mod poll;

pub use cancel::CancellationToken;
pub use engine::{ContentJobs, JobReport};
pub use poll::{JobStatusSource, PollError, PollOutcome, Poller, SequenceGate};
