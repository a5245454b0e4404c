//! Application layer containing the refund orchestration logic.
//!
//! The `RefundController` drives a batch from `pending` to a terminal
//! aggregate status, isolating per-donation gateway failures so one bad
//! refund never aborts the rest of the batch.

pub mod controller;
