// src/engine/mod.rs

//! Event processing engine for watchcmd.
//!
//! This module ties together:
//! - the interval gate ([`gate`])
//! - the ordered filter chain: subscription mask, pattern, gate, content
//!   dedup ([`filter`])
//! - the per-event processor that syncs the watch set, filters, and runs
//!   the command batch ([`processor`])
//! - the producer/consumer pipeline around it ([`pipeline`])

pub mod filter;
pub mod gate;
pub mod pipeline;
pub mod processor;

pub use filter::{Decision, FilterChain, RejectReason};
pub use gate::ExecutionGate;
pub use pipeline::{Pipeline, RawEventReceiver, RawEventSender, Reporter};
pub use processor::{DispatchReport, EventProcessor};
