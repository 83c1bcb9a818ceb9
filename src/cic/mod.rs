//! Carbon Intensity Cache (spec.md §4.1): polls the external emissions
//! service and persists an atomically-written snapshot CAPE and SIM read.

pub mod client;
pub mod poller;

pub use client::{EmissionsClient, PollError, ZoneReading};
pub use poller::{poll_once, run_loop};
