//! Snub bench supervisory controller library.
//!
//! Exposes the controller modules for the binary, integration tests and
//! the fuzz targets.  Only `adapters::serial` touches real hardware.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channels;
pub mod config;
pub mod error;
pub mod fsm;
pub mod link;
pub mod polling;
pub mod safety;
pub mod scheduler;
pub mod sensors;
