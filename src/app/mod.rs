//! Application core: controller logic behind port traits.
//!
//! This module contains the snub controller's decision rules and its
//! delayed transition tasks.  All interaction with the bench happens
//! through **port traits** defined in [`ports`], keeping this layer
//! testable with a mock serial device.

pub mod events;
pub mod ports;
pub mod service;
pub mod tasks;
