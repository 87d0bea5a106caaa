//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the mock serial device.  All tests run on the host with no
//! bench attached.

mod controller_tests;
mod mock_serial;
