//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements    | Connects to                   |
//! |--------------|---------------|-------------------------------|
//! | `serial`     | SerialChannel | Bench / simulator serial port |
//! | `log_sink`   | EventSink     | `log` facade                  |
//! | `env_config` | ConfigPort    | Environment + JSON file       |

pub mod env_config;
pub mod log_sink;
pub mod serial;
