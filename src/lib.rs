//! Status page service: probes the platform, records component health and
//! serves the public status API.

mod bootstrap;

pub use bootstrap::{Vigil, build_ports};
