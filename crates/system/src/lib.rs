//! External collaborators of the sampler: the reachability probe and the
//! network-identity lookup.  Both shell out to platform tools and never fail;
//! any problem collapses into a `false` probe result or the `"Unknown"`
//! network name.

pub mod network;
pub mod probe;

pub use network::{current_network_name, UNKNOWN_NETWORK};
pub use probe::{PingProbe, Probe};
