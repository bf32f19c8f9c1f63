//! Failure-path tooling: protocol probe, reachability probe and the
//! request-format troubleshooter.

mod connection;
mod network;
mod troubleshoot;

pub use connection::{ConnectionState, ConnectionTester, classify_probe};
pub use network::{NetworkTester, suggestions_for};
pub use troubleshoot::{
    PARAM_SHAPES, Troubleshooter, URL_VARIANTS, UrlRepair, UrlVariant, candidate_formats,
    first_accepted, repair_url, suggest_fixes,
};
