//! Clients for the external services the pipeline depends on.
//!
//! - [`reachability`] - HEAD/GET probe against arbitrary submitted URLs
//! - [`safety`] - threat-list lookup
//! - [`geo`] - IP geolocation providers (primary + fallback)

pub mod geo;
pub mod reachability;
pub mod safety;

pub use geo::{GeoProvider, IpApiComProvider, IpapiProvider};
pub use reachability::{
    HttpReachabilityProbe, ProbeErrorKind, ReachabilityProbe, ReachabilityVerdict,
    PROBE_USER_AGENT,
};
pub use safety::{SafeBrowsingProbe, SafetyProbe};

#[cfg(test)]
pub use geo::MockGeoProvider;
#[cfg(test)]
pub use reachability::MockReachabilityProbe;
#[cfg(test)]
pub use safety::MockSafetyProbe;
