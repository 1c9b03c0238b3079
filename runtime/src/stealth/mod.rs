//! Anti-automation countermeasures: fingerprint patching and human pacing.

pub mod behavior;
pub mod fingerprint;
