pub mod affiliation;
pub mod identity;

pub use affiliation::{Affiliation, Municipality, Profile};
pub use identity::{EnrichedIdentity, Identity};
