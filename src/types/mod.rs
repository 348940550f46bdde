//! Type definitions

pub mod itinerary;
pub mod location;
pub mod messages;

pub use itinerary::*;
pub use location::*;
pub use messages::*;
