pub mod request;
pub mod strategy;
pub mod track;

pub use request::{RateLimitInfo, SearchRequest};
pub use strategy::Strategy;
pub use track::TrackMetadata;
