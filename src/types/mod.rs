//! Type definitions for the price recommender

pub mod features;
pub mod listing;
pub mod quote;

pub use features::{FeatureSchema, FeatureValue, FeatureVector, SuppliedFeatures};
pub use listing::{ListingDetails, PropertyType, RoomType};
pub use quote::{format_usd, PriceQuote};
