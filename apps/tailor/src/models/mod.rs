pub mod recommendation;

pub use recommendation::{Locale, Recommendation, Track};
