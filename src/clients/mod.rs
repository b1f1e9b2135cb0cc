/// Data entities for songs and service payloads
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Session token storage on the local disk
pub mod local_storage;
/// Recommendation service client
pub mod recommender;
/// Spotify authorization helpers
pub mod spotify;

pub use local_storage::TokenStore;
pub use recommender::{HttpRecommender, RecommendationApi};
pub use spotify::SpotifyClient;
