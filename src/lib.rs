//! Moodboard - song recommendations from a mood or a picture
//!
//! This library keeps the state of a moodboard (the recommended songs and the
//! user's feedback on them), talks to the remote recommendation service and
//! saves the result as a Spotify playlist.

/// The moodboard view state and its actions
pub mod board;
/// Client modules for interacting with external services and local storage
pub mod clients;
/// Configuration from environment variables
pub mod config;
/// Mood input validation and encoding
pub mod mood;
/// Playlist creation and Spotify authorization
pub mod playlist;
/// Local HTTP API over a moodboard
pub mod view_api;

pub use board::Moodboard;
pub use playlist::PlaylistFlow;
