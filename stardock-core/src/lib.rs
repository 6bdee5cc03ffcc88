pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod navigation;
pub mod reducer;
pub mod runtime;
pub mod state;

// Log screen scrolling and wrapping
pub mod viewport;

// Tick scheduling, one fetch in flight
pub mod refresh;
