pub mod ack;
pub mod alerts;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feed;
pub mod playback;
pub mod scheduler;
