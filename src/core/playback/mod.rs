// Audible and tactile alert notification.
//
// - model.rs: Signal/vibration/repeat configuration and session state
// - volume.rs: Ring-volume driven media volume policy
// - device.rs: Audio/vibration sink contract
// - controller.rs: Single-session playback state machine
// - rodio_device.rs: Desktop sink on top of rodio

pub mod controller;
pub mod device;
pub mod model;
pub mod rodio_device;
pub mod volume;
