// Alert system module for classifying inbound messages.
//
// Architecture:
// - model.rs: Trigger configuration, severity and result types
// - classifier.rs: Number/phrase matching with primary-before-secondary precedence
// - engine.rs: Stamps classifications and tracks the pending primary alert

pub mod classifier;
pub mod engine;
pub mod model;
