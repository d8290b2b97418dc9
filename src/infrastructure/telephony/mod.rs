//! Telephony adapters

pub mod simulated;

pub use simulated::SimulatedTelephony;
