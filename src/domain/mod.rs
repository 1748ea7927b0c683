// Configuration value objects
pub mod config;

// Domain-specific error types
pub mod errors;

// Candles and timeframes
pub mod market;

// Port interfaces
pub mod ports;

// Signal value objects
pub mod trading;
