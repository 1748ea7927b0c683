use thiserror::Error;

/// Errors raised when a candle sequence violates its invariants.
///
/// The signal core assumes validated input, so these surface only at the
/// boundary where a collaborator builds a `CandleSeries`.
#[derive(Debug, Error, PartialEq)]
pub enum CandleSeriesError {
    #[error("Invalid candle at {open_time}: {reason}")]
    InvalidCandle { open_time: i64, reason: String },

    #[error("Candles out of order: {current} does not follow {previous}")]
    OutOfOrder { previous: i64, current: i64 },
}

/// Errors related to market data retrieval
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Exchange returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid market data for {symbol}: {reason}")]
    Decode { symbol: String, reason: String },
}

/// Errors related to alert delivery
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notifier credentials not set")]
    MissingCredentials,

    #[error("Failed to deliver alert: {reason}")]
    Transport { reason: String },

    #[error("Alert rejected with HTTP {status}")]
    Rejected { status: u16 },
}
