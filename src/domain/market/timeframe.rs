use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle aggregation interval.
///
/// Variants are declared from shortest to longest so that the derived `Ord`
/// sorts timeframes by duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneMin,
    ThreeMin,
    FiveMin,
    FifteenMin,
    ThirtyMin,
    OneHour,
    FourHour,
    OneDay,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::OneMin => 1,
            Timeframe::ThreeMin => 3,
            Timeframe::FiveMin => 5,
            Timeframe::FifteenMin => 15,
            Timeframe::ThirtyMin => 30,
            Timeframe::OneHour => 60,
            Timeframe::FourHour => 240,
            Timeframe::OneDay => 1440,
        }
    }

    /// Returns the duration in milliseconds
    pub fn to_millis(&self) -> i64 {
        (self.to_minutes() as i64) * 60_000
    }

    /// Exchange kline interval label ("1m", "15m", "1h", ...)
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::OneMin => "1m",
            Timeframe::ThreeMin => "3m",
            Timeframe::FiveMin => "5m",
            Timeframe::FifteenMin => "15m",
            Timeframe::ThirtyMin => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHour => "4h",
            Timeframe::OneDay => "1d",
        }
    }

    /// The canonical fusion set, fastest first.
    pub fn canonical() -> Vec<Timeframe> {
        vec![
            Timeframe::OneMin,
            Timeframe::ThreeMin,
            Timeframe::FiveMin,
            Timeframe::FifteenMin,
        ]
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1min" | "onemin" => Ok(Timeframe::OneMin),
            "3m" | "3min" | "threemin" => Ok(Timeframe::ThreeMin),
            "5m" | "5min" | "fivemin" => Ok(Timeframe::FiveMin),
            "15m" | "15min" | "fifteenmin" => Ok(Timeframe::FifteenMin),
            "30m" | "30min" | "thirtymin" => Ok(Timeframe::ThirtyMin),
            "1h" | "1hour" | "onehour" => Ok(Timeframe::OneHour),
            "4h" | "4hour" | "fourhour" => Ok(Timeframe::FourHour),
            "1d" | "1day" | "oneday" => Ok(Timeframe::OneDay),
            _ => Err(anyhow!(
                "Invalid timeframe: '{}'. Valid options: 1m, 3m, 5m, 15m, 30m, 1h, 4h, 1d",
                s
            )),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses a comma separated list such as `"1m,3m,5m"`.
pub fn parse_timeframe_list(s: &str) -> Result<Vec<Timeframe>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(Timeframe::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minutes() {
        assert_eq!(Timeframe::OneMin.to_minutes(), 1);
        assert_eq!(Timeframe::ThreeMin.to_minutes(), 3);
        assert_eq!(Timeframe::FifteenMin.to_minutes(), 15);
        assert_eq!(Timeframe::OneDay.to_minutes(), 1440);
        assert_eq!(Timeframe::FiveMin.to_millis(), 300_000);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Timeframe::from_str("1m").unwrap(), Timeframe::OneMin);
        assert_eq!(Timeframe::from_str("3m").unwrap(), Timeframe::ThreeMin);
        assert_eq!(Timeframe::from_str("15Min").unwrap(), Timeframe::FifteenMin);
        assert_eq!(Timeframe::from_str(" 1h ").unwrap(), Timeframe::OneHour);
        assert!(Timeframe::from_str("2w").is_err());
    }

    #[test]
    fn test_label_round_trips_through_from_str() {
        for tf in [Timeframe::OneMin, Timeframe::ThirtyMin, Timeframe::FourHour] {
            assert_eq!(Timeframe::from_str(tf.label()).unwrap(), tf);
            assert_eq!(tf.to_string(), tf.label());
        }
    }

    #[test]
    fn test_ordering_follows_duration() {
        let mut tfs = vec![Timeframe::FifteenMin, Timeframe::OneMin, Timeframe::FiveMin];
        tfs.sort();
        assert_eq!(
            tfs,
            vec![Timeframe::OneMin, Timeframe::FiveMin, Timeframe::FifteenMin]
        );
    }

    #[test]
    fn test_parse_list() {
        let tfs = parse_timeframe_list("1m, 3m,5m").unwrap();
        assert_eq!(tfs, vec![Timeframe::OneMin, Timeframe::ThreeMin, Timeframe::FiveMin]);
        assert!(parse_timeframe_list("1m,bogus").is_err());
    }
}
