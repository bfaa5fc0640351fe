//! Price trend summary handed to the price analyst

use crate::api::PriceBar;
use crate::error::{NewsletterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use ta::{Next, indicators::SimpleMovingAverage};

pub const SHORT_WINDOW: usize = 20;
pub const LONG_WINDOW: usize = 50;
/// Percent change beyond which a move counts as a trend
pub const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Direction hint for the LLM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "UP"),
            Trend::Down => write!(f, "DOWN"),
            Trend::Sideways => write!(f, "SIDEWAYS"),
        }
    }
}

/// Statistics over a price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub first_close: f64,
    pub last_close: f64,
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub trend: Trend,
}

/// Summarize a series of bars, oldest first
///
/// Moving-average windows longer than the series shrink to its length.
pub fn summarize(symbol: &str, bars: &[PriceBar]) -> Result<PriceSummary> {
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Err(NewsletterError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "empty price history".to_string(),
        });
    };

    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let sma_short = last_sma(&closes, SHORT_WINDOW)?;
    let sma_long = last_sma(&closes, LONG_WINDOW)?;

    let change_pct = if first.close.abs() > f64::EPSILON {
        (last.close - first.close) / first.close * 100.0
    } else {
        0.0
    };
    let high = bars.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
    let low = bars.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);

    Ok(PriceSummary {
        first_close: first.close,
        last_close: last.close,
        change_pct,
        high,
        low,
        sma_short,
        sma_long,
        trend: classify(change_pct, last.close, sma_long),
    })
}

/// Up on a +5 % move closing at or above the long average, down on the mirror case
pub fn classify(change_pct: f64, last_close: f64, sma_long: f64) -> Trend {
    if change_pct >= TREND_THRESHOLD_PCT && last_close >= sma_long {
        Trend::Up
    } else if change_pct <= -TREND_THRESHOLD_PCT && last_close <= sma_long {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

fn last_sma(closes: &[f64], window: usize) -> Result<f64> {
    let mut sma = SimpleMovingAverage::new(window.min(closes.len()).max(1))
        .map_err(|e| NewsletterError::Indicator(e.to_string()))?;
    let mut value = 0.0;
    for &close in closes {
        value = sma.next(close);
    }
    Ok(value)
}

/// Evenly sample at most `max_points` bars, always keeping the most recent one
pub fn downsample(bars: &[PriceBar], max_points: usize) -> Vec<PriceBar> {
    if bars.len() <= max_points {
        return bars.to_vec();
    }
    match max_points {
        0 => Vec::new(),
        1 => bars[bars.len() - 1..].to_vec(),
        _ => {
            let last = bars.len() - 1;
            (0..max_points)
                .map(|i| bars[i * last / (max_points - 1)].clone())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                adj_close: close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn test_rising_series_is_up() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + f64::from(i)).collect();
        let summary = summarize("AAPL", &series(&closes)).unwrap();

        assert_eq!(summary.first_close, 100.0);
        assert_eq!(summary.last_close, 199.0);
        assert!((summary.change_pct - 99.0).abs() < 1e-9);
        assert_eq!(summary.high, 200.0);
        assert_eq!(summary.low, 99.0);
        // Mean of the last 20 closes: 180..=199
        assert!((summary.sma_short - 189.5).abs() < 1e-9);
        assert_eq!(summary.trend, Trend::Up);
    }

    #[test]
    fn test_falling_series_is_down() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - f64::from(i)).collect();
        let summary = summarize("AAPL", &series(&closes)).unwrap();
        assert_eq!(summary.trend, Trend::Down);
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(5.0, 110.0, 100.0), Trend::Up);
        assert_eq!(classify(4.99, 110.0, 100.0), Trend::Sideways);
        // Big gain but closing under the long average
        assert_eq!(classify(12.0, 90.0, 100.0), Trend::Sideways);
        assert_eq!(classify(-5.0, 95.0, 100.0), Trend::Down);
        assert_eq!(classify(-8.0, 105.0, 100.0), Trend::Sideways);
    }

    #[test]
    fn test_short_series_uses_its_length() {
        let summary = summarize("BTC", &series(&[10.0, 20.0, 30.0])).unwrap();
        assert!((summary.sma_short - 20.0).abs() < 1e-9);
        assert!((summary.sma_long - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series_is_unavailable() {
        let err = summarize("AAPL", &[]).unwrap_err();
        assert!(matches!(err, NewsletterError::DataUnavailable { .. }));
    }

    #[test]
    fn test_downsample_keeps_last_bar() {
        let closes: Vec<f64> = (0..250).map(f64::from).collect();
        let bars = series(&closes);

        let sampled = downsample(&bars, 60);
        assert_eq!(sampled.len(), 60);
        assert_eq!(sampled.first(), bars.first());
        assert_eq!(sampled.last(), bars.last());
        assert!(sampled.windows(2).all(|w| w[0].date < w[1].date));

        assert_eq!(downsample(&bars, 1), vec![bars[249].clone()]);
        assert_eq!(downsample(&bars[..10], 60).len(), 10);
    }
}
