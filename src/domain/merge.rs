//! Market/signal merge: left-join the signal series onto the price series.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;

use super::bar::{Bar, Enrichment, PriceRow, SignalRow, format_timestamp};
use super::error::InputError;

/// Join `signals` onto `prices` by timestamp.
///
/// The price series sets the bar cadence: every price row yields exactly
/// one bar, ordered by timestamp. Signal rows with no matching price row
/// are dropped before any validation. Non-finite enrichment values are
/// treated as absent; a non-positive size is rejected only on rows that
/// carry a nonzero signal, since only those open trades.
pub fn merge_series(prices: &[PriceRow], signals: &[SignalRow]) -> Result<Vec<Bar>, InputError> {
    let mut sorted: Vec<&PriceRow> = prices.iter().collect();
    sorted.sort_by_key(|row| row.timestamp);

    if let Some(pair) = sorted.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(duplicate("price", &pair[0].timestamp));
    }

    let price_times: HashSet<NaiveDateTime> = sorted.iter().map(|row| row.timestamp).collect();
    let mut by_time: HashMap<NaiveDateTime, (i64, Enrichment)> = HashMap::with_capacity(signals.len());
    for (row, sig) in signals.iter().enumerate() {
        if !price_times.contains(&sig.timestamp) {
            continue;
        }
        let enrichment = sanitize(&sig.enrichment);
        if sig.signal != 0 {
            if let Some(value) = enrichment.size.filter(|s| *s <= 0.0) {
                return Err(InputError::InvalidSize { row, value });
            }
        }
        if by_time.insert(sig.timestamp, (sig.signal, enrichment)).is_some() {
            return Err(duplicate("signal", &sig.timestamp));
        }
    }

    let bars = sorted
        .into_iter()
        .map(|price| {
            let mut bar = Bar::from_price(price);
            if let Some(&(signal, enrichment)) = by_time.get(&price.timestamp) {
                bar.signal = signal;
                bar.enrichment = enrichment;
            }
            bar
        })
        .collect();

    Ok(bars)
}

fn duplicate(series: &str, ts: &NaiveDateTime) -> InputError {
    InputError::DuplicateTimestamp {
        series: series.to_string(),
        timestamp: format_timestamp(ts),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn sanitize(enrichment: &Enrichment) -> Enrichment {
    Enrichment {
        stop_price: finite(enrichment.stop_price),
        take_price: finite(enrichment.take_price),
        size: finite(enrichment.size),
        risk: finite(enrichment.risk),
        trailing_distance: finite(enrichment.trailing_distance),
    }
}
