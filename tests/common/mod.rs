//! Deterministic synthetic frames shared by the integration tests.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use narrata::prelude::*;

pub fn day(i: usize) -> NaiveDateTime {
    start() + Duration::days(i as i64)
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Random-walk-like bars without a random source
pub fn generate_frame(n: usize) -> Frame {
    let mut open = Vec::with_capacity(n);
    let mut high = Vec::with_capacity(n);
    let mut low = Vec::with_capacity(n);
    let mut close = Vec::with_capacity(n);
    let mut volume = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 0.98;
        let spread = 1.0 + ((i * 3) % 10) as f64 / 5.0;
        let o = price;
        let c = price + change;
        open.push(o);
        close.push(c);
        high.push(o.max(c) + spread * 0.5);
        low.push(o.min(c) - spread * 0.5);
        volume.push(1_000.0 + ((i * 37) % 500) as f64);
        price = c;
    }

    Frame::new((0..n).map(day).collect(), open, high, low, close, volume).unwrap()
}

/// Frame whose four prices all equal `close`
pub fn frame_from_close(close: &[f64]) -> Frame {
    let n = close.len();
    Frame::new(
        (0..n).map(day).collect(),
        close.to_vec(),
        close.to_vec(),
        close.to_vec(),
        close.to_vec(),
        vec![1_000.0; n],
    )
    .unwrap()
}

pub fn rising(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

/// Five bars ending in a bullish engulfing candle
pub fn engulfing_frame() -> Frame {
    Frame::new(
        (0..5).map(day).collect(),
        vec![10.0, 11.0, 12.0, 13.0, 11.0],
        vec![11.0, 12.0, 13.0, 13.5, 14.5],
        vec![9.5, 10.5, 11.5, 11.0, 11.0],
        vec![10.5, 11.5, 12.5, 11.2, 14.4],
        vec![1_000.0; 5],
    )
    .unwrap()
}
