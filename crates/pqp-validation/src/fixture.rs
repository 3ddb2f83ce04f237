//! Deterministic synthetic OHLCV fixtures shared by the smoke test,
//! shuffle test, and stability probe phases, so none of them depend on
//! live market data to evaluate a freshly generated candidate.

use pqp_strategy::Bar;
use rand::Rng;

/// A simple deterministic trending-with-noise series: a slow sine-wave
/// drift plus a small fixed ripple, seeded only by `len` so repeated calls
/// with the same length always produce the same fixture.
pub fn synthetic_bars(len: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(len);
    let mut price = 100.0_f64;
    for i in 0..len {
        let drift = (i as f64 * 0.07).sin() * 1.5;
        let ripple = ((i * 7) % 5) as f64 * 0.1 - 0.2;
        price = (price + drift * 0.2 + ripple).max(1.0);
        let open = price;
        let close = price + drift * 0.1;
        let high = open.max(close) + 0.3;
        let low = open.min(close) - 0.3;
        bars.push(Bar::new(i as i64, open, high, low, close, 1_000.0));
    }
    bars
}

/// Returns a copy of `bars` with the close (and dependent high/low) series
/// reshuffled using `rng`, preserving each bar's `end_ts` ordering so a
/// reshuffled series is still a valid chronological input, just with the
/// price path scrambled.
pub fn shuffled_closes<R: Rng>(bars: &[Bar], rng: &mut R) -> Vec<Bar> {
    let mut closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    shuffle(&mut closes, rng);

    bars.iter()
        .zip(closes)
        .map(|(b, close)| {
            let high = b.high.max(close) + 0.01;
            let low = b.low.min(close) - 0.01;
            Bar::new(b.end_ts, b.open, high, low, close, b.volume)
        })
        .collect()
}

fn shuffle<T, R: Rng>(v: &mut [T], rng: &mut R) {
    for i in (1..v.len()).rev() {
        let j = rng.gen_range(0..=i);
        v.swap(i, j);
    }
}
