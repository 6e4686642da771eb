//! The fixed price tick table.
//!
//! Valid prices run from 1.01 to 1000 in ten bands of increasing stride.
//! The full-ladder and traded-volume arrays are indexed by position in this
//! table rather than by best-N level, so every price seen on those ladders
//! must resolve to a tick index.
//!
//! The table is generated in integer hundredths to keep the band arithmetic
//! exact; lookups round the incoming price to hundredths for the same reason.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Number of valid prices in the tick table.
pub const TICK_COUNT: usize = 350;

/// Price bands in hundredths: `(first, last, stride)`, all inclusive.
const BANDS: &[(i64, i64, i64)] = &[
    (101, 199, 1),
    (200, 298, 2),
    (300, 395, 5),
    (400, 590, 10),
    (600, 980, 20),
    (1_000, 1_950, 50),
    (2_000, 2_900, 100),
    (3_000, 4_800, 200),
    (5_000, 9_500, 500),
    (10_000, 100_000, 1_000),
];

static TICKS_CENTS: Lazy<Vec<i64>> = Lazy::new(|| {
    let mut ticks = Vec::with_capacity(TICK_COUNT);
    for &(first, last, stride) in BANDS {
        let mut price = first;
        while price <= last {
            ticks.push(price);
            price += stride;
        }
    }
    debug_assert_eq!(ticks.len(), TICK_COUNT);
    ticks
});

static TICK_INDEX: Lazy<HashMap<i64, usize>> = Lazy::new(|| {
    TICKS_CENTS.iter().enumerate().map(|(i, &c)| (c, i)).collect()
});

fn cents(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// Returns the tick index for a price, or `None` if the price is not on the
/// tick table.
#[must_use]
pub fn tick_index(price: f64) -> Option<usize> {
    TICK_INDEX.get(&cents(price)).copied()
}

/// Returns the price at a tick index, or `None` if out of range.
#[must_use]
pub fn tick_price(index: usize) -> Option<f64> {
    TICKS_CENTS.get(index).map(|&c| c as f64 / 100.0)
}
