//! The caller's own orders and their per-selection aggregates.
//!
//! Every `uo` entry on the stream is a complete snapshot of one order, not a
//! delta. The cache therefore maintains its aggregate counters by diffing
//! each incoming snapshot against the last one it accepted: on a valid
//! update each counter moves by `new - accepted`. An order only ever shrinks
//! its remaining size, so a snapshot whose `sr` has not strictly decreased
//! is stale (a replay or out-of-order delivery); it replaces the stored
//! record but is kept out of the aggregates.
//!
//! Because a stale snapshot can leave the stored record ahead of what the
//! aggregates reflect, the counters each order has contributed are tracked
//! separately from the stored record; removal backs out exactly those.

use std::collections::{BTreeSet, HashMap};

use oddstream_protocol::{OrderChangeMessage, SelectionId, Side};

use crate::order_book::{Order, OrderKey};

/// The counter set one order has contributed to the aggregates.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    matched: f64,
    remaining: f64,
    cancelled: f64,
    voided: f64,
}

impl Counters {
    fn of(order: &Order) -> Self {
        Self {
            matched: order.size_matched,
            remaining: order.size_remaining,
            cancelled: order.size_cancelled,
            voided: order.size_voided,
        }
    }
}

/// Order state built from a stream of `ocm` messages.
#[derive(Debug, Default)]
pub struct OrderCache {
    /// Latest snapshot per bet id, stale or not.
    orders: HashMap<String, Order>,
    /// Last accepted counters per bet id; what the aggregates actually hold.
    contributed: HashMap<String, Counters>,
    size_matched: HashMap<OrderKey, f64>,
    size_remaining: HashMap<OrderKey, f64>,
    size_cancelled: HashMap<OrderKey, f64>,
    size_voided: HashMap<OrderKey, f64>,
    /// Bet ids per key, kept sorted for stable iteration.
    selection_orders: HashMap<OrderKey, BTreeSet<String>>,
    publish_time: i64,
}

impl OrderCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bootstraps a cache from pre-stream order records (typically snapshot
    /// API records through [`Order::from_summary`]), so aggregates cover
    /// orders placed before the stream was opened.
    #[must_use]
    pub fn from_snapshot(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut cache = Self::new();
        for order in orders {
            cache.update_order(order);
        }
        cache
    }

    /// Applies one `ocm` message and returns the bet ids it touched, in
    /// message order.
    ///
    /// Messages without a publish time (heartbeats) are no-ops. A selection
    /// flagged `fullImage` has all its known orders dropped before the
    /// entry's orders are applied.
    pub fn update(&mut self, message: &OrderChangeMessage) -> Vec<&Order> {
        let Some(publish_time) = message.publish_time else {
            return Vec::new();
        };
        self.publish_time = publish_time;

        let mut touched = Vec::new();
        for market in &message.changes {
            if market.closed == Some(true) {
                tracing::debug!(market_id = %market.market_id, "order market closed");
            }
            for runner in &market.runner_changes {
                if runner.full_image {
                    self.drop_selection(&market.market_id, runner.selection_id);
                }
                for stream_order in &runner.unmatched_orders {
                    let order =
                        Order::from_stream(&market.market_id, runner.selection_id, stream_order);
                    touched.push(order.bet_id.clone());
                    self.update_order(order);
                }
            }
        }

        let orders = &self.orders;
        touched.iter().filter_map(|id| orders.get(id)).collect()
    }

    /// Applies one order snapshot, diffing against the last accepted
    /// counters for the same bet id. The stored record always tracks the
    /// latest delivery, accepted or not.
    pub fn update_order(&mut self, order: Order) {
        let key = order.key();
        let counters = Counters::of(&order);

        match self.contributed.get(&order.bet_id).copied() {
            None => {
                self.bump(&key, counters, Counters::default());
                self.contributed.insert(order.bet_id.clone(), counters);
                self.selection_orders
                    .entry(key)
                    .or_default()
                    .insert(order.bet_id.clone());
            }
            Some(accepted) if counters.remaining < accepted.remaining => {
                self.bump(&key, counters, accepted);
                self.contributed.insert(order.bet_id.clone(), counters);
            }
            Some(accepted) => {
                tracing::warn!(
                    bet_id = %order.bet_id,
                    remaining = counters.remaining,
                    accepted = accepted.remaining,
                    "stale order snapshot, aggregates unchanged"
                );
            }
        }
        self.orders.insert(order.bet_id.clone(), order);
    }

    /// Moves each aggregate by `new - old`.
    fn bump(&mut self, key: &OrderKey, new: Counters, old: Counters) {
        *self.size_matched.entry(key.clone()).or_default() += new.matched - old.matched;
        *self.size_remaining.entry(key.clone()).or_default() += new.remaining - old.remaining;
        *self.size_cancelled.entry(key.clone()).or_default() += new.cancelled - old.cancelled;
        *self.size_voided.entry(key.clone()).or_default() += new.voided - old.voided;
    }

    /// Removes every known order on a selection (both sides), backing their
    /// accepted contributions out of the aggregates.
    fn drop_selection(&mut self, market_id: &str, selection_id: SelectionId) {
        for side in [Side::Back, Side::Lay] {
            let key = OrderKey::new(market_id, selection_id, side);
            let Some(bet_ids) = self.selection_orders.remove(&key) else {
                continue;
            };
            for bet_id in bet_ids {
                self.orders.remove(&bet_id);
                if let Some(accepted) = self.contributed.remove(&bet_id) {
                    self.bump(&key, Counters::default(), accepted);
                }
            }
        }
    }

    /// Returns one order by bet id.
    #[must_use]
    pub fn order(&self, bet_id: &str) -> Option<&Order> {
        self.orders.get(bet_id)
    }

    /// Returns the tracked orders for one key, in bet id order.
    #[must_use]
    pub fn orders_for(&self, key: &OrderKey) -> Vec<&Order> {
        self.selection_orders
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|bet_id| self.orders.get(bet_id))
            .collect()
    }

    /// Returns the number of tracked orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns true if no orders are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Returns the publish time of the last applied message, epoch millis.
    #[must_use]
    pub fn publish_time(&self) -> i64 {
        self.publish_time
    }

    /// Total size matched for one key.
    #[must_use]
    pub fn size_matched(&self, key: &OrderKey) -> f64 {
        self.size_matched.get(key).copied().unwrap_or(0.0)
    }

    /// Total size remaining for one key.
    #[must_use]
    pub fn size_remaining(&self, key: &OrderKey) -> f64 {
        self.size_remaining.get(key).copied().unwrap_or(0.0)
    }

    /// Total size cancelled for one key.
    #[must_use]
    pub fn size_cancelled(&self, key: &OrderKey) -> f64 {
        self.size_cancelled.get(key).copied().unwrap_or(0.0)
    }

    /// Total size voided for one key.
    #[must_use]
    pub fn size_voided(&self, key: &OrderKey) -> f64 {
        self.size_voided.get(key).copied().unwrap_or(0.0)
    }

    /// Net exposure commitment on a selection: back matched plus back
    /// remaining, less the lay equivalents, rounded to whole units.
    #[must_use]
    pub fn trade_balance(&self, market_id: &str, selection_id: SelectionId) -> i64 {
        let back = OrderKey::new(market_id, selection_id, Side::Back);
        let lay = OrderKey::new(market_id, selection_id, Side::Lay);
        let balance = self.size_matched(&back) + self.size_remaining(&back)
            - self.size_remaining(&lay)
            - self.size_matched(&lay);
        balance.round() as i64
    }

    /// Matched size imbalance on a selection: back matched less lay matched,
    /// rounded to whole units.
    #[must_use]
    pub fn matched_balance(&self, market_id: &str, selection_id: SelectionId) -> i64 {
        let back = OrderKey::new(market_id, selection_id, Side::Back);
        let lay = OrderKey::new(market_id, selection_id, Side::Lay);
        (self.size_matched(&back) - self.size_matched(&lay)).round() as i64
    }
}
