//! Per-market ladder state.
//!
//! A [`MarketBook`] holds every price ladder the feed publishes for one
//! market in dense arrays: one row per runner, one plane per side, and a
//! fixed depth per ladder kind. The best-N ladders are level-indexed (depth
//! 10); the full and traded ladders are indexed by position in the tick
//! table (depth 350). Zeroed slots mean "nothing there".
//!
//! Rows are assigned from `sortPriority` in the market definition. When a
//! new definition reorders or removes runners, every grid is rebuilt by
//! copying each surviving runner's old row into its new one, so ladder data
//! follows the selection id rather than the row number.

use std::collections::HashMap;

use oddstream_protocol::ticks;
use oddstream_protocol::{
    LevelDelta, MarketChange, MarketDefinition, MarketId, PriceDelta, RunnerChange, SelectionId,
    Side,
};

use crate::error::CacheError;

/// Depth of the best-N ladders.
pub const BEST_DEPTH: usize = 10;

/// A dense grid of `(price, size)` slots: rows by sides by depth.
///
/// Backed by one flat allocation so an image reset or a runner permutation
/// is a straight memcpy per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderGrid {
    rows: usize,
    sides: usize,
    depth: usize,
    data: Vec<f64>,
}

impl LadderGrid {
    /// Creates a zeroed grid.
    #[must_use]
    pub fn new(rows: usize, sides: usize, depth: usize) -> Self {
        Self {
            rows,
            sides,
            depth,
            data: vec![0.0; rows * sides * depth * 2],
        }
    }

    /// Returns the number of rows (runners).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the ladder depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn offset(&self, row: usize, side: usize, level: usize) -> usize {
        debug_assert!(row < self.rows && side < self.sides && level < self.depth);
        ((row * self.sides + side) * self.depth + level) * 2
    }

    /// Returns the `(price, size)` slot.
    #[must_use]
    pub fn get(&self, row: usize, side: usize, level: usize) -> (f64, f64) {
        let i = self.offset(row, side, level);
        (self.data[i], self.data[i + 1])
    }

    /// Writes a `(price, size)` slot.
    pub fn set(&mut self, row: usize, side: usize, level: usize, price: f64, size: f64) {
        let i = self.offset(row, side, level);
        self.data[i] = price;
        self.data[i + 1] = size;
    }

    /// Zeroes a slot.
    pub fn clear(&mut self, row: usize, side: usize, level: usize) {
        self.set(row, side, level, 0.0, 0.0);
    }

    /// Iterates the occupied slots of one row/side as `(level, price, size)`.
    pub fn occupied(
        &self,
        row: usize,
        side: usize,
    ) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        (0..self.depth).filter_map(move |level| {
            let (price, size) = self.get(row, side, level);
            (price != 0.0 || size != 0.0).then_some((level, price, size))
        })
    }

    /// Builds a new grid where row `i` is a copy of row `mapping[i]` of this
    /// grid, or zeroes when `mapping[i]` is `None`.
    #[must_use]
    pub fn gather_rows(&self, mapping: &[Option<usize>]) -> Self {
        let mut out = Self::new(mapping.len(), self.sides, self.depth);
        let row_len = self.sides * self.depth * 2;
        for (new_row, old_row) in mapping.iter().enumerate() {
            if let Some(old_row) = old_row {
                let src = old_row * row_len;
                let dst = new_row * row_len;
                out.data[dst..dst + row_len].copy_from_slice(&self.data[src..src + row_len]);
            }
        }
        out
    }
}

/// Last traded price and total volume for one runner. Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RunnerScalars {
    last_traded_price: f64,
    total_volume: f64,
}

/// Full ladder state for one market.
#[derive(Debug, Clone)]
pub struct MarketBook {
    market_id: MarketId,
    publish_time: i64,
    total_matched: f64,
    definition: MarketDefinition,
    /// Selection id to grid row, derived from `sortPriority`.
    positions: HashMap<SelectionId, usize>,
    best_display: LadderGrid,
    best_offers: LadderGrid,
    full_ladder: LadderGrid,
    traded: LadderGrid,
    scalars: Vec<RunnerScalars>,
}

fn ordered_positions(definition: &MarketDefinition) -> HashMap<SelectionId, usize> {
    let mut runners: Vec<_> = definition
        .runners
        .iter()
        .map(|r| (r.sort_priority, r.selection_id))
        .collect();
    runners.sort_unstable();
    runners
        .into_iter()
        .enumerate()
        .map(|(row, (_, selection_id))| (selection_id, row))
        .collect()
}

impl MarketBook {
    fn with_definition(market_id: MarketId, definition: MarketDefinition, publish_time: i64) -> Self {
        let positions = ordered_positions(&definition);
        let rows = positions.len();
        Self {
            market_id,
            publish_time,
            total_matched: 0.0,
            definition,
            positions,
            best_display: LadderGrid::new(rows, 2, BEST_DEPTH),
            best_offers: LadderGrid::new(rows, 2, BEST_DEPTH),
            full_ladder: LadderGrid::new(rows, 2, ticks::TICK_COUNT),
            traded: LadderGrid::new(rows, 1, ticks::TICK_COUNT),
            scalars: vec![RunnerScalars::default(); rows],
        }
    }

    /// Builds a book from a full-image market change.
    ///
    /// # Errors
    /// Returns `CacheError::MissingDefinition` when the image carries no
    /// market definition, or any error from applying its runner changes.
    pub fn from_image(change: &MarketChange, publish_time: i64) -> Result<Self, CacheError> {
        let definition = change
            .market_definition
            .clone()
            .ok_or_else(|| CacheError::MissingDefinition(change.market_id.clone()))?;

        let mut book = Self::with_definition(change.market_id.clone(), definition, publish_time);
        book.total_matched = change.total_matched.unwrap_or(0.0);
        for rc in &change.runner_changes {
            book.apply_runner(rc)?;
        }
        Ok(book)
    }

    /// Applies one change entry to the book.
    ///
    /// An image resets all ladder state before applying the entry's runner
    /// changes. A delta merges: a new definition permutes the grids to the
    /// new runner order first, then the ladder deltas are scattered in.
    ///
    /// # Errors
    /// Returns `CacheError` for unknown selections, off-tick prices and
    /// out-of-range levels.
    pub fn apply(&mut self, change: &MarketChange, publish_time: i64) -> Result<(), CacheError> {
        if change.image {
            let definition = change
                .market_definition
                .clone()
                .unwrap_or_else(|| self.definition.clone());
            *self = Self::with_definition(self.market_id.clone(), definition, publish_time);
        } else if let Some(definition) = &change.market_definition {
            self.adopt_definition(definition.clone());
        }

        if let Some(total) = change.total_matched {
            self.total_matched = total;
        }
        for rc in &change.runner_changes {
            self.apply_runner(rc)?;
        }
        self.publish_time = publish_time;
        Ok(())
    }

    /// Replaces the definition, permuting every grid so each surviving
    /// selection keeps its ladder data in its new row.
    fn adopt_definition(&mut self, definition: MarketDefinition) {
        let new_positions = ordered_positions(&definition);

        if new_positions != self.positions {
            let mut mapping = vec![None; new_positions.len()];
            for (selection_id, &row) in &new_positions {
                mapping[row] = self.positions.get(selection_id).copied();
            }

            self.best_display = self.best_display.gather_rows(&mapping);
            self.best_offers = self.best_offers.gather_rows(&mapping);
            self.full_ladder = self.full_ladder.gather_rows(&mapping);
            self.traded = self.traded.gather_rows(&mapping);
            self.scalars = mapping
                .iter()
                .map(|old| old.map(|row| self.scalars[row]).unwrap_or_default())
                .collect();
            self.positions = new_positions;

            tracing::debug!(market_id = %self.market_id, "runner order changed, grids permuted");
        }

        self.definition = definition;
    }

    fn apply_runner(&mut self, rc: &RunnerChange) -> Result<(), CacheError> {
        let row = *self
            .positions
            .get(&rc.selection_id)
            .ok_or(CacheError::UnknownSelection {
                market_id: self.market_id.clone(),
                selection_id: rc.selection_id,
            })?;

        for delta in &rc.best_display_back {
            scatter_level(&mut self.best_display, row, 0, delta)?;
        }
        for delta in &rc.best_display_lay {
            scatter_level(&mut self.best_display, row, 1, delta)?;
        }
        for delta in &rc.best_back {
            scatter_level(&mut self.best_offers, row, 0, delta)?;
        }
        for delta in &rc.best_lay {
            scatter_level(&mut self.best_offers, row, 1, delta)?;
        }

        for delta in &rc.available_to_back {
            scatter_price(&mut self.full_ladder, row, 0, delta, true)?;
        }
        for delta in &rc.available_to_lay {
            scatter_price(&mut self.full_ladder, row, 1, delta, true)?;
        }
        // Traded-volume entries are stored verbatim: a `[price, 0]` means
        // "nothing has traded at this price yet", which is a fact worth
        // keeping, not a slot removal like it is on the availability ladders.
        for delta in &rc.traded {
            scatter_price(&mut self.traded, row, 0, delta, false)?;
        }

        if let Some(ltp) = rc.last_traded_price {
            self.scalars[row].last_traded_price = ltp;
        }
        if let Some(volume) = rc.total_volume {
            self.scalars[row].total_volume = volume;
        }
        Ok(())
    }

    /// Returns the market id.
    #[must_use]
    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    /// Returns the publish time of the last applied change, epoch millis.
    #[must_use]
    pub fn publish_time(&self) -> i64 {
        self.publish_time
    }

    /// Returns the total amount matched on the market.
    #[must_use]
    pub fn total_matched(&self) -> f64 {
        self.total_matched
    }

    /// Returns the current market definition.
    #[must_use]
    pub fn definition(&self) -> &MarketDefinition {
        &self.definition
    }

    /// Returns the number of runners.
    #[must_use]
    pub fn runner_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the grid row of a selection, if present.
    #[must_use]
    pub fn row_of(&self, selection_id: SelectionId) -> Option<usize> {
        self.positions.get(&selection_id).copied()
    }

    /// Returns `(price, size)` at a display-ladder level, zeros when empty.
    #[must_use]
    pub fn best_display(
        &self,
        selection_id: SelectionId,
        side: Side,
        level: usize,
    ) -> Option<(f64, f64)> {
        let row = self.row_of(selection_id)?;
        (level < BEST_DEPTH).then(|| self.best_display.get(row, side.index(), level))
    }

    /// Returns `(price, size)` at a raw best-offer level, zeros when empty.
    #[must_use]
    pub fn best_offer(
        &self,
        selection_id: SelectionId,
        side: Side,
        level: usize,
    ) -> Option<(f64, f64)> {
        let row = self.row_of(selection_id)?;
        (level < BEST_DEPTH).then(|| self.best_offers.get(row, side.index(), level))
    }

    /// Returns the available size at an exact price on the full ladder.
    #[must_use]
    pub fn available(&self, selection_id: SelectionId, side: Side, price: f64) -> Option<f64> {
        let row = self.row_of(selection_id)?;
        let index = ticks::tick_index(price)?;
        Some(self.full_ladder.get(row, side.index(), index).1)
    }

    /// Returns the traded volume at an exact price.
    #[must_use]
    pub fn traded_volume(&self, selection_id: SelectionId, price: f64) -> Option<f64> {
        let row = self.row_of(selection_id)?;
        let index = ticks::tick_index(price)?;
        Some(self.traded.get(row, 0, index).1)
    }

    /// Returns the last traded price, if the runner has traded.
    #[must_use]
    pub fn last_traded_price(&self, selection_id: SelectionId) -> Option<f64> {
        let row = self.row_of(selection_id)?;
        let ltp = self.scalars[row].last_traded_price;
        (ltp > 0.0).then_some(ltp)
    }

    /// Returns the total volume matched on the runner.
    #[must_use]
    pub fn runner_volume(&self, selection_id: SelectionId) -> Option<f64> {
        let row = self.row_of(selection_id)?;
        Some(self.scalars[row].total_volume)
    }

    /// Re-emits the current state as a full-image change entry, suitable for
    /// bringing a late consumer up to date.
    #[must_use]
    pub fn to_market_change(&self) -> MarketChange {
        let mut rows: Vec<_> = self.positions.iter().map(|(&sel, &row)| (row, sel)).collect();
        rows.sort_unstable();

        let runner_changes = rows
            .into_iter()
            .map(|(row, selection_id)| {
                let scalars = self.scalars[row];
                RunnerChange {
                    selection_id,
                    last_traded_price: (scalars.last_traded_price > 0.0)
                        .then_some(scalars.last_traded_price),
                    total_volume: (scalars.total_volume > 0.0).then_some(scalars.total_volume),
                    best_display_back: gather_levels(&self.best_display, row, 0),
                    best_display_lay: gather_levels(&self.best_display, row, 1),
                    best_back: gather_levels(&self.best_offers, row, 0),
                    best_lay: gather_levels(&self.best_offers, row, 1),
                    available_to_back: gather_prices(&self.full_ladder, row, 0),
                    available_to_lay: gather_prices(&self.full_ladder, row, 1),
                    traded: gather_prices(&self.traded, row, 0),
                    ..Default::default()
                }
            })
            .collect();

        MarketChange {
            market_id: self.market_id.clone(),
            image: true,
            total_matched: (self.total_matched > 0.0).then_some(self.total_matched),
            con: None,
            market_definition: Some(self.definition.clone()),
            runner_changes,
        }
    }
}

fn scatter_level(
    grid: &mut LadderGrid,
    row: usize,
    side: usize,
    delta: &LevelDelta,
) -> Result<(), CacheError> {
    let [level, price, size] = *delta;
    // `as usize` would saturate a negative level to 0 and silently clobber
    // the top of the ladder, so validate before casting.
    if level < 0.0 || level.fract() != 0.0 || level as usize >= grid.depth() {
        return Err(CacheError::LevelOutOfRange {
            level,
            depth: grid.depth(),
        });
    }
    grid.set(row, side, level as usize, price, size);
    Ok(())
}

fn scatter_price(
    grid: &mut LadderGrid,
    row: usize,
    side: usize,
    delta: &PriceDelta,
    clear_zero: bool,
) -> Result<(), CacheError> {
    let [price, size] = *delta;
    let index = ticks::tick_index(price).ok_or(CacheError::UnknownTick(price))?;
    if clear_zero && size == 0.0 {
        grid.clear(row, side, index);
    } else {
        grid.set(row, side, index, price, size);
    }
    Ok(())
}

fn gather_levels(grid: &LadderGrid, row: usize, side: usize) -> Vec<LevelDelta> {
    grid.occupied(row, side)
        .map(|(level, price, size)| [level as f64, price, size])
        .collect()
}

fn gather_prices(grid: &LadderGrid, row: usize, side: usize) -> Vec<PriceDelta> {
    grid.occupied(row, side)
        .map(|(_, price, size)| [price, size])
        .collect()
}
