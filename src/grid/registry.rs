use chrono::NaiveDate;

use super::version::{PriceGridBuilder, PriceGridVersion};
use crate::core::{BillingError, GridId};

/// Store of all price grid versions.
///
/// Holds the single "current" flag: every write that could leave two grids
/// current is rejected before anything changes.
#[derive(Debug, Clone, Default)]
pub struct PriceGridRegistry {
    grids: Vec<PriceGridVersion>,
    next_id: u64,
}

impl PriceGridRegistry {
    pub fn new() -> Self {
        Self {
            grids: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a grid version.
    ///
    /// The most recent open-ended grid starting before the new one is closed
    /// the day before the new grid starts. Only that one grid is closed.
    pub fn create(&mut self, builder: PriceGridBuilder) -> Result<GridId, BillingError> {
        if builder.is_current() {
            if let Some(current) = self.current() {
                return Err(BillingError::MultipleCurrentGrids {
                    current: current.name().to_string(),
                });
            }
        }

        let starts_on = builder.starts_on();
        let id = GridId(self.next_id.max(1));
        let grid = builder.build(id)?;

        let previous = self
            .grids
            .iter()
            .enumerate()
            .filter(|(_, g)| g.is_open() && g.valid_from() < starts_on)
            .max_by_key(|(_, g)| g.valid_from())
            .map(|(idx, _)| idx);

        if let Some(idx) = previous {
            let closes_on = starts_on.pred_opt().ok_or_else(|| {
                BillingError::Builder(format!("cannot close a grid before {starts_on}"))
            })?;
            let prev = &mut self.grids[idx];
            prev.valid_until = Some(closes_on);
            tracing::info!(grid = %prev.name(), closed_on = %closes_on, "Closed previous price grid");
        }

        self.grids.push(grid);
        self.next_id = id.0 + 1;
        Ok(id)
    }

    pub fn get(&self, id: GridId) -> Result<&PriceGridVersion, BillingError> {
        self.grids
            .iter()
            .find(|g| g.id() == id)
            .ok_or(BillingError::UnknownGrid(id))
    }

    /// The grid flagged current, if any.
    pub fn current(&self) -> Option<&PriceGridVersion> {
        self.grids.iter().find(|g| g.is_current())
    }

    /// The grid to price an invoice dated `as_of` with.
    ///
    /// Resolution goes through the current flag only; `as_of` does not take
    /// part even though grids carry validity dates. See [`Self::grid_valid_on`]
    /// for a date-range lookup.
    pub fn get_active_grid(&self, as_of: NaiveDate) -> Result<&PriceGridVersion, BillingError> {
        let grid = self.current().ok_or(BillingError::NoActiveGrid)?;
        if !grid.covers(as_of) {
            tracing::debug!(grid = %grid.name(), %as_of, "Current grid does not cover the invoice date");
        }
        Ok(grid)
    }

    /// The most recent grid whose validity range contains `date`.
    pub fn grid_valid_on(&self, date: NaiveDate) -> Option<&PriceGridVersion> {
        self.grids
            .iter()
            .filter(|g| g.covers(date))
            .max_by_key(|g| g.valid_from())
    }

    /// Plain write of the current flag.
    ///
    /// Setting the flag while another grid holds it fails with
    /// [`BillingError::MultipleCurrentGrids`] and changes nothing.
    pub fn set_current_flag(&mut self, id: GridId, is_current: bool) -> Result<(), BillingError> {
        let idx = self.index_of(id)?;
        if is_current {
            if let Some(other) = self.grids.iter().find(|g| g.is_current() && g.id() != id) {
                return Err(BillingError::MultipleCurrentGrids {
                    current: other.name().to_string(),
                });
            }
        }
        self.grids[idx].is_current = is_current;
        Ok(())
    }

    /// Make `id` the current grid, clearing the flag on any other grid.
    pub fn set_current(&mut self, id: GridId) -> Result<(), BillingError> {
        let idx = self.index_of(id)?;
        for grid in self.grids.iter_mut().filter(|g| g.is_current()) {
            grid.is_current = false;
            tracing::info!(grid = %grid.name(), "Price grid no longer current");
        }
        let grid = &mut self.grids[idx];
        grid.is_current = true;
        tracing::info!(grid = %grid.name(), "Price grid set as current");
        Ok(())
    }

    /// Copy a grid's lines into a new open-ended, non-current grid starting
    /// on `today`.
    pub fn duplicate(&mut self, id: GridId, today: NaiveDate) -> Result<GridId, BillingError> {
        let source = self.get(id)?;
        let builder = PriceGridBuilder::new(format!("Copy of {}", source.name()), today)
            .lines(source.lines().iter().cloned());
        self.create(builder)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceGridVersion> {
        self.grids.iter()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    fn index_of(&self, id: GridId) -> Result<usize, BillingError> {
        self.grids
            .iter()
            .position(|g| g.id() == id)
            .ok_or(BillingError::UnknownGrid(id))
    }
}
