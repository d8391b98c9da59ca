//! Calendar source for date-dependent selections.

use chrono::{Datelike, Local, NaiveDate};

/// Supplies today's date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Current calendar month, 1-12.
    fn current_month(&self) -> u32 {
        self.today().month()
    }

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// The local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    /// Pin the clock to the first day of `year`-`month`.
    ///
    /// Returns `None` if the month is out of range.
    #[must_use]
    pub fn at(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
