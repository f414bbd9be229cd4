//! Calendar fields of a reference date

use chrono::{Datelike, NaiveDate};

/// Day of week with Monday = 0 and Sunday = 6
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// Month of year, 1-12
pub fn month(date: NaiveDate) -> u32 {
    date.month()
}

/// Day of year, 1-366
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}
