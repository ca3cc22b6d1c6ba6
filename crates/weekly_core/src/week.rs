use crate::error::AppError;
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

const TODAY_ENV_VAR: &str = "WEEKLY_TODAY";

/// ISO-8601 week identifier, rendered as `YYYY-W##`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekId {
    year: i32,
    week: u8,
}

impl WeekId {
    pub fn new(year: i32, week: u8) -> Result<Self, AppError> {
        let last = time::util::weeks_in_year(year);
        if !(1..=last).contains(&week) {
            return Err(AppError::invalid_input(format!(
                "week must be between 1 and {last} for {year}"
            )));
        }
        Ok(Self { year, week })
    }

    /// The week containing `date`. Weeks start on Monday and belong to the
    /// year of their Thursday.
    pub fn from_date(date: Date) -> Self {
        let since_monday = i64::from(date.weekday().number_days_from_monday());
        let thursday = date
            .saturating_sub(Duration::days(since_monday))
            .saturating_add(Duration::days(3));
        let week = (thursday.ordinal() - 1) / 7 + 1;

        Self {
            year: thursday.year(),
            week: week as u8,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u8 {
        self.week
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekId {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (year, week) = raw
            .trim()
            .split_once("-W")
            .ok_or_else(|| AppError::invalid_input("week id must look like YYYY-W##"))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| AppError::invalid_input("week id year must be numeric"))?;
        let week = week
            .parse::<u8>()
            .map_err(|_| AppError::invalid_input("week id week must be numeric"))?;
        Self::new(year, week)
    }
}

/// Source of "today" for week computations.
pub trait Clock {
    fn today(&self) -> Date;

    fn current_week(&self) -> WeekId {
        WeekId::from_date(self.today())
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn today(&self) -> Date {
        (**self).today()
    }
}

/// Local calendar date, falling back to UTC when the offset is unknown.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        OffsetDateTime::now_utc().to_offset(offset).date()
    }
}

/// A clock pinned to a date that can be moved by hand.
#[derive(Debug)]
pub struct FixedClock {
    today: Cell<Date>,
}

impl FixedClock {
    pub fn new(today: Date) -> Self {
        Self {
            today: Cell::new(today),
        }
    }

    pub fn advance_days(&self, days: i64) {
        self.today
            .set(self.today.get().saturating_add(Duration::days(days)));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.today.get()
    }
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), format)
        .map_err(|_| AppError::invalid_data(format!("{raw} is not a YYYY-MM-DD date")))
}

/// `WEEKLY_TODAY=YYYY-MM-DD` pins the date; otherwise the system clock.
pub fn clock_from_env() -> Result<Box<dyn Clock>, AppError> {
    match std::env::var(TODAY_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(Box::new(FixedClock::new(parse_date(&value)?))),
        _ => Ok(Box::new(SystemClock)),
    }
}
