//! Time-bucketed aggregates: timelines, weekday/month maps and the
//! weekday-by-hour heatmap.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{period_label, CountBucket, DateRange, UserSelection};
use crate::record_set::{RecordSet, View};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Weekday × hour-period message counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    /// Row labels, Monday first
    pub days: Vec<String>,
    /// Column labels, `"00-01"` through `"23-00"`
    pub periods: Vec<String>,
    /// `cells[day][hour]`
    pub cells: Vec<Vec<usize>>,
}

impl Heatmap {
    /// Sum of every cell
    #[must_use]
    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }
}

/// Full English name of a weekday
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month as usize).saturating_sub(1) % 12]
}

/// Messages per calendar month, labelled `"January-2024"`, oldest first
#[must_use]
pub fn monthly_timeline(view: &View<'_>) -> Vec<CountBucket> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for message in view.iter() {
        let date = message.date();
        *counts.entry((date.year(), date.month())).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((year, month), count)| CountBucket::new(format!("{}-{year}", month_name(month)), count))
        .collect()
}

/// Messages per day with activity, labelled `YYYY-MM-DD`, oldest first
#[must_use]
pub fn daily_timeline(view: &View<'_>) -> Vec<CountBucket> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for message in view.iter() {
        *counts.entry(message.date()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| CountBucket::new(date.format("%Y-%m-%d").to_string(), count))
        .collect()
}

/// Daily message counts of one user inside `range`
pub fn user_activity_over_time(records: &RecordSet, user: &str, range: &DateRange) -> Result<Vec<CountBucket>> {
    let view = records
        .select(&UserSelection::User(user.to_string()))?
        .within(range);
    Ok(daily_timeline(&view))
}

/// Messages per weekday, Monday to Sunday (empty days included)
#[must_use]
pub fn week_activity_map(view: &View<'_>) -> Vec<CountBucket> {
    let mut counts = [0usize; 7];
    for message in view.iter() {
        counts[message.weekday().num_days_from_monday() as usize] += 1;
    }
    WEEKDAYS
        .iter()
        .zip(counts)
        .map(|(day, count)| CountBucket::new(weekday_name(*day), count))
        .collect()
}

/// Messages per calendar month, January to December (empty months included)
#[must_use]
pub fn month_activity_map(view: &View<'_>) -> Vec<CountBucket> {
    let mut counts = [0usize; 12];
    for message in view.iter() {
        counts[(message.month() - 1) as usize] += 1;
    }
    MONTH_NAMES
        .iter()
        .zip(counts)
        .map(|(name, count)| CountBucket::new(*name, count))
        .collect()
}

/// Weekday × hour-period matrix of message counts
#[must_use]
pub fn activity_heatmap(view: &View<'_>) -> Heatmap {
    let mut cells = vec![vec![0usize; 24]; 7];
    for message in view.iter() {
        let day = message.weekday().num_days_from_monday() as usize;
        cells[day][message.hour() as usize] += 1;
    }
    Heatmap {
        days: WEEKDAYS.iter().map(|d| weekday_name(*d).to_string()).collect(),
        periods: (0..24).map(period_label).collect(),
        cells,
    }
}
