//! Human-readable local times for Unix timestamps, using the UTC offset the
//! API reports alongside each reading (`timezone`, in seconds).

use core::fmt::Write as _;

use heapless::String;
use time::{Month, OffsetDateTime, UtcOffset, Weekday};

fn ordinal(n: u8) -> &'static str {
    match n {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

/// Wall-clock time at `utc_offset` seconds from UTC.
///
/// `None` if the offset is outside ±25:59:59 or the result is out of range.
pub fn local_datetime(unix: u64, utc_offset: i32) -> Option<OffsetDateTime> {
    let offset = UtcOffset::from_whole_seconds(utc_offset).ok()?;
    let shifted = i64::try_from(unix).ok()?.checked_add(i64::from(utc_offset))?;
    OffsetDateTime::from_unix_timestamp(shifted)
        .ok()
        .map(|local| local.replace_offset(offset))
}

/// "Tuesday November 14th, 2023"
pub fn format_date(unix: u64, utc_offset: i32) -> Option<String<64>> {
    let local = local_datetime(unix, utc_offset)?;
    let day = local.day();

    let mut out = String::new();
    write!(
        out,
        "{} {} {}{}, {}",
        weekday_name(local.weekday()),
        month_name(local.month()),
        day,
        ordinal(day),
        local.year()
    )
    .ok()?;
    Some(out)
}

/// "06:42", for sunrise and sunset.
pub fn format_hh_mm(unix: u64, utc_offset: i32) -> Option<String<5>> {
    let local = local_datetime(unix, utc_offset)?;
    let mut out = String::new();
    write!(out, "{:02}:{:02}", local.hour(), local.minute()).ok()?;
    Some(out)
}
