mod base {
    pub(super) const K_LEAP_YEAR_INTERVAL: u16 = 4;
    pub(super) const K_YEARS_PER_CENTURY: u16 = 100;
    pub(super) const K_DAYS_PER_STANDARD_YEAR: u32 = 365;
    pub(super) const K_SECONDS_PER_MINUTE: u32 = 60;
    pub(super) const K_MINUTES_PER_HOUR: u32 = 60;
    pub(super) const K_HOURS_PER_DAY: u32 = 24;
    pub(super) const K_SECONDS_PER_HOUR: u32 = K_SECONDS_PER_MINUTE * K_MINUTES_PER_HOUR;
    pub(super) const K_SECONDS_PER_DAY: u32 = K_SECONDS_PER_HOUR * K_HOURS_PER_DAY;
}

mod chip_epoch {
    pub(super) const K_BASE_YEAR: u16 = 2000;
    pub(super) const K_MAX_YEAR: u16 = 2135;
    pub(super) const K_DAYS_SINCE_UNIX_EPOCH: u32 = 10957;
    pub(super) const K_SECONDS_SINCE_UNIX_EPOCH: u64 =
        K_DAYS_SINCE_UNIX_EPOCH as u64 * super::base::K_SECONDS_PER_DAY as u64;
}

mod internal {
    // Number of years in a Gregorian "cycle", where a cycle is the 400-year
    // period over which the Gregorian calendar repeats.
    pub(super) const K_YEARS_PER_CYCLE: u32 = 400;
    // Total number of days within a cycle.
    pub(super) const K_DAYS_PER_CYCLE: u32 = 146097;
    // Total number of days between 0000/03/01 and 1970/01/01.
    pub(super) const K_EPOCH_OFFSET_DAYS: u32 = 719468;
}

pub const K_CHIP_EPOCH_BASE_YEAR: u16 = chip_epoch::K_BASE_YEAR;
pub const K_CHIP_EPOCH_MAX_YEAR: u16 = chip_epoch::K_MAX_YEAR;
pub const K_CHIP_EPOCH_SECONDS_SINCE_UNIX_EPOCH: u64 = chip_epoch::K_SECONDS_SINCE_UNIX_EPOCH;

/* Converts a March-based month number (0=March, 1=April, etc.) to a March-1st
 * based day of year (0=March 1st, 1=March 2nd, etc.).
 *
 * NOTE: The calendar math here is based on the algorithms described in
 * http://howardhinnant.github.io/date_algorithms.html.
 */
fn march_based_month_to_day_of_year(month: u32) -> u32 {
    (153 * month + 2) / 5
}

fn march_based_day_of_year_to_month(day_of_year: u32) -> u32 {
    (5 * day_of_year + 2) / 153
}

/* Convert the number of days since 1970-01-01 to a calendar date.
 * Fails if the year would not fit in a u16.
 */
pub fn days_since_unix_epoch_to_calendar_date(mut days_since_epoch: u32) -> Result<(u16, u8, u8), ()> {
    if days_since_epoch / base::K_DAYS_PER_STANDARD_YEAR + 1 > u16::MAX as u32 {
        return Err(());
    }

    // Adjust days value to be relative to 0000-03-01.
    days_since_epoch += internal::K_EPOCH_OFFSET_DAYS;

    // Compute the 400-year Gregorian cycle in which the given day resides.
    let cycle: u32 = days_since_epoch / internal::K_DAYS_PER_CYCLE;

    // Compute the relative day within the cycle.
    let day_of_cycle: u32 = days_since_epoch - cycle * internal::K_DAYS_PER_CYCLE;

    // Compute the relative year within the cycle, adjusting for leap-years.
    let year_of_cycle: u32 = (day_of_cycle - day_of_cycle / 1460 + day_of_cycle / 36524
        - day_of_cycle / 146096)
        / base::K_DAYS_PER_STANDARD_YEAR;

    // Compute the relative day within the year.
    let day_of_year: u32 = day_of_cycle
        - (year_of_cycle * base::K_DAYS_PER_STANDARD_YEAR
            + year_of_cycle / base::K_LEAP_YEAR_INTERVAL as u32
            - year_of_cycle / base::K_YEARS_PER_CENTURY as u32);

    // Compute a March-based month number (0=March ... 11=February) from the day of year.
    let month = march_based_day_of_year_to_month(day_of_year);

    // Compute the day of month in standard form (1=1st, 2=2nd, etc.).
    let day_of_month = day_of_year - march_based_month_to_day_of_year(month) + 1;

    // Convert the month number to standard form (1=January ... 12=December).
    let month = if month < 10 { month + 3 } else { month - 9 };

    // Compute the year, adjusting for the standard start of year (January).
    let mut year = year_of_cycle + cycle * internal::K_YEARS_PER_CYCLE;
    if month <= 2 {
        year += 1;
    }

    Ok((year as u16, month as u8, day_of_month as u8))
}

/* Convert a calendar date to the number of days since 1970-01-01.
 * Fails for dates before the Unix epoch.
 */
pub fn calendar_date_to_days_since_unix_epoch(year: u16, month: u8, day: u8) -> Result<u32, ()> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(());
    }

    let adjusted_year: u32 = if month <= 2 {
        year as u32 - 1
    } else {
        year as u32
    };

    let cycle = adjusted_year / internal::K_YEARS_PER_CYCLE;
    let year_of_cycle = adjusted_year - cycle * internal::K_YEARS_PER_CYCLE;

    // March-based month number.
    let march_month: u32 = if month > 2 {
        month as u32 - 3
    } else {
        month as u32 + 9
    };

    let day_of_year = march_based_month_to_day_of_year(march_month) + day as u32 - 1;
    let day_of_cycle = year_of_cycle * base::K_DAYS_PER_STANDARD_YEAR
        + year_of_cycle / base::K_LEAP_YEAR_INTERVAL as u32
        - year_of_cycle / base::K_YEARS_PER_CENTURY as u32
        + day_of_year;

    let days_since_civil_base = cycle * internal::K_DAYS_PER_CYCLE + day_of_cycle;
    if days_since_civil_base < internal::K_EPOCH_OFFSET_DAYS {
        return Err(());
    }

    Ok(days_since_civil_base - internal::K_EPOCH_OFFSET_DAYS)
}

/* Convert the number of seconds since 1970-01-01 00:00:00 UTC to a calendar
 * date and time.
 */
pub fn seconds_since_unix_epoch_to_calendar_time(
    seconds_since_epoch: u64,
) -> Result<(u16, u8, u8, u8, u8, u8), ()> {
    let days = (seconds_since_epoch / base::K_SECONDS_PER_DAY as u64) as u32;
    let time_of_day = (seconds_since_epoch % base::K_SECONDS_PER_DAY as u64) as u32;

    let (year, month, day) = days_since_unix_epoch_to_calendar_date(days)?;
    let hour = time_of_day / base::K_SECONDS_PER_HOUR;
    let minute = (time_of_day % base::K_SECONDS_PER_HOUR) / base::K_SECONDS_PER_MINUTE;
    let second = time_of_day % base::K_SECONDS_PER_MINUTE;

    Ok((year, month, day, hour as u8, minute as u8, second as u8))
}

pub fn calendar_time_to_seconds_since_unix_epoch(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Result<u64, ()> {
    if hour > 23 || minute > 59 || second > 59 {
        return Err(());
    }

    let days = calendar_date_to_days_since_unix_epoch(year, month, day)? as u64;
    Ok(days * base::K_SECONDS_PER_DAY as u64
        + hour as u64 * base::K_SECONDS_PER_HOUR as u64
        + minute as u64 * base::K_SECONDS_PER_MINUTE as u64
        + second as u64)
}

pub fn chip_epoch_to_calendar_time(chip_epoch_time: u32) -> (u16, u8, u8, u8, u8, u8) {
    // The largest possible input maps to a year no later than 2136, so the
    // inner conversion cannot fail.
    seconds_since_unix_epoch_to_calendar_time(
        chip_epoch_time as u64 + chip_epoch::K_SECONDS_SINCE_UNIX_EPOCH,
    )
    .unwrap_or((chip_epoch::K_BASE_YEAR, 1, 1, 0, 0, 0))
}

pub fn calendar_time_to_chip_epoch(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Result<u32, ()> {
    if !(chip_epoch::K_BASE_YEAR..=chip_epoch::K_MAX_YEAR).contains(&year) {
        return Err(());
    }

    let unix_secs = calendar_time_to_seconds_since_unix_epoch(year, month, day, hour, minute, second)?;
    Ok((unix_secs - chip_epoch::K_SECONDS_SINCE_UNIX_EPOCH) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chip_epoch_base_is_day_10957() {
        assert_eq!(Ok(10957), calendar_date_to_days_since_unix_epoch(2000, 1, 1));
        assert_eq!(Ok((2000, 1, 1)), days_since_unix_epoch_to_calendar_date(10957));
    }

    #[test]
    fn chip_epoch_zero() {
        assert_eq!((2000, 1, 1, 0, 0, 0), chip_epoch_to_calendar_time(0));
        assert_eq!(Ok(0), calendar_time_to_chip_epoch(2000, 1, 1, 0, 0, 0));
    }

    #[test]
    fn known_conversion_2024() {
        // 24 years after the CHIP epoch, six of them leap years.
        let expected = 8766u32 * 86400;
        assert_eq!(Ok(expected), calendar_time_to_chip_epoch(2024, 1, 1, 0, 0, 0));
        assert_eq!((2024, 1, 1, 0, 0, 0), chip_epoch_to_calendar_time(expected));
    }

    #[test]
    fn leap_day_round_trip() {
        let secs = calendar_time_to_chip_epoch(2004, 2, 29, 12, 30, 45).unwrap();
        assert_eq!((2004, 2, 29, 12, 30, 45), chip_epoch_to_calendar_time(secs));
    }

    #[test]
    fn century_non_leap_year() {
        // 2100 is not a leap year.
        let feb28 = calendar_date_to_days_since_unix_epoch(2100, 2, 28).unwrap();
        let mar1 = calendar_date_to_days_since_unix_epoch(2100, 3, 1).unwrap();
        assert_eq!(feb28 + 1, mar1);
    }

    #[test]
    fn year_out_of_chip_range() {
        assert!(calendar_time_to_chip_epoch(1999, 12, 31, 23, 59, 59).is_err());
        assert!(calendar_time_to_chip_epoch(2136, 1, 1, 0, 0, 0).is_err());
    }

    #[test]
    fn round_trip_sweep() {
        for days in (0u32..80000).step_by(997) {
            let (y, m, d) = days_since_unix_epoch_to_calendar_date(days).unwrap();
            assert_eq!(Ok(days), calendar_date_to_days_since_unix_epoch(y, m, d));
        }
    }
}
