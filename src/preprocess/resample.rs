//! Last-observation resampling.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::domain::{Frequency, PricePoint};
use crate::error::AppError;

/// Label of the period containing `date`.
///
/// Weekly periods end on Sunday and monthly periods on the last calendar day,
/// so an aggregated series is stamped with period ends rather than trade dates.
pub fn period_label(date: NaiveDate, frequency: Frequency) -> Result<NaiveDate, AppError> {
    let label = match frequency {
        Frequency::Daily => Some(date),
        Frequency::Weekly => {
            let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
            date.checked_add_days(Days::new(to_sunday))
        }
        Frequency::Monthly => date
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .and_then(|next| next.pred_opt()),
    };
    label.ok_or_else(|| {
        AppError::validation(format!(
            "Cannot compute {} period end for date {date}.",
            frequency.display_name()
        ))
    })
}

/// Keep the last observation of each period. Empty periods simply do not appear.
///
/// Input must already be ascending by date.
pub fn resample_last(prices: &[PricePoint], frequency: Frequency) -> Result<Vec<PricePoint>, AppError> {
    let mut out: Vec<PricePoint> = Vec::new();
    for p in prices {
        let label = period_label(p.date, frequency)?;
        match out.last_mut() {
            Some(last) if last.date == label => last.price = p.price,
            _ => out.push(PricePoint::new(label, p.price)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_label_is_the_following_sunday() {
        // 2024-01-03 is a Wednesday.
        assert_eq!(period_label(d(2024, 1, 3), Frequency::Weekly).unwrap(), d(2024, 1, 7));
        // Sundays label themselves.
        assert_eq!(period_label(d(2024, 1, 7), Frequency::Weekly).unwrap(), d(2024, 1, 7));
    }

    #[test]
    fn monthly_label_handles_leap_february() {
        assert_eq!(period_label(d(2024, 2, 10), Frequency::Monthly).unwrap(), d(2024, 2, 29));
        assert_eq!(period_label(d(2023, 12, 31), Frequency::Monthly).unwrap(), d(2023, 12, 31));
    }

    #[test]
    fn resample_keeps_last_price_and_skips_empty_periods() {
        let prices = vec![
            PricePoint::new(d(2024, 1, 2), 70.0),
            PricePoint::new(d(2024, 1, 5), 72.0),
            // no observations in the week ending 2024-01-14
            PricePoint::new(d(2024, 1, 16), 75.0),
            PricePoint::new(d(2024, 1, 19), 74.0),
        ];
        let weekly = resample_last(&prices, Frequency::Weekly).unwrap();
        assert_eq!(
            weekly,
            vec![
                PricePoint::new(d(2024, 1, 7), 72.0),
                PricePoint::new(d(2024, 1, 21), 74.0),
            ]
        );
    }
}
