use chrono::{Days, NaiveDate};

use crate::workflows::quality::domain::DateWindow;

/// Count distinct calendar days covered by at least one fill interval,
/// clipped to the window. Overlapping refills are unioned, never summed, so
/// coverage cannot exceed the window length.
pub(crate) fn covered_days(fills: &[(NaiveDate, u32)], window: DateWindow) -> i64 {
    let mut intervals: Vec<(NaiveDate, NaiveDate)> = fills
        .iter()
        .filter_map(|(fill_date, days_supply)| {
            if *days_supply == 0 {
                return None;
            }
            // Coverage is [fill_date, fill_date + days_supply), exclusive end.
            let supply_end = fill_date
                .checked_add_days(Days::new(u64::from(*days_supply)))
                .unwrap_or(NaiveDate::MAX);
            let start = (*fill_date).max(window.start);
            let end_exclusive = supply_end.min(
                window
                    .end
                    .checked_add_days(Days::new(1))
                    .unwrap_or(NaiveDate::MAX),
            );
            (start < end_exclusive).then_some((start, end_exclusive))
        })
        .collect();

    intervals.sort();

    let mut covered = 0i64;
    let mut cursor: Option<NaiveDate> = None;
    for (start, end_exclusive) in intervals {
        let effective_start = match cursor {
            Some(position) if position > start => position,
            _ => start,
        };
        if effective_start < end_exclusive {
            covered += (end_exclusive - effective_start).num_days();
        }
        cursor = Some(match cursor {
            Some(position) => position.max(end_exclusive),
            None => end_exclusive,
        });
    }

    covered
}

/// Proportion of days covered over the window, in `[0, 1]`.
pub(crate) fn proportion_of_days_covered(fills: &[(NaiveDate, u32)], window: DateWindow) -> f64 {
    let window_days = (window.end - window.start).num_days() + 1;
    if window_days <= 0 {
        return 0.0;
    }
    covered_days(fills, window) as f64 / window_days as f64
}
