//! Read-only projections consumed by views.
//!
//! Projections never reorder or copy the stored collections; they borrow them.

use crate::model::calendar::{Weekday, WEEKDAYS};
use crate::model::extra_class::ExtraClass;

/// Extra classes of one weekday, ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraClassDayGroup<'a> {
    pub day: &'static Weekday,
    pub classes: Vec<&'a ExtraClass>,
}

/// Groups extra classes by weekday for display.
///
/// - Groups follow `WEEKDAYS` order; days without classes are omitted.
/// - Within a day, classes sort by `time` ascending; ties keep insertion order.
/// - Entries whose `day_id` matches no weekday are left out.
pub fn group_extra_classes_by_day(classes: &[ExtraClass]) -> Vec<ExtraClassDayGroup<'_>> {
    WEEKDAYS
        .iter()
        .filter_map(|day| {
            let mut day_classes: Vec<&ExtraClass> = classes
                .iter()
                .filter(|entry| entry.day_id == day.id)
                .collect();
            if day_classes.is_empty() {
                return None;
            }
            day_classes.sort_by(|a, b| a.time.cmp(&b.time));
            Some(ExtraClassDayGroup {
                day,
                classes: day_classes,
            })
        })
        .collect()
}
