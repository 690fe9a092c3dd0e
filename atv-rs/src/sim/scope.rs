use crate::{Error, Result, Time};
use chrono::{Duration, NaiveDate};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Ordered set of named locations (ponds, sites) a scenario runs over.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Scope {
    ids: Vec<String>,
}

impl Scope {
    pub fn new(ids: Vec<String>) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::EmptyScope);
        }
        Ok(Scope { ids })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }
}

/// A run window: a start date and a number of whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct TimeFrame {
    start: NaiveDate,
    duration_days: Time,
}

impl TimeFrame {
    pub fn of(start: NaiveDate, duration_days: Time) -> Result<Self> {
        if duration_days == 0 {
            return Err(Error::EmptyTimeFrame);
        }
        Ok(TimeFrame {
            start,
            duration_days,
        })
    }

    pub fn days(&self) -> usize {
        self.duration_days as usize
    }

    /// Calendar date of the given day, counting from 0.
    pub fn date(&self, day: Time) -> NaiveDate {
        self.start + Duration::days(day as i64)
    }

    /// Last simulated date.
    pub fn end(&self) -> NaiveDate {
        self.date(self.duration_days - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_frame_maps_days_to_dates() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let tf = TimeFrame::of(start, 200).unwrap();
        assert_eq!(tf.days(), 200);
        assert_eq!(tf.date(31), NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
        assert_eq!(tf.end(), NaiveDate::from_ymd_opt(2020, 7, 18).unwrap());
        assert!(TimeFrame::of(start, 0).is_err());
    }

    #[test]
    fn scope_requires_locations() {
        assert!(Scope::new(vec![]).is_err());
        let scope = Scope::new(vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(scope.index_of("b"), Some(1));
        assert_eq!(scope.len(), 2);
    }
}
