//! Append-only session log of detections.

use crate::detection::Detection;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Receiver of accepted detections.
///
/// Append-only: there is no update or delete.
pub trait DetectionSink: Send + Sync {
    /// Record a detection.
    fn append(&self, detection: Detection);
}

/// Ordering for time-sorted views of the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

impl SortOrder {
    /// The opposite ordering.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// In-memory detection history for the active session.
///
/// Shared between the session controller (which appends) and whatever
/// displays or exports the history. Clearing discards the whole log.
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: Mutex<Vec<Detection>>,
}

impl SessionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Detection>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of recorded detections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discard every detection.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Detections in append order.
    pub fn snapshot(&self) -> Vec<Detection> {
        self.lock().clone()
    }

    /// Detections ordered by timestamp.
    ///
    /// The sort is stable, so detections with equal timestamps keep their
    /// append order.
    pub fn sorted(&self, order: SortOrder) -> Vec<Detection> {
        let mut detections = self.snapshot();
        match order {
            SortOrder::Ascending => detections.sort_by_key(Detection::timestamp),
            SortOrder::Descending => {
                detections.sort_by_key(|d| std::cmp::Reverse(d.timestamp()));
            }
        }
        detections
    }
}

impl DetectionSink for SessionLog {
    fn append(&self, detection: Detection) {
        self.lock().push(detection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Species;
    use chrono::{Duration, Local};

    #[test]
    fn test_append_then_clear_is_empty() {
        let log = SessionLog::new();
        log.append(Detection::new(Species::Deer, 0.9, Local::now(), "a"));
        log.append(Detection::new(Species::Cat, 0.6, Local::now(), "b"));
        assert_eq!(log.len(), 2);

        log.clear();
        assert!(log.is_empty());
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_sorted_views() {
        let now = Local::now();
        let log = SessionLog::new();
        log.append(Detection::new(Species::Deer, 0.9, now, "middle"));
        log.append(Detection::new(Species::Cat, 0.6, now - Duration::seconds(10), "oldest"));
        log.append(Detection::new(Species::Dog, 0.7, now + Duration::seconds(10), "newest"));

        let asc = log.sorted(SortOrder::Ascending);
        let names: Vec<_> = asc.iter().map(Detection::image_url).collect();
        assert_eq!(names, ["oldest", "middle", "newest"]);

        let desc = log.sorted(SortOrder::Descending);
        let names: Vec<_> = desc.iter().map(Detection::image_url).collect();
        assert_eq!(names, ["newest", "middle", "oldest"]);

        // Append order is untouched by sorting.
        assert_eq!(log.snapshot()[0].image_url(), "middle");
    }

    #[test]
    fn test_sort_order_toggle() {
        assert_eq!(SortOrder::default(), SortOrder::Descending);
        assert_eq!(SortOrder::Descending.toggled(), SortOrder::Ascending);
    }
}
