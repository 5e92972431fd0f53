//! Atomically swapped distribution table.

use std::sync::{Arc, RwLock};

use super::SectorStatistics;

/// Materialized sector statistics shared with concurrent readers.
///
/// Writers build a complete [`SectorStatistics`] before calling
/// [`publish`](Self::publish), which only swaps the `Arc`. Readers clone the
/// current `Arc` and never observe a partially built table.
#[derive(Debug, Default)]
pub struct DistributionTable {
    current: RwLock<Option<Arc<SectorStatistics>>>,
}

impl DistributionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published statistics, returning the new handle.
    pub fn publish(&self, stats: SectorStatistics) -> Arc<SectorStatistics> {
        let stats = Arc::new(stats);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(Arc::clone(&stats));
        stats
    }

    /// The most recently published statistics, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<SectorStatistics>> {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizerConfig;
    use ronda_traits::Date;

    #[test]
    fn test_publish_swaps_whole_table() {
        let table = DistributionTable::new();
        assert!(table.current().is_none());

        let d1 = Date::from_ymd_opt(2024, 3, 28).unwrap();
        let d2 = Date::from_ymd_opt(2024, 3, 29).unwrap();

        table.publish(SectorStatistics::build(d1, &[], NormalizerConfig::default()));
        let reader = table.current().unwrap();

        table.publish(SectorStatistics::build(d2, &[], NormalizerConfig::default()));

        // An earlier reader keeps its consistent snapshot
        assert_eq!(reader.as_of(), d1);
        assert_eq!(table.current().unwrap().as_of(), d2);
    }
}
