//! Day-of-week by hour-of-day activity grid

use crate::models::CallEvent;
use chrono::{Datelike, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    /// 0 = Sunday through 6 = Saturday
    pub day: u8,
    pub hour: u8,
    pub count: u64,
    /// `count / max_cell`, in [0, 1]
    pub intensity: f64,
}

/// Seven rows of 24 cells, indexed `grid[day][hour]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub grid: Vec<Vec<HeatmapCell>>,
    /// Busiest cell count, never below 1
    pub max_cell: u64,
}

impl Heatmap {
    pub fn cell(&self, day: usize, hour: usize) -> Option<&HeatmapCell> {
        self.grid.get(day).and_then(|row| row.get(hour))
    }

    pub fn total(&self) -> u64 {
        self.grid.iter().flatten().map(|c| c.count).sum()
    }
}

#[derive(Debug, Clone)]
pub struct HeatmapBuilder {
    tz: Tz,
}

impl HeatmapBuilder {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Count events per local (weekday, hour) and normalize
    pub fn build(&self, events: &[&CallEvent]) -> Heatmap {
        let mut counts = [[0u64; HOURS_PER_DAY]; DAYS_PER_WEEK];

        for ts in events.iter().filter_map(|e| e.start_timestamp) {
            let local = ts.with_timezone(&self.tz);
            let day = local.weekday().num_days_from_sunday() as usize;
            counts[day][local.hour() as usize] += 1;
        }

        let max_cell = counts.iter().flatten().copied().max().unwrap_or(0).max(1);

        let grid = counts
            .iter()
            .enumerate()
            .map(|(day, row)| {
                row.iter()
                    .enumerate()
                    .map(|(hour, &count)| HeatmapCell {
                        day: day as u8,
                        hour: hour as u8,
                        count,
                        intensity: count as f64 / max_cell as f64,
                    })
                    .collect()
            })
            .collect();

        Heatmap { grid, max_cell }
    }
}

impl Default for HeatmapBuilder {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_grid() {
        let heatmap = HeatmapBuilder::default().build(&[]);

        assert_eq!(heatmap.max_cell, 1);
        assert_eq!(heatmap.grid.len(), DAYS_PER_WEEK);
        assert!(heatmap.grid.iter().all(|row| row.len() == HOURS_PER_DAY));
        assert!(heatmap.grid.iter().flatten().all(|c| c.intensity == 0.0));
    }

    #[test]
    fn test_counts_and_intensity() {
        // 2024-03-15 is a Friday
        let friday_9 = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let sunday_23 = Utc.with_ymd_and_hms(2024, 3, 17, 23, 5, 0).unwrap();
        let events = vec![
            CallEvent::new("a", friday_9),
            CallEvent::new("b", friday_9),
            CallEvent::new("c", sunday_23),
            CallEvent::default(),
        ];
        let refs: Vec<_> = events.iter().collect();

        let heatmap = HeatmapBuilder::default().build(&refs);

        assert_eq!(heatmap.max_cell, 2);
        assert_eq!(heatmap.cell(5, 9).unwrap().count, 2);
        assert_eq!(heatmap.cell(5, 9).unwrap().intensity, 1.0);
        assert_eq!(heatmap.cell(0, 23).unwrap().intensity, 0.5);
        assert_eq!(heatmap.total(), 3);
        assert!(heatmap
            .grid
            .iter()
            .flatten()
            .all(|c| (0.0..=1.0).contains(&c.intensity)));
    }

    #[test]
    fn test_uses_local_time() {
        // Saturday 02:00 UTC is Friday 22:00 in New York (EDT)
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 2, 0, 0).unwrap();
        let event = CallEvent::new("a", ts);

        let heatmap = HeatmapBuilder::new(chrono_tz::America::New_York).build(&[&event]);

        assert_eq!(heatmap.cell(5, 22).unwrap().count, 1);
        assert_eq!(heatmap.cell(6, 2).unwrap().count, 0);
    }
}
