use serde::Serialize;

/// A contiguous range of item offsets requested in one upstream call.
/// Both `start` and `end` are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Window {
    pub index: usize,
    pub start: u32,
    pub end: u32,
}

impl Window {
    /// Number of offsets covered.
    pub fn span(&self) -> u32 {
        self.end - self.start + 1
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} [{}-{}]", self.index, self.start, self.end)
    }
}

/// Split `[0, target_count)` into windows of `window_size` offsets.
///
/// The last window is cut short at `target_count - 1`. A zero window size is
/// treated as 1.
pub fn plan_windows(target_count: u32, window_size: u32) -> Vec<Window> {
    let size = window_size.max(1);
    let batches = target_count.div_ceil(size);

    (0..batches)
        .map(|i| {
            let start = i * size;
            let end = start.saturating_add(size - 1).min(target_count - 1);
            Window {
                index: i as usize,
                start,
                end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_tiles_exactly() {
        let windows = plan_windows(6000, 500);
        assert_eq!(windows.len(), 12);
        assert_eq!(windows[0].start, 0);
        assert_eq!(windows[11].end, 5999);

        // Contiguous: each window starts right after the previous one ends
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + 1);
        }
        let covered: u32 = windows.iter().map(|w| w.span()).sum();
        assert_eq!(covered, 6000);
        assert!(windows.iter().enumerate().all(|(i, w)| w.index == i));
    }

    #[test]
    fn test_plan_truncates_last_window() {
        let windows = plan_windows(1234, 500);
        assert_eq!(windows.len(), 3);
        assert_eq!((windows[2].start, windows[2].end), (1000, 1233));
        assert_eq!(windows[2].span(), 234);
    }

    #[test]
    fn test_plan_small_and_empty_targets() {
        assert!(plan_windows(0, 500).is_empty());
        assert_eq!(plan_windows(1, 500), vec![Window { index: 0, start: 0, end: 0 }]);
        assert_eq!(plan_windows(500, 500).len(), 1);
        assert_eq!(plan_windows(501, 500).len(), 2);
    }

    #[test]
    fn test_plan_zero_window_size() {
        let windows = plan_windows(3, 0);
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.span() == 1));
    }

    #[test]
    fn test_default_ceiling() {
        let windows = plan_windows(60_000, 500);
        assert_eq!(windows.len(), 120);
        assert_eq!(windows.last().unwrap().to_string(), "#119 [59500-59999]");
    }
}
