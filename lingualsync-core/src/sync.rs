//! Mapping a playback position onto lyric lines.

/// Index of the line active at `progress_ms`: the last line whose time is at
/// or before the position.
///
/// Returns `None` when there is no position, no lines, or the position is
/// before the first line. A position past the last line keeps the last line
/// active.
#[must_use]
pub fn active_index(times: &[u64], progress_ms: Option<u64>) -> Option<usize> {
    let progress_ms = progress_ms?;

    // Number of times <= progress; duplicates resolve to the greatest index
    let count = times.partition_point(|&t| t <= progress_ms);
    count.checked_sub(1)
}

/// Lines from `index - before` to `index + after` inclusive, clamped to the
/// list bounds. No active line (`None`) windows from the start of the list.
#[must_use]
pub fn window<T: Clone>(lines: &[T], index: Option<usize>, before: usize, after: usize) -> Vec<T> {
    if lines.is_empty() {
        return Vec::new();
    }

    let start = window_start(index, before).min(lines.len() - 1);
    let end = index
        .unwrap_or(0)
        .saturating_add(after)
        .saturating_add(1)
        .min(lines.len());

    lines[start..end].to_vec()
}

/// First line index shown in the window around `index`
#[must_use]
pub const fn window_start(index: Option<usize>, before: usize) -> usize {
    match index {
        Some(index) => index.saturating_sub(before),
        None => 0,
    }
}

/// Render an optional index the way payload consumers expect it (`-1` for none)
#[must_use]
pub fn index_to_wire(index: Option<usize>) -> i64 {
    index.map_or(-1, |i| i64::try_from(i).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES: [u64; 3] = [1000, 5000, 9000];

    #[test]
    fn test_active_index() {
        assert_eq!(active_index(&TIMES, Some(0)), None);
        assert_eq!(active_index(&TIMES, Some(999)), None);
        assert_eq!(active_index(&TIMES, Some(1000)), Some(0));
        assert_eq!(active_index(&TIMES, Some(4999)), Some(0));
        assert_eq!(active_index(&TIMES, Some(5000)), Some(1));
        assert_eq!(active_index(&TIMES, Some(999_999)), Some(2));
        assert_eq!(active_index(&TIMES, None), None);
    }

    #[test]
    fn test_active_index_edge_lists() {
        assert_eq!(active_index(&[], Some(5000)), None);
        assert_eq!(active_index(&[3000], Some(2999)), None);
        assert_eq!(active_index(&[3000], Some(3000)), Some(0));
        assert_eq!(active_index(&[3000], Some(u64::MAX)), Some(0));
    }

    #[test]
    fn test_active_index_duplicate_times() {
        let times = [1000, 2000, 2000, 2000, 3000];
        assert_eq!(active_index(&times, Some(2000)), Some(3));
        assert_eq!(active_index(&times, Some(2500)), Some(3));
        assert_eq!(active_index(&times, Some(1999)), Some(0));
    }

    #[test]
    fn test_window_clamps_at_end() {
        let lines = vec!["a", "b", "c"];
        assert_eq!(window(&lines, Some(2), 2, 6), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_window_middle() {
        let lines: Vec<u32> = (0..20).collect();
        assert_eq!(window(&lines, Some(10), 2, 6), (8..=16).collect::<Vec<_>>());
        assert_eq!(window(&lines, Some(1), 2, 6), (0..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_without_active_line() {
        let lines: Vec<u32> = (0..20).collect();
        assert_eq!(window(&lines, None, 2, 6), (0..=6).collect::<Vec<_>>());

        let short = vec![1, 2];
        assert_eq!(window(&short, None, 2, 6), vec![1, 2]);
    }

    #[test]
    fn test_window_empty() {
        let lines: Vec<u32> = Vec::new();
        assert!(window(&lines, Some(3), 2, 6).is_empty());
        assert!(window(&lines, None, 2, 6).is_empty());
    }

    #[test]
    fn test_window_is_independent_copy() {
        let lines = vec![String::from("a"), String::from("b")];
        let mut shown = window(&lines, Some(0), 0, 1);
        shown[0].push('!');
        assert_eq!(lines[0], "a");
    }

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(None, 2), 0);
        assert_eq!(window_start(Some(0), 2), 0);
        assert_eq!(window_start(Some(1), 2), 0);
        assert_eq!(window_start(Some(5), 2), 3);
    }

    #[test]
    fn test_index_to_wire() {
        assert_eq!(index_to_wire(None), -1);
        assert_eq!(index_to_wire(Some(0)), 0);
        assert_eq!(index_to_wire(Some(7)), 7);
    }
}
