//! Clock hour to earthly-branch ("时辰") index mapping.

/// The twelve earthly branches in index order, 子 first.
pub const EARTHLY_BRANCHES: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

/// Maps a wall-clock hour (0..=23) to the branch index the ephemeris expects.
///
/// Each branch spans two clock hours centred on the even hour, so 23:00 and
/// 00:xx both fall into 子 (index 0).
pub fn time_branch_index(hour: u32) -> u8 {
    debug_assert!(hour < 24, "hour out of range: {hour}");
    if hour == 23 { 0 } else { ((hour + 1) / 2) as u8 }
}

/// Display name of a branch index, e.g. `0 -> "子"`.
pub fn branch_name(index: u8) -> &'static str {
    EARTHLY_BRANCHES[index as usize % 12]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_sequence_over_a_day() {
        let hours = std::iter::once(23).chain(0..23);
        let branches: Vec<u8> = hours.map(time_branch_index).collect();
        assert_eq!(
            branches,
            vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11]
        );
    }

    #[test]
    fn test_boundary_hours() {
        assert_eq!(time_branch_index(23), 0);
        assert_eq!(time_branch_index(0), 0);
        assert_eq!(time_branch_index(1), 1);
        assert_eq!(time_branch_index(2), 1);
        assert_eq!(time_branch_index(22), 11);
    }

    #[test]
    fn test_branch_names() {
        assert_eq!(branch_name(0), "子");
        assert_eq!(branch_name(time_branch_index(12)), "午");
        assert_eq!(branch_name(11), "亥");
    }
}
