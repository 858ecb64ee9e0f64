// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

/// The powers of two within `start..=end`: `start` is rounded up and `end` down to a power of two.
#[must_use]
pub fn powers_of_two(start: usize, end: usize) -> Vec<usize> {
    let Some(first) = start.max(1).checked_next_power_of_two() else {
        return Vec::new();
    };
    std::iter::successors(Some(first), |n| n.checked_mul(2))
        .take_while(|&n| n <= end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rounded_inward() {
        assert_eq!(powers_of_two(2, 256), vec![2, 4, 8, 16, 32, 64, 128, 256]);
        assert_eq!(powers_of_two(3, 100), vec![4, 8, 16, 32, 64]);
        assert_eq!(powers_of_two(0, 1), vec![1]);
        assert_eq!(powers_of_two(5, 7), Vec::<usize>::new());
        assert_eq!(powers_of_two(64, 2), Vec::<usize>::new());
        assert_eq!(powers_of_two(usize::MAX, usize::MAX), Vec::<usize>::new());
    }
}
