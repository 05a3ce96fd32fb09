//! Stable grouping of candidate indices by key.

/// Partitions `order` into contiguous runs sharing the same key.
///
/// Runs are returned in ascending key order and each run keeps the relative
/// order of `order`, so a score-sorted input yields score-sorted groups. No
/// hash map is involved, so the result does not depend on iteration order.
pub(crate) fn group_runs(keys: &[usize], order: &[usize]) -> Vec<(usize, Vec<usize>)> {
    let mut sorted = order.to_vec();
    sorted.sort_by_key(|&i| keys[i]);

    let mut runs: Vec<(usize, Vec<usize>)> = Vec::new();
    for idx in sorted {
        let key = keys[idx];
        match runs.last_mut() {
            Some((last_key, members)) if *last_key == key => members.push(idx),
            _ => runs.push((key, vec![idx])),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::group_runs;

    #[test]
    fn runs_are_contiguous_sorted_and_stable() {
        let keys = [2, 0, 2, 1, 0];
        let order = [4, 2, 0, 1, 3];
        let runs = group_runs(&keys, &order);
        assert_eq!(
            runs,
            vec![(0, vec![4, 1]), (1, vec![3]), (2, vec![2, 0])]
        );
    }

    #[test]
    fn empty_input_has_no_runs() {
        assert!(group_runs(&[], &[]).is_empty());
    }
}
