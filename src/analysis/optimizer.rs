use std::hash::Hash;

use itertools::Itertools;
use rustc_hash::FxHashMap;

/// Removes sets that are subsets of another set in the collection (including exact
/// duplicates, of which only one representative survives). Larger sets are kept first,
/// so among several subsets of a common superset, the superset wins.
pub fn remove_subsets<T: Eq + Hash + Clone>(mut sets: Vec<std::collections::HashSet<T>>) -> Vec<std::collections::HashSet<T>> {
    sets.sort_by_key(|s| std::cmp::Reverse(s.len()));
    let mut result: Vec<std::collections::HashSet<T>> = Vec::new();
    'outer: for s in sets {
        for kept in &result {
            if s.is_subset(kept) {
                continue 'outer;
            }
        }
        result.push(s);
    }
    result
}

/// Merges candidate conflict sets that describe the same underlying conflict from two
/// angles: if an element of one set is a descendant (in whatever sense `is_descendant`
/// defines) of an element of another, the smaller set is absorbed into the larger one.
/// Then removes any remaining subsets/duplicates.
///
/// Grounded on the original implementation's `optimize_change_sets`: a descendant
/// absorption pass over every pair of candidate sets, followed by `remove_subsets`.
pub fn optimize_change_sets<T, F>(sets: Vec<std::collections::HashSet<T>>, is_descendant: F) -> Vec<std::collections::HashSet<T>>
where
    T: Eq + Hash + Clone,
    F: Fn(&T, &T) -> bool,
{
    let deduped = remove_subsets(sets);
    if deduped.len() < 2 {
        return deduped;
    }

    let mut replaces: FxHashMap<usize, usize> = FxHashMap::default();
    for (i, j) in (0..deduped.len()).tuple_combinations() {
        let i_descends_from_j = deduped[i]
            .iter()
            .any(|a| deduped[j].iter().any(|b| is_descendant(a, b)));
        let j_descends_from_i = deduped[j]
            .iter()
            .any(|a| deduped[i].iter().any(|b| is_descendant(a, b)));

        if i_descends_from_j {
            let target = *replaces.get(&j).unwrap_or(&j);
            replaces.insert(i, target);
        } else if j_descends_from_i {
            let target = *replaces.get(&i).unwrap_or(&i);
            replaces.insert(j, target);
        }
    }

    let mut merged = deduped;
    for (&from, &to) in &replaces {
        let moved: Vec<T> = merged[from].iter().cloned().collect();
        merged[to].extend(moved);
    }

    let survivors: Vec<_> = merged
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !replaces.contains_key(i))
        .map(|(_, s)| s)
        .collect();

    remove_subsets(survivors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn removes_exact_duplicates() {
        let sets = vec![HashSet::from([1, 2]), HashSet::from([1, 2])];
        let result = remove_subsets(sets);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn removes_proper_subsets() {
        let sets = vec![HashSet::from([1, 2, 3]), HashSet::from([1, 2])];
        let result = remove_subsets(sets);
        assert_eq!(result, vec![HashSet::from([1, 2, 3])]);
    }

    #[test]
    fn keeps_incomparable_sets() {
        let sets = vec![HashSet::from([1, 2]), HashSet::from([3, 4])];
        let result = remove_subsets(sets);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn absorbs_descendant_sets_into_ancestor() {
        // elements are (node, is-descendant-of) pairs encoded as plain ints where
        // descent is "b == a - 1"
        let sets = vec![HashSet::from([10]), HashSet::from([11])];
        let result = optimize_change_sets(sets, |a, b| *a == *b + 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0], HashSet::from([10, 11]));
    }

    #[test]
    fn leaves_unrelated_sets_pairwise_incomparable() {
        let sets = vec![HashSet::from([1]), HashSet::from([2])];
        let result = optimize_change_sets(sets, |_, _| false);
        assert_eq!(result.len(), 2);
    }
}
