//! Permutation generation for free-order steps.

/// Produces every distinct ordering of `items` using iterative Heap's
/// algorithm.
///
/// Each ordering is an independent copy, so mutating one candidate's steps
/// can never leak into another. The empty sequence has exactly one ordering:
/// the empty one. Cost is `n!`; callers bound `n`.
#[must_use]
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut sequence = items.to_vec();
    let n = sequence.len();

    let mut output = Vec::with_capacity((1..=n).product::<usize>());
    output.push(sequence.clone());

    // Heap's algorithm, iterative form: stack[i] counts the swaps performed
    // at depth i.
    let mut stack = vec![0usize; n];
    let mut i = 1;
    while i < n {
        if stack[i] < i {
            if i % 2 == 0 {
                sequence.swap(0, i);
            } else {
                sequence.swap(stack[i], i);
            }
            output.push(sequence.clone());
            stack[i] += 1;
            i = 1;
        } else {
            stack[i] = 0;
            i += 1;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_empty_sequence_has_one_ordering() {
        let result = permutations::<u8>(&[]);
        assert_eq!(result, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_single_item() {
        assert_eq!(permutations(&[7]), vec![vec![7]]);
    }

    #[test]
    fn test_three_items_yield_six_distinct_orderings() {
        let result = permutations(&[1, 2, 3]);
        assert_eq!(result.len(), 6);

        let distinct: HashSet<Vec<i32>> = result.into_iter().collect();
        assert_eq!(distinct.len(), 6);
        assert!(distinct.contains(&vec![3, 2, 1]));
    }

    #[rstest::rstest]
    #[case(2, 2)]
    #[case(4, 24)]
    #[case(5, 120)]
    fn test_factorial_counts(#[case] n: usize, #[case] expected: usize) {
        let items: Vec<usize> = (0..n).collect();
        let result = permutations(&items);
        assert_eq!(result.len(), expected);

        let distinct: HashSet<Vec<usize>> = result.into_iter().collect();
        assert_eq!(distinct.len(), expected);
    }

    #[test]
    fn test_orderings_are_independent_copies() {
        let mut result = permutations(&[vec![1], vec![2]]);
        assert_eq!(result, vec![vec![vec![1], vec![2]], vec![vec![2], vec![1]]]);

        // Mutating one ordering must not alias into another.
        result[0][0].push(99);
        assert_eq!(result[1], vec![vec![2], vec![1]]);
    }
}
