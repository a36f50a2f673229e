//! Swap-based permutation generation for phase searches.

use std::convert::Infallible;

/// Calls `visit` once for every ordering of `items`.
///
/// Orderings are produced by recursive swapping, starting with `items` as
/// given. `items` is restored before returning. Visiting stops at the first
/// error, which is returned.
pub fn try_for_each_permutation<T, E, F>(items: &mut [T], mut visit: F) -> Result<(), E>
where
    F: FnMut(&[T]) -> Result<(), E>,
{
    fn permute<T, E, F>(items: &mut [T], from: usize, visit: &mut F) -> Result<(), E>
    where
        F: FnMut(&[T]) -> Result<(), E>,
    {
        if from + 1 >= items.len() {
            return visit(items);
        }
        for to in from..items.len() {
            items.swap(from, to);
            let result = permute(items, from + 1, visit);
            items.swap(from, to);
            result?;
        }
        Ok(())
    }

    permute(items, 0, &mut visit)
}

/// Collects every ordering of `items`.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut scratch = items.to_vec();
    let mut all = Vec::new();
    let visited = try_for_each_permutation(&mut scratch, |perm| {
        all.push(perm.to_vec());
        Ok::<(), Infallible>(())
    });
    match visited {
        Ok(()) => all,
        Err(never) => match never {},
    }
}
