use crate::rng::Xorshift64;

/// A single epoch's pairing: arena index `a` paired with arena index `b`,
/// at pair-index `i` (used to address `pair_steps[i]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pair {
    pub i: usize,
    pub a: usize,
    pub b: usize,
}

/// Reset `perm` to the identity permutation, then Fisher–Yates shuffle it
/// in place: for `i` from `len-1` down to `1`, swap `perm[i]` with
/// `perm[j]` for `j` uniform in `[0, i]`.
pub fn shuffle(perm: &mut [u32], rng: &mut Xorshift64) {
    for (i, slot) in perm.iter_mut().enumerate() {
        *slot = i as u32;
    }
    let len = perm.len();
    if len < 2 {
        return;
    }
    for i in (1..len).rev() {
        let j = rng.below((i + 1) as u64) as usize;
        perm.swap(i, j);
    }
}

/// Build the N/2 pairs for this epoch from a freshly shuffled `perm`: pair
/// `i` is `(perm[i], perm[i + N/2])` for `i` in `[0, N/2)`.
pub fn pairs(perm: &[u32]) -> Vec<Pair> {
    let n = perm.len();
    let half = n / 2;
    (0..half)
        .map(|i| Pair {
            i,
            a: perm[i] as usize,
            b: perm[i + half] as usize,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_produces_a_permutation() {
        let mut rng = Xorshift64::new(1);
        let mut perm = vec![0u32; 100];
        shuffle(&mut perm, &mut rng);
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        let expected: Vec<u32> = (0..100).collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn every_index_appears_in_exactly_one_pair() {
        let mut rng = Xorshift64::new(5);
        let mut perm = vec![0u32; 64];
        shuffle(&mut perm, &mut rng);
        let ps = pairs(&perm);
        assert_eq!(ps.len(), 32);
        let mut seen = vec![0u32; 64];
        for p in &ps {
            seen[p.a] += 1;
            seen[p.b] += 1;
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn deterministic_given_same_seed() {
        let mut rng1 = Xorshift64::new(77);
        let mut rng2 = Xorshift64::new(77);
        let mut perm1 = vec![0u32; 50];
        let mut perm2 = vec![0u32; 50];
        shuffle(&mut perm1, &mut rng1);
        shuffle(&mut perm2, &mut rng2);
        assert_eq!(perm1, perm2);
    }

    #[test]
    fn small_permutation_single_pair() {
        let mut rng = Xorshift64::new(2);
        let mut perm = vec![0u32; 2];
        shuffle(&mut perm, &mut rng);
        let ps = pairs(&perm);
        assert_eq!(ps.len(), 1);
        assert_ne!(ps[0].a, ps[0].b);
    }

    #[test]
    fn degenerate_single_element_pairs_with_itself() {
        // N=1 guarantees nothing about a != b (spec note).
        let mut rng = Xorshift64::new(9);
        let mut perm = vec![0u32; 1];
        shuffle(&mut perm, &mut rng);
        let ps = pairs(&perm);
        assert_eq!(ps.len(), 0);
    }
}
