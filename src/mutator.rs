use crate::arena::{Arena, HALF_LEN};
use crate::rng::Xorshift64;

/// Draw a Poisson(`lambda`) count via Knuth's product-of-uniforms method.
/// `L = exp(-lambda)`, `p` starts at 1 and is repeatedly multiplied by a
/// `(0,1]` draw; `k` counts multiplications until `p <= L`. The returned
/// count is `k - 1`, i.e. the number of multiplications that kept `p > L`.
pub fn poisson(lambda: f64, rng: &mut Xorshift64) -> u64 {
    let l = (-lambda).exp();
    let mut k: u64 = 0;
    let mut p: f64 = 1.0;
    loop {
        k += 1;
        p *= rng.unit_interval();
        if p <= l {
            break;
        }
    }
    k - 1
}

/// Apply background mutation to the arena. Expected mutation count is
/// `population * HALF_LEN * rate`; each mutation writes a fresh token at a
/// uniformly random arena position, minted from `next_id` at `current_epoch`.
/// Runs only on the driver thread, between the epoch's end barrier and the
/// stats tick, so the arena is quiescent.
pub fn mutate(arena: &mut Arena, current_epoch: u16, rate: f64, rng: &mut Xorshift64) {
    if rate <= 0.0 {
        return;
    }
    let population = arena.population();
    let total_cells = population * HALF_LEN;
    let lambda = total_cells as f64 * rate;
    let k = poisson(lambda, rng);

    for _ in 0..k {
        let pos = rng.below(total_cells as u64) as usize;
        let tape_idx = pos / HALF_LEN;
        let cell_idx = pos % HALF_LEN;
        let v = rng.byte();
        let id = arena.next_id;
        arena.next_id = arena.next_id.wrapping_add(1);
        arena.halves[tape_idx][cell_idx] = crate::token::Token::new(id, current_epoch, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_applies_no_mutations() {
        let mut rng = Xorshift64::new(11);
        let mut arena = Arena::with_population(&mut rng, 64);
        let before = arena.halves.clone();
        mutate(&mut arena, 1, 0.0, &mut rng);
        assert_eq!(arena.halves, before);
    }

    #[test]
    fn zero_lambda_poisson_is_always_zero() {
        let mut rng = Xorshift64::new(5);
        for _ in 0..1000 {
            assert_eq!(poisson(0.0, &mut rng), 0);
        }
    }

    #[test]
    fn poisson_mean_matches_lambda_over_many_draws() {
        let mut rng = Xorshift64::new(99);
        let lambda = 6.0;
        let n = 20_000u64;
        let total: u64 = (0..n).map(|_| poisson(lambda, &mut rng)).sum();
        let mean = total as f64 / n as f64;
        assert!(
            (mean - lambda).abs() < 0.3,
            "sample mean {mean} too far from lambda {lambda}"
        );
    }

    #[test]
    fn mutation_mints_fresh_monotone_ids() {
        let mut rng = Xorshift64::new(3);
        let mut arena = Arena::with_population(&mut rng, 64);
        let id_before = arena.next_id;
        mutate(&mut arena, 2, 1.0, &mut rng);
        assert!(arena.next_id >= id_before);
    }

    #[test]
    fn high_rate_mutation_stamps_the_current_epoch() {
        let mut rng = Xorshift64::new(8);
        let mut arena = Arena::with_population(&mut rng, 64);
        mutate(&mut arena, 7, 1.0, &mut rng);
        let any_at_epoch_seven = arena
            .halves
            .iter()
            .flat_map(|h| h.iter())
            .any(|t| t.epoch() == 7);
        assert!(any_at_epoch_seven);
    }

    #[test]
    fn deterministic_given_same_seed() {
        let run = || {
            let mut rng = Xorshift64::new(123);
            let mut arena = Arena::with_population(&mut rng, 64);
            mutate(&mut arena, 1, 0.5, &mut rng);
            arena.halves
        };
        assert_eq!(run(), run());
    }
}
