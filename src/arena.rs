use crate::bff::TAPE_LEN;
use crate::rng::Xorshift64;
use crate::token::Token;

/// Number of tapes in the population: 2^17.
pub const POPULATION: usize = 1 << 17;

/// Tokens per half (one arena cell is half of a combined 128-cell tape).
pub const HALF_LEN: usize = TAPE_LEN / 2;

/// The soup: a fixed population of `POPULATION` half-tapes, a permutation
/// buffer reused every epoch for pairing, and a monotone token-id counter
/// mutated only on the driver thread.
pub struct Arena {
    pub halves: Vec<[Token; HALF_LEN]>,
    pub perm: Vec<u32>,
    pub next_id: u32,
}

impl Arena {
    /// Assign every cell a fresh token `(next_id++, 0, uniform_byte)`.
    pub fn new(rng: &mut Xorshift64) -> Self {
        let mut next_id: u32 = 0;
        let mut halves = Vec::with_capacity(POPULATION);
        for _ in 0..POPULATION {
            let mut half = [Token::new(0, 0, 0); HALF_LEN];
            for cell in half.iter_mut() {
                *cell = Token::new(next_id, 0, rng.byte());
                next_id += 1;
            }
            halves.push(half);
        }
        let perm: Vec<u32> = (0..POPULATION as u32).collect();
        Arena {
            halves,
            perm,
            next_id,
        }
    }

    /// Construct an arena with a caller-chosen population, for tests that
    /// don't want to pay for a full 2^17-tape soup.
    pub fn with_population(rng: &mut Xorshift64, population: usize) -> Self {
        let mut next_id: u32 = 0;
        let mut halves = Vec::with_capacity(population);
        for _ in 0..population {
            let mut half = [Token::new(0, 0, 0); HALF_LEN];
            for cell in half.iter_mut() {
                *cell = Token::new(next_id, 0, rng.byte());
                next_id += 1;
            }
            halves.push(half);
        }
        let perm: Vec<u32> = (0..population as u32).collect();
        Arena {
            halves,
            perm,
            next_id,
        }
    }

    pub fn population(&self) -> usize {
        self.halves.len()
    }
}
