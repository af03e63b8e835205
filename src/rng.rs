/// A splittable 64-bit xorshift generator.
///
/// Update rule is fixed by spec: `x ^= x<<13; x ^= x>>7; x ^= x<<17`. State
/// must never be zero — the update is a bijection on the non-zero orbit of
/// `u64`, but zero is a fixed point, so construction rejects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Build a generator from a seed. A zero seed is folded to a fixed
    /// non-zero constant so the stream never degenerates.
    pub fn new(seed: u64) -> Self {
        Xorshift64 {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform integer in `[0, bound)`. `bound` must be nonzero.
    #[inline]
    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }

    /// Uniform byte in `[0, 256)`.
    #[inline]
    pub fn byte(&mut self) -> u8 {
        self.next_u64() as u8
    }

    /// A uniform(0,1] draw built from the top 53 bits of a raw draw, scaled
    /// by 2^-53. Used by the Poisson sampler in `crate::mutator`.
    #[inline]
    pub fn unit_interval(&mut self) -> f64 {
        let top53 = self.next_u64() >> 11;
        // top53 in [0, 2^53); add 1 so the result lands in (0, 1] rather
        // than [0, 1), matching the product-of-uniforms termination rule.
        (top53 as f64 + 1.0) / (1u64 << 53) as f64
    }

    /// Derive an independent child stream from this one. Used each epoch to
    /// seed per-worker RNGs from the global stream, in a fixed order, so the
    /// whole simulation stays reproducible under a fixed thread count.
    pub fn split(&mut self) -> Xorshift64 {
        // Draw twice and fold so a worker's stream doesn't trivially track
        // the parent's raw output one draw later.
        let a = self.next_u64();
        let b = self.next_u64();
        Xorshift64::new(a ^ b.rotate_left(32))
    }

    /// Warm the stream by discarding `n` draws. Used at startup to move the
    /// global RNG away from a structured seed before it's used for anything.
    pub fn warm(&mut self, n: usize) {
        for _ in 0..n {
            self.next_u64();
        }
    }

    pub fn raw_state(&self) -> u64 {
        self.state
    }
}
