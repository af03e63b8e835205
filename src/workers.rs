use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::JoinHandle;

use crate::arena::HALF_LEN;
use crate::bff;
use crate::rng::Xorshift64;
use crate::token::Token;

/// A raw, unsynchronized view into the arena's halves. Safe to hand to
/// workers only because the driver guarantees each epoch's pair set is a
/// bijection on arena indices: no two workers ever touch the same cell,
/// so there is nothing to race on and no lock is needed.
struct ArenaView {
    ptr: *mut [Token; HALF_LEN],
    len: usize,
}

// SAFETY: workers only ever dereference disjoint indices into the pointee,
// established anew each epoch by the pair-disjointness invariant of the
// Fisher-Yates shuffle in `crate::pairing`.
unsafe impl Send for ArenaView {}
unsafe impl Sync for ArenaView {}

impl ArenaView {
    fn new(halves: &mut [[Token; HALF_LEN]]) -> Self {
        ArenaView {
            ptr: halves.as_mut_ptr(),
            len: halves.len(),
        }
    }

    /// # Safety
    /// Caller must ensure no other live reference (shared or unique) to
    /// `halves[idx]` exists concurrently.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get_mut(&self, idx: usize) -> &mut [Token; HALF_LEN] {
        debug_assert!(idx < self.len);
        unsafe { &mut *self.ptr.add(idx) }
    }
}

/// A raw view into the permutation buffer, published by the driver before
/// the start barrier and read-only for the rest of the epoch.
struct PermView {
    ptr: *const u32,
    len: usize,
}

unsafe impl Send for PermView {}
unsafe impl Sync for PermView {}

impl PermView {
    fn new(perm: &[u32]) -> Self {
        PermView {
            ptr: perm.as_ptr(),
            len: perm.len(),
        }
    }

    fn get(&self, idx: usize) -> u32 {
        debug_assert!(idx < self.len);
        unsafe { *self.ptr.add(idx) }
    }
}

/// A raw view into the per-pair step-count buffer, partitioned identically
/// to the arena: each worker writes only the entries in its own slice.
struct StepsView {
    ptr: *mut u32,
    len: usize,
}

unsafe impl Send for StepsView {}
unsafe impl Sync for StepsView {}

impl StepsView {
    fn new(steps: &mut [u32]) -> Self {
        StepsView {
            ptr: steps.as_mut_ptr(),
            len: steps.len(),
        }
    }

    /// # Safety
    /// Caller must ensure no other live reference to `steps[idx]` exists.
    unsafe fn set(&self, idx: usize, value: u32) {
        debug_assert!(idx < self.len);
        unsafe { *self.ptr.add(idx) = value };
    }
}

struct EpochState {
    arena: ArenaView,
    perm: PermView,
    steps: StepsView,
    /// N/2, the number of pairs this epoch.
    pair_count: usize,
}

/// A fixed slice of pair-indices statically assigned to one worker.
#[derive(Clone, Copy)]
struct Slice {
    lo: usize,
    hi: usize,
}

/// Static partition of `[0, half_population)` into `threads` contiguous
/// slices; the last worker's upper bound is snapped to `half_population`.
fn partition(half_population: usize, threads: usize) -> Vec<Slice> {
    if threads == 0 {
        return Vec::new();
    }
    let chunk = half_population / threads;
    (0..threads)
        .map(|t| {
            let lo = t * chunk;
            let hi = if t + 1 == threads {
                half_population
            } else {
                (t + 1) * chunk
            };
            Slice { lo, hi }
        })
        .collect()
}

/// A persistent pool of `T` worker threads synchronized by a pair of
/// barriers sized for `T+1` parties (the driver is the `+1`).
///
/// Each epoch the driver: shuffles `perm` and seeds per-worker RNGs, then
/// releases `start`; each worker processes its static slice of pairs; the
/// driver waits on `end`. No locking is needed because the shuffle
/// guarantees pair-disjoint arena access within the epoch.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    start: Arc<Barrier>,
    end: Arc<Barrier>,
    shutdown: Arc<AtomicBool>,
    seeds: Arc<Vec<AtomicU64>>,
}

impl WorkerPool {
    /// Spawn `threads` persistent workers against the given arena halves,
    /// permutation buffer, and step-count buffer. The three buffers must
    /// outlive the pool (the pool borrows them as raw pointers for the
    /// lifetime of every subsequent epoch).
    pub fn spawn(
        threads: usize,
        halves: &mut [[Token; HALF_LEN]],
        perm: &[u32],
        steps: &mut [u32],
    ) -> Self {
        let threads = threads.max(1);
        let half_population = perm.len() / 2;
        let slices = partition(half_population, threads);

        let start = Arc::new(Barrier::new(threads + 1));
        let end = Arc::new(Barrier::new(threads + 1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let seeds: Arc<Vec<AtomicU64>> =
            Arc::new((0..threads).map(|_| AtomicU64::new(1)).collect());

        let state = Arc::new(EpochState {
            arena: ArenaView::new(halves),
            perm: PermView::new(perm),
            steps: StepsView::new(steps),
            pair_count: half_population,
        });

        let mut handles = Vec::with_capacity(threads);
        for (t, slice) in slices.into_iter().enumerate() {
            let start = Arc::clone(&start);
            let end = Arc::clone(&end);
            let shutdown = Arc::clone(&shutdown);
            let seeds = Arc::clone(&seeds);
            let state = Arc::clone(&state);
            handles.push(std::thread::spawn(move || {
                worker_loop(t, slice, &start, &end, &shutdown, &seeds, &state);
            }));
        }

        WorkerPool {
            handles,
            start,
            end,
            shutdown,
            seeds,
        }
    }

    /// Run one epoch: seed per-worker RNGs from the global stream (in a
    /// fixed order, so the whole run is reproducible for a given thread
    /// count), release the workers, and wait for them to finish.
    pub fn run_epoch(&self, global_rng: &mut Xorshift64) {
        for seed in self.seeds.iter() {
            let child = global_rng.split();
            seed.store(child.raw_state(), Ordering::Relaxed);
        }
        self.start.wait();
        self.end.wait();
    }

    /// Signal shutdown, release the workers one last time so they observe
    /// it, and join them all.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.start.wait();
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    worker_index: usize,
    slice: Slice,
    start: &Barrier,
    end: &Barrier,
    shutdown: &AtomicBool,
    seeds: &[AtomicU64],
    state: &EpochState,
) {
    loop {
        start.wait();
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        let mut rng = Xorshift64::new(seeds[worker_index].load(Ordering::Relaxed));
        let half = state.pair_count;

        for i in slice.lo..slice.hi {
            let a = state.perm.get(i) as usize;
            let b = state.perm.get(i + half) as usize;

            let mut tape = [Token::new(0, 0, 0); bff::TAPE_LEN];
            // SAFETY: the shuffle that produced `perm` this epoch is a
            // bijection, so `a` and `b` are each owned exclusively by this
            // iteration across the whole worker pool.
            unsafe {
                let ha = state.arena.get_mut(a);
                let hb = state.arena.get_mut(b);
                tape[..HALF_LEN].copy_from_slice(&ha[..]);
                tape[HALF_LEN..].copy_from_slice(&hb[..]);
            }

            let head0 = rng.below(bff::TAPE_LEN as u64) as usize;
            let head1 = rng.below(bff::TAPE_LEN as u64) as usize;
            let steps = bff::execute(&mut tape, head0, head1);

            unsafe {
                state.arena.get_mut(a)[..].copy_from_slice(&tape[..HALF_LEN]);
                state.arena.get_mut(b)[..].copy_from_slice(&tape[HALF_LEN..]);
                state.steps.set(i, steps as u32);
            }
        }

        end.wait();
    }
}
