use crate::arena::HALF_LEN;
use crate::bff;
use crate::token::Token;

/// One row of the stats stream: computed every `I` epochs from a quiescent
/// arena plus the step counts from the epoch that just completed.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub epoch: u64,
    pub mean_ops: f64,
    pub median_ops: f64,
    pub mean_steps: f64,
    pub max_steps: u32,
    pub unique_ids: usize,
    pub modal_id: u32,
    pub representative_tape: String,
    pub modal_count: usize,
}

/// Counting-sort median over a 0..=HALF_LEN histogram: the lower-upper
/// midpoint for even counts, the middle element for odd counts.
fn median_from_histogram(hist: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let lower_rank = (n - 1) / 2;
    let upper_rank = n / 2;
    let mut lower = None;
    let mut upper = None;
    let mut cumulative = 0usize;
    for (value, &count) in hist.iter().enumerate() {
        cumulative += count;
        if lower.is_none() && lower_rank < cumulative {
            lower = Some(value);
        }
        if upper.is_none() && upper_rank < cumulative {
            upper = Some(value);
        }
        if lower.is_some() && upper.is_some() {
            break;
        }
    }
    let lower = lower.unwrap_or(0) as f64;
    let upper = upper.unwrap_or(0) as f64;
    (lower + upper) / 2.0
}

/// Render a 64-character representation of one tape: the byte if it is a
/// BFF instruction, else a space.
fn render_tape(half: &[Token; HALF_LEN]) -> String {
    half.iter()
        .map(|t| {
            let c = t.char();
            if bff::is_instruction(c) {
                c as char
            } else {
                ' '
            }
        })
        .collect()
}

/// Compute a full stats row from the current (quiescent) arena halves and
/// the per-pair step counts produced by the epoch that just finished.
pub fn compute(epoch: u64, halves: &[[Token; HALF_LEN]], pair_steps: &[u32]) -> StatsRow {
    let n = halves.len();

    // 1. mean / median op count per tape.
    let mut op_hist = [0usize; HALF_LEN + 1];
    let mut op_sum: u64 = 0;
    for half in halves {
        let ops = half.iter().filter(|t| bff::is_instruction(t.char())).count();
        op_hist[ops] += 1;
        op_sum += ops as u64;
    }
    let mean_ops = if n == 0 { 0.0 } else { op_sum as f64 / n as f64 };
    let median_ops = median_from_histogram(&op_hist, n);

    // 2 & 3. unique ids, modal id, occupancy — one sorted pass.
    let mut ids: Vec<u32> = halves.iter().flat_map(|h| h.iter().map(|t| t.id())).collect();
    ids.sort_unstable();

    let mut unique_ids = 0usize;
    let mut modal_id = 0u32;
    let mut modal_count = 0usize;
    if !ids.is_empty() {
        let mut cur = ids[0];
        let mut run = 0usize;
        for &id in &ids {
            if id == cur {
                run += 1;
            } else {
                unique_ids += 1;
                if run > modal_count {
                    modal_count = run;
                    modal_id = cur;
                }
                cur = id;
                run = 1;
            }
        }
        unique_ids += 1;
        if run > modal_count {
            modal_count = run;
            modal_id = cur;
        }
    }

    // 4. representative tape: highest count of cells carrying the modal id,
    // ties broken by smallest index.
    let mut rep_idx = 0usize;
    let mut rep_count = 0usize;
    for (i, half) in halves.iter().enumerate() {
        let c = half.iter().filter(|t| t.id() == modal_id).count();
        if c > rep_count {
            rep_count = c;
            rep_idx = i;
        }
    }
    let representative_tape = halves
        .get(rep_idx)
        .map(render_tape)
        .unwrap_or_default();

    // 5. step summary over the just-completed epoch.
    let (mean_steps, max_steps) = if pair_steps.is_empty() {
        (0.0, 0)
    } else {
        let sum: u64 = pair_steps.iter().map(|&s| s as u64).sum();
        let max = pair_steps.iter().copied().max().unwrap_or(0);
        (sum as f64 / pair_steps.len() as f64, max)
    };

    StatsRow {
        epoch,
        mean_ops,
        median_ops,
        mean_steps,
        max_steps,
        unique_ids,
        modal_id,
        representative_tape,
        modal_count,
    }
}
