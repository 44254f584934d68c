// ============================================================
// Layer 4 — Hard Negative Sampler
// ============================================================
// Every training example must carry exactly K hard negatives,
// but records come with however many the miner found.
//
//   have < K             keep all, then top up by drawing with
//                        replacement from the same pool
//   have ≥ K, random     K distinct picks, uniform
//   have ≥ K, first      the first K, file order
//
// Randomness comes from the caller's generator, never from a
// process-wide one. The dataset seeds a fresh StdRng per ordinal,
// so an example's negatives do not depend on which worker
// fetched it or in what order.
//
// A record with no negatives at all cannot be topped up; that
// case fails with EmptyNegativePool instead of inventing text.
//
// Reference: rand crate documentation (seq::index::sample)

use rand::{seq::index, Rng};

use crate::domain::config::NegativeStrategy;
use crate::domain::error::{DatasetError, Result};

/// Reduce or expand `pool` to exactly `k` negatives.
///
/// `record` is only used to label the EmptyNegativePool error.
pub fn sample_negatives<'a, R: Rng + ?Sized>(
    pool:     &[&'a str],
    k:        usize,
    strategy: NegativeStrategy,
    rng:      &mut R,
    record:   usize,
) -> Result<Vec<&'a str>> {
    let picked: Vec<&'a str> = if pool.len() < k {
        if pool.is_empty() {
            return Err(DatasetError::EmptyNegativePool { index: record, required: k });
        }
        let mut picked = pool.to_vec();
        picked.extend((pool.len()..k).map(|_| pool[rng.gen_range(0..pool.len())]));
        picked
    } else {
        match strategy {
            NegativeStrategy::Random => index::sample(rng, pool.len(), k)
                .into_iter()
                .map(|i| pool[i])
                .collect(),
            NegativeStrategy::First => pool[..k].to_vec(),
        }
    };

    if picked.len() != k {
        return Err(DatasetError::SamplingInvariant { expected: k, actual: picked.len() });
    }
    Ok(picked)
}
