//! Named random streams derived from a single run seed.

use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::SeedableRng;
use siphasher::sip::SipHasher13;

/// Generator handed to weight initialisation, batch shuffling and toy sampling.
pub type RngHandle = StdRng;

/// Toy source names used as stream labels.
pub const TOY_SOURCES: [&str; 3] = ["background", "simulation", "signal_region"];

/// An independent random stream of one run.
///
/// A stream is seeded from `(run seed, stream)` only, so the numbers one stage
/// draws never depend on how many numbers an earlier stage consumed. Seeds are
/// SipHash-1-3 digests under zero keys and are stable across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Network weight initialisation.
    WeightInit,
    /// Mini-batch order of one training epoch.
    Shuffle {
        /// Zero-based epoch index.
        epoch: usize,
    },
    /// Synthetic events of one record source.
    Toy {
        /// Index into [`TOY_SOURCES`].
        source: usize,
    },
}

impl Stream {
    fn tag(self) -> (&'static [u8], u64) {
        match self {
            Stream::WeightInit => (b"weight-init", 0),
            Stream::Shuffle { epoch } => (b"shuffle", epoch as u64),
            Stream::Toy { source } => (b"toy", source as u64),
        }
    }

    /// Seed of this stream under `run_seed`.
    pub fn seed(self, run_seed: u64) -> u64 {
        let (label, index) = self.tag();
        let mut hasher = SipHasher13::new_with_keys(0, 0);
        hasher.write_u64(run_seed);
        hasher.write(label);
        hasher.write_u64(index);
        hasher.finish()
    }

    /// Fresh generator positioned at the start of this stream.
    pub fn rng(self, run_seed: u64) -> RngHandle {
        StdRng::seed_from_u64(self.seed(run_seed))
    }
}
