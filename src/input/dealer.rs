//! Epoch-bounded input sequencing.

use super::Inputs;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// How the dealer picks the next input within an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DealOrder {
    /// Uniformly at random from what is left of the epoch.
    #[default]
    Shuffled,
    /// In the order of the input array.
    Sequential,
}

/// Deals every input exactly once per epoch for a fixed number of epochs.
///
/// The dealer yields indices into the shared input array rather than the
/// vectors themselves so callers can borrow the input they need.
#[derive(Debug, Clone)]
pub struct Dealer {
    inputs: Inputs,
    pending: Vec<usize>,
    cursor: usize,
    // pending[cursor..] is ascending
    in_order: bool,
    remaining_epochs: usize,
    epochs: usize,
    order: DealOrder,
    rng: ChaCha8Rng,
}

impl Dealer {
    /// Creates a dealer. `seed` only matters for [`DealOrder::Shuffled`].
    pub fn new(inputs: Inputs, epochs: usize, order: DealOrder, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let remaining_epochs = if inputs.is_empty() { 0 } else { epochs };
        let mut dealer = Self {
            inputs,
            pending: Vec::new(),
            cursor: 0,
            in_order: true,
            remaining_epochs,
            epochs,
            order,
            rng,
        };
        dealer.refill();
        dealer
    }

    /// The shared inputs.
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Draws the next input using the configured order.
    pub fn next(&mut self) -> Option<usize> {
        match self.order {
            DealOrder::Shuffled => self.next_shuffled(),
            DealOrder::Sequential => self.next_sequential(),
        }
    }

    /// Draws a random input from the current epoch.
    pub fn next_shuffled(&mut self) -> Option<usize> {
        if !self.has_next() {
            return None;
        }
        let live = self.pending.len() - self.cursor;
        let pick = self.cursor + self.rng.gen_range(0..live);
        self.pending.swap(self.cursor, pick);
        self.in_order = false;
        self.take()
    }

    /// Draws the next input of the current epoch in array order.
    ///
    /// Mixing this with [`Dealer::next_shuffled`] inside one epoch is
    /// allowed; it takes the first input not yet dealt.
    pub fn next_sequential(&mut self) -> Option<usize> {
        if !self.has_next() {
            return None;
        }
        if !self.in_order {
            if let Some(first) = (self.cursor..self.pending.len()).min_by_key(|&i| self.pending[i]) {
                self.pending.swap(self.cursor, first);
            }
        }
        self.take()
    }

    /// True while epochs remain.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.remaining_epochs > 0
    }

    /// Epochs not yet completed, counting the one in progress.
    #[inline]
    pub fn remaining_epochs(&self) -> usize {
        self.remaining_epochs
    }

    /// Total number of draws over the whole run (`|inputs| × epochs`).
    #[inline]
    pub fn total_draws(&self) -> usize {
        self.inputs.len() * self.epochs
    }

    fn take(&mut self) -> Option<usize> {
        let index = self.pending[self.cursor];
        self.cursor += 1;
        if self.cursor == self.pending.len() {
            self.remaining_epochs -= 1;
            if self.remaining_epochs > 0 {
                self.refill();
            }
        }
        Some(index)
    }

    fn refill(&mut self) {
        self.pending.clear();
        self.pending.extend(0..self.inputs.len());
        self.cursor = 0;
        self.in_order = true;
    }
}
