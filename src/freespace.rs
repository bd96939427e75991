//! Freespace: the disjoint, non-adjacent set of address intervals available
//! for patch placement (§4.4), and the round-robin candidate enumeration the
//! fitter draws on.

use std::collections::VecDeque;

use crate::range::{Gamut, Range};

/// A sorted, disjoint, non-adjacent set of half-open `[start, stop)` address
/// intervals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Freespace {
    ranges: Vec<(u64, u64)>,
}

impl Freespace {
    pub fn new() -> Self {
        Freespace { ranges: Vec::new() }
    }

    /// The current intervals, in ascending order, as `(start, stop)` pairs —
    /// the shape the freespace JSON file is written in.
    pub fn intervals(&self) -> &[(u64, u64)] {
        &self.ranges
    }

    fn merged_with(&self, start: u64, size: u64) -> Vec<(u64, u64)> {
        if size == 0 {
            return self.ranges.clone();
        }
        let (mut merged_start, mut merged_stop) = (start, start + size);
        let mut merged_written = false;
        let mut result = Vec::with_capacity(self.ranges.len() + 1);
        for &(a, b) in &self.ranges {
            if b < merged_start {
                result.push((a, b));
            } else if a > merged_stop {
                if !merged_written {
                    result.push((merged_start, merged_stop));
                    merged_written = true;
                }
                result.push((a, b));
            } else {
                merged_start = merged_start.min(a);
                merged_stop = merged_stop.max(b);
            }
        }
        if !merged_written {
            result.push((merged_start, merged_stop));
        }
        result
    }

    /// Functional counterpart of [`Freespace::add`]: returns a new
    /// `Freespace` with `[start, start+size)` merged in.
    pub fn including(&self, start: u64, size: u64) -> Freespace {
        Freespace {
            ranges: self.merged_with(start, size),
        }
    }

    /// Merges `[start, start+size)` into the set, coalescing with any
    /// overlapping or touching interval. A zero-size insert is a no-op.
    pub fn add(&mut self, start: u64, size: u64) {
        self.ranges = self.merged_with(start, size);
    }

    fn clipped_without(&self, start: u64, size: u64) -> Vec<(u64, u64)> {
        if size == 0 {
            return self.ranges.clone();
        }
        let (removed_start, removed_stop) = (start, start + size);
        let mut result = Vec::with_capacity(self.ranges.len());
        for &(a, b) in &self.ranges {
            if b <= removed_start || a >= removed_stop {
                result.push((a, b));
            } else {
                if a < removed_start {
                    result.push((a, removed_start));
                }
                if b > removed_stop {
                    result.push((removed_stop, b));
                }
            }
        }
        result
    }

    /// Functional counterpart of [`Freespace::remove`]: returns a new
    /// `Freespace` with `[start, start+size)` clipped out, splitting an
    /// interval into two residuals when the removed range falls strictly
    /// inside it.
    pub fn excluding(&self, start: u64, size: u64) -> Freespace {
        Freespace {
            ranges: self.clipped_without(start, size),
        }
    }

    /// Clips `[start, start+size)` out of every overlapping interval,
    /// in place.
    pub fn remove(&mut self, start: u64, size: u64) {
        self.ranges = self.clipped_without(start, size);
    }

    fn candidate_ranges(&self, size: usize, gamut: &Gamut) -> Vec<Range> {
        self.ranges
            .iter()
            .map(|&(a, b)| {
                if size == 0 {
                    // Zero-length patches don't consume freespace and are
                    // compatible with any address; per-interval placeholder
                    // of a single candidate avoids a vacuous search while
                    // still requiring at least one freespace interval to
                    // exist.
                    Range::new(0, 1, 1)
                } else {
                    let span = Range::new(a as i128, b as i128 - size as i128 + 1, 1);
                    gamut.filter(&span)
                }
            })
            .collect()
    }

    /// The candidate start addresses for a patch of `size` bytes under
    /// `gamut`, as a round-robin sequence over the per-interval ranges.
    pub fn candidates(&self, size: usize, gamut: &Gamut) -> Candidates {
        Candidates::new(self.candidate_ranges(size, gamut))
    }
}

/// An ordered sequence of candidate start addresses, drawn round-robin
/// across the intervals that contributed them (§4.4): one value from
/// interval 0, one from interval 1, ..., then back to 0, skipping any
/// interval once its range is exhausted.
pub struct Candidates {
    ranges: Vec<Range>,
}

impl Candidates {
    fn new(ranges: Vec<Range>) -> Self {
        Candidates { ranges }
    }

    pub fn len(&self) -> u128 {
        self.ranges.iter().map(Range::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> CandidatesIter {
        CandidatesIter {
            queue: self
                .ranges
                .iter()
                .map(|r| Box::new(r.iter()) as Box<dyn Iterator<Item = i128>>)
                .collect(),
        }
    }
}

/// Round-robins across the per-interval iterators: pull one value from the
/// front, rotate it to the back, and drop any iterator as soon as it's
/// exhausted rather than draining it before moving on.
pub struct CandidatesIter {
    queue: VecDeque<Box<dyn Iterator<Item = i128>>>,
}

impl Iterator for CandidatesIter {
    type Item = i128;

    fn next(&mut self) -> Option<i128> {
        while let Some(front) = self.queue.front_mut() {
            if let Some(v) = front.next() {
                self.queue.rotate_left(1);
                return Some(v);
            }
            self.queue.pop_front();
        }
        None
    }
}
