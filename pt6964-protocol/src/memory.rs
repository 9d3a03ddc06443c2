//! Display memory model and address-run diffing
//!
//! The chip holds 14 bytes of display RAM. A partial update writes only
//! the bytes that changed, grouped into runs: each run is one address-set
//! command followed by consecutive data bytes that rely on the chip's
//! address auto-increment.

use core::ops::Range;

use heapless::Vec;

/// Size of the chip's display RAM in bytes
pub const MEMORY_SIZE: usize = 14;

/// Upper bound on runs in one diff (every other byte changed)
pub const MAX_RUNS: usize = MEMORY_SIZE / 2;

/// One byte per addressable RAM location; index 0 is address 0
pub type DisplayMemory = [u8; MEMORY_SIZE];

/// Runs produced by one diff, in address order
pub type Runs = Vec<Run, MAX_RUNS>;

/// Contiguous span of RAM written under one address-set command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Run {
    /// First address of the run
    pub start: u8,
    /// Number of bytes in the run
    pub len: u8,
}

impl Run {
    /// The whole display memory, starting at address 0
    pub const FULL: Self = Self {
        start: 0,
        len: MEMORY_SIZE as u8,
    };

    /// Memory indices covered by this run
    pub fn range(&self) -> Range<usize> {
        let start = usize::from(self.start);
        start..start + usize::from(self.len)
    }

    /// Bytes of `memory` covered by this run
    ///
    /// Indices past the end of memory are clipped.
    pub fn bytes<'a>(&self, memory: &'a DisplayMemory) -> &'a [u8] {
        let range = self.range();
        let end = range.end.min(MEMORY_SIZE);
        memory.get(range.start..end).unwrap_or(&[])
    }
}

/// Compute the runs of bytes in `new` that differ from `old`
///
/// Runs are maximal: two runs are always separated by at least one
/// unchanged byte. Identical images produce no runs.
pub fn changed_runs(old: &DisplayMemory, new: &DisplayMemory) -> Runs {
    let mut runs = Runs::new();
    let mut open: Option<Run> = None;

    for (index, (before, after)) in old.iter().zip(new.iter()).enumerate() {
        if before == after {
            if let Some(run) = open.take() {
                push_run(&mut runs, run);
            }
            continue;
        }

        match open.as_mut() {
            Some(run) => run.len += 1,
            None => {
                open = Some(Run {
                    start: index as u8,
                    len: 1,
                })
            }
        }
    }

    if let Some(run) = open {
        push_run(&mut runs, run);
    }
    runs
}

// Runs are separated by at least one unchanged byte, so MEMORY_SIZE bytes
// never hold more than MAX_RUNS of them.
fn push_run(runs: &mut Runs, run: Run) {
    let pushed = runs.push(run);
    debug_assert!(pushed.is_ok(), "more than {MAX_RUNS} runs");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identical_images_have_no_runs() {
        let memory = [0x5Au8; MEMORY_SIZE];
        assert!(changed_runs(&memory, &memory).is_empty());
    }

    #[test]
    fn test_two_runs() {
        let old = [0u8; MEMORY_SIZE];
        let mut new = old;
        new[3] = 0x01;
        new[4] = 0x02;
        new[9] = 0x03;

        let runs = changed_runs(&old, &new);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], Run { start: 3, len: 2 });
        assert_eq!(runs[1], Run { start: 9, len: 1 });
        assert_eq!(runs[0].bytes(&new), &[0x01, 0x02]);
    }

    #[test]
    fn test_run_reaching_last_address() {
        let old = [0u8; MEMORY_SIZE];
        let mut new = old;
        new[12] = 1;
        new[13] = 1;

        let runs = changed_runs(&old, &new);
        assert_eq!(runs.as_slice(), &[Run { start: 12, len: 2 }]);
    }

    #[test]
    fn test_everything_changed_is_one_run() {
        let old = [0u8; MEMORY_SIZE];
        let new = [0xFFu8; MEMORY_SIZE];
        assert_eq!(changed_runs(&old, &new).as_slice(), &[Run::FULL]);
        assert_eq!(Run::FULL.range(), 0..MEMORY_SIZE);
    }

    #[test]
    fn test_alternating_changes_fill_run_capacity() {
        let old = [0u8; MEMORY_SIZE];
        let mut new = old;
        for i in (0..MEMORY_SIZE).step_by(2) {
            new[i] = 1;
        }
        let runs = changed_runs(&old, &new);
        assert_eq!(runs.len(), MAX_RUNS);
        assert!(runs.iter().all(|r| r.len == 1));
    }

    proptest! {
        #[test]
        fn prop_runs_cover_exactly_changed_bytes(
            old in prop::array::uniform14(0u8..4),
            new in prop::array::uniform14(0u8..4),
        ) {
            let runs = changed_runs(&old, &new);
            let mut covered = [false; MEMORY_SIZE];
            for run in &runs {
                for i in run.range() {
                    prop_assert!(!covered[i], "runs overlap at {}", i);
                    covered[i] = true;
                }
            }
            for i in 0..MEMORY_SIZE {
                prop_assert_eq!(covered[i], old[i] != new[i]);
            }
        }

        #[test]
        fn prop_runs_are_maximal_and_ordered(
            old in prop::array::uniform14(0u8..4),
            new in prop::array::uniform14(0u8..4),
        ) {
            let runs = changed_runs(&old, &new);
            for pair in runs.windows(2) {
                // A gap of at least one unchanged byte separates runs
                prop_assert!(pair[0].range().end < usize::from(pair[1].start));
            }
        }
    }
}
