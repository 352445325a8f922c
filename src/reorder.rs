//! Boot order rewriting
//!
//! Two rules run in a fixed order, each feeding the next:
//!
//! 1. **Bootloader pin.** For every boot partition, in *reverse* mount point
//!    order, the first active entry that loads the target bootloader from that
//!    partition moves to the front. The partition with the smallest mount
//!    point is pinned last and therefore ends up first.
//! 2. **Substring pins.** For every configured substring, in listed order, the
//!    first active entry whose content contains it moves to the front. The
//!    last substring ends up first.
//!
//! Both rules only move entries; nothing is added, dropped or re-flagged.

use crate::entry::{BootOrderSequence, Bootloader, Flag};
use crate::error::RuleViolation;
use crate::partition::{PartitionRef, Partitions};
use std::fmt;
use tracing::{debug, info, warn};

/// What a substring pin does when no entry matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingMatch {
    /// Abort with [`RuleViolation::NoMatchingSubstringEntry`].
    #[default]
    Fail,
    /// Warn and leave the order unchanged.
    Skip,
}

/// Why an entry was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinReason {
    Bootloader {
        bootloader: Bootloader,
        partition: PartitionRef,
    },
    Substring(String),
}

/// Result of a single pin step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    AlreadyFirst { id: String, reason: PinReason },
    MovedToFirst { id: String, reason: PinReason },
    Skipped { substring: String },
}

impl PinOutcome {
    pub fn is_move(&self) -> bool {
        matches!(self, PinOutcome::MovedToFirst { .. })
    }
}

impl fmt::Display for PinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinOutcome::AlreadyFirst {
                id,
                reason: PinReason::Bootloader { bootloader, .. },
            } => write!(
                f,
                "Entry {} boots {} and is already the first entry",
                id, bootloader
            ),
            PinOutcome::MovedToFirst {
                id,
                reason:
                    PinReason::Bootloader {
                        bootloader,
                        partition,
                    },
            } => write!(
                f,
                "Making {} the first entry because it loads {} from the correct UUID ({}, {}).",
                id, bootloader, partition.uuid, partition.mount_point
            ),
            PinOutcome::AlreadyFirst {
                id,
                reason: PinReason::Substring(substring),
            } => write!(
                f,
                "Entry {} contains \"{}\" and is already the first entry",
                id, substring
            ),
            PinOutcome::MovedToFirst {
                id,
                reason: PinReason::Substring(substring),
            } => write!(
                f,
                "Making {} the first entry because it contains sub-string \"{}\"",
                id, substring
            ),
            PinOutcome::Skipped { substring } => write!(
                f,
                "No active entry with matching substr (\"{}\") found\ncontinue anyway.",
                substring
            ),
        }
    }
}

/// A reordered sequence and the steps that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reordered {
    pub sequence: BootOrderSequence,
    pub outcomes: Vec<PinOutcome>,
}

impl Reordered {
    /// Whether any step changed the order.
    pub fn moved(&self) -> bool {
        self.outcomes.iter().any(PinOutcome::is_move)
    }
}

/// Move the entry at `index` to the front, reporting which happened.
fn pin_first(
    seq: &BootOrderSequence,
    index: usize,
    reason: PinReason,
) -> (BootOrderSequence, PinOutcome) {
    let id = seq.entries()[index].id().to_string();
    if index == 0 {
        (seq.clone(), PinOutcome::AlreadyFirst { id, reason })
    } else {
        (seq.with_first(index), PinOutcome::MovedToFirst { id, reason })
    }
}

/// Rule A: pin the bootloader entry of each boot partition.
pub fn pin_bootloader(
    seq: &BootOrderSequence,
    partitions: &Partitions,
    bootloader: Bootloader,
) -> Result<Reordered, RuleViolation> {
    if partitions.is_empty() {
        return Err(RuleViolation::NoBootPartitions);
    }

    let mut sequence = seq.clone();
    let mut outcomes = Vec::with_capacity(partitions.len());

    for partition in partitions.iter().rev() {
        let (index, _) = sequence
            .find(|e| {
                e.has_flag(Flag::Active)
                    && e.has_flag(Flag::BootUuid)
                    && e.matches_partition(&partition.uuid)
                    && e.has_flag(bootloader.flag())
            })
            .ok_or_else(|| RuleViolation::NoMatchingBootloaderEntry {
                uuid: partition.uuid.clone(),
                mount_point: partition.mount_point.clone(),
                bootloader: bootloader.to_string(),
            })?;

        let reason = PinReason::Bootloader {
            bootloader,
            partition: partition.clone(),
        };
        let (next, outcome) = pin_first(&sequence, index, reason);
        info!("{}", outcome);
        sequence = next;
        outcomes.push(outcome);
    }

    Ok(Reordered { sequence, outcomes })
}

/// Rule B: pin the first active entry containing each substring.
pub fn pin_substrings<S: AsRef<str>>(
    seq: &BootOrderSequence,
    substrings: &[S],
    missing: MissingMatch,
) -> Result<Reordered, RuleViolation> {
    let mut sequence = seq.clone();
    let mut outcomes = Vec::with_capacity(substrings.len());

    for substring in substrings.iter().map(AsRef::as_ref) {
        let found = sequence.find(|e| e.has_flag(Flag::Active) && e.content().contains(substring));

        let Some((index, _)) = found else {
            match missing {
                MissingMatch::Fail => {
                    return Err(RuleViolation::NoMatchingSubstringEntry(substring.to_string()))
                }
                MissingMatch::Skip => {
                    warn!(substring, "no active entry contains substring, skipping");
                    outcomes.push(PinOutcome::Skipped {
                        substring: substring.to_string(),
                    });
                    continue;
                }
            }
        };

        let reason = PinReason::Substring(substring.to_string());
        let (next, outcome) = pin_first(&sequence, index, reason);
        info!("{}", outcome);
        sequence = next;
        outcomes.push(outcome);
    }

    Ok(Reordered { sequence, outcomes })
}

/// Parameters for a full reorder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    pub bootloader: Bootloader,
    pub first: Vec<String>,
    pub missing_first: MissingMatch,
}

impl ReorderPlan {
    pub fn new(bootloader: Bootloader) -> Self {
        Self {
            bootloader,
            first: Vec::new(),
            missing_first: MissingMatch::Fail,
        }
    }

    pub fn first(mut self, first: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.first = first.into_iter().map(Into::into).collect();
        self
    }

    pub fn missing_first(mut self, missing: MissingMatch) -> Self {
        self.missing_first = missing;
        self
    }

    /// Apply the bootloader pin, then the substring pins.
    pub fn apply(
        &self,
        seq: &BootOrderSequence,
        partitions: &Partitions,
    ) -> Result<Reordered, RuleViolation> {
        let pinned = pin_bootloader(seq, partitions, self.bootloader)?;
        let first = pin_substrings(&pinned.sequence, &self.first, self.missing_first)?;

        let mut outcomes = pinned.outcomes;
        outcomes.extend(first.outcomes);
        debug!(order = ?first.sequence.ids(), "reorder complete");

        Ok(Reordered {
            sequence: first.sequence,
            outcomes,
        })
    }
}
