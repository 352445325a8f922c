//! Entry classification
//!
//! Annotates parsed entries with [`Flag`]s. Order, ids and content are left
//! alone; this step only attaches tags.

use crate::entry::{BootEntry, BootOrderSequence, Bootloader, Flag};
use crate::partition::Partitions;

/// Flags and matched partition UUIDs for one entry.
pub fn classify_entry(entry: &BootEntry, partitions: &Partitions) -> BootEntry {
    let mut flags = Vec::new();
    if entry.is_active() {
        flags.push(Flag::Active);
    }
    if entry.is_current() {
        flags.push(Flag::Current);
    }

    let uuids: Vec<String> = partitions
        .iter()
        .filter(|p| entry.content().contains(p.uuid.as_str()))
        .map(|p| p.uuid.clone())
        .collect();
    if !uuids.is_empty() {
        flags.push(Flag::BootUuid);
    }

    for bootloader in Bootloader::ALL {
        if entry.content().contains(bootloader.efi_filename()) {
            flags.push(bootloader.flag());
        }
    }

    entry.with_flags(flags, uuids)
}

/// Classify every entry of `seq`, returning a new sequence.
pub fn classify(seq: &BootOrderSequence, partitions: &Partitions) -> BootOrderSequence {
    seq.with_entries(|entry| classify_entry(entry, partitions))
}
