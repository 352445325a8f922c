//! Boot entry model
//!
//! A [`BootOrderSequence`] is the firmware boot order as a list of
//! [`BootEntry`] values. Sequences are never edited in place: classification
//! and every reordering step build a new sequence, so the "before" state stays
//! available for reporting next to the "after" state.

use crate::error::ConfigError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Loader binary of systemd-boot on x86_64.
pub const SYSTEMD_EFI_FILENAME: &str = "systemd-bootx64.efi";

/// Loader binary of GRUB on x86_64.
pub const GRUB_EFI_FILENAME: &str = "grubx64.efi";

/// Semantic tag attached to an entry by the classifier.
///
/// Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    Active,
    Current,
    BootUuid,
    SystemdBoot,
    Grub,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Active => "active",
            Flag::Current => "current",
            Flag::BootUuid => "boot-uuid",
            Flag::SystemdBoot => "systemd-boot",
            Flag::Grub => "grub",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bootloader that must be tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bootloader {
    SystemdBoot,
    Grub,
}

impl Bootloader {
    pub const ALL: [Bootloader; 2] = [Bootloader::SystemdBoot, Bootloader::Grub];

    /// EFI binary name that identifies this bootloader in an entry.
    pub fn efi_filename(&self) -> &'static str {
        match self {
            Bootloader::SystemdBoot => SYSTEMD_EFI_FILENAME,
            Bootloader::Grub => GRUB_EFI_FILENAME,
        }
    }

    /// Flag the classifier sets on entries loading this bootloader.
    pub fn flag(&self) -> Flag {
        match self {
            Bootloader::SystemdBoot => Flag::SystemdBoot,
            Bootloader::Grub => Flag::Grub,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.flag().as_str()
    }
}

impl fmt::Display for Bootloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bootloader {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bootloader::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidBootloader(s.to_string()))
    }
}

/// One firmware boot menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootEntry {
    id: String,
    is_current: bool,
    is_active: bool,
    content: String,
    flags: BTreeSet<Flag>,
    /// Partition UUIDs found in `content`.
    partition_uuids: BTreeSet<String>,
}

impl BootEntry {
    /// Create an unclassified entry.
    pub fn new(
        id: impl Into<String>,
        is_current: bool,
        is_active: bool,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            is_current,
            is_active,
            content: content.into(),
            flags: BTreeSet::new(),
            partition_uuids: BTreeSet::new(),
        }
    }

    /// Copy of this entry carrying the given classification.
    pub fn with_flags(
        &self,
        flags: impl IntoIterator<Item = Flag>,
        partition_uuids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            flags: flags.into_iter().collect(),
            partition_uuids: partition_uuids.into_iter().collect(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn flags(&self) -> &BTreeSet<Flag> {
        &self.flags
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether the classifier matched this specific partition UUID.
    pub fn matches_partition(&self, uuid: &str) -> bool {
        self.partition_uuids.contains(uuid)
    }
}

impl fmt::Display for BootEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags: Vec<&str> = self.flags.iter().map(Flag::as_str).collect();
        write!(f, "{} [{}] {}", self.id, flags.join(", "), self.content)
    }
}

/// Ordered boot entries plus the id firmware last booted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootOrderSequence {
    current: String,
    entries: Vec<BootEntry>,
}

impl BootOrderSequence {
    pub fn new(current: impl Into<String>, entries: Vec<BootEntry>) -> Self {
        Self {
            current: current.into(),
            entries,
        }
    }

    /// Id reported as `BootCurrent`.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn entries(&self) -> &[BootEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry ids in order; the value committed as the new BootOrder.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// First entry, in current order, satisfying `pred`.
    pub fn find(&self, pred: impl Fn(&BootEntry) -> bool) -> Option<(usize, &BootEntry)> {
        self.entries.iter().enumerate().find(|(_, e)| pred(e))
    }

    /// New sequence with the same order and entries mapped through `f`.
    pub fn with_entries(&self, f: impl Fn(&BootEntry) -> BootEntry) -> Self {
        Self {
            current: self.current.clone(),
            entries: self.entries.iter().map(f).collect(),
        }
    }

    /// New sequence with the entry at `index` moved to the front.
    ///
    /// Relative order of all other entries is preserved.
    pub fn with_first(&self, index: usize) -> Self {
        let mut entries = self.entries.clone();
        if index < entries.len() {
            let entry = entries.remove(index);
            entries.insert(0, entry);
        }
        Self {
            current: self.current.clone(),
            entries,
        }
    }
}
