//! EFI boot order repair
//!
//! Inspects the firmware boot entries reported by `efibootmgr` and computes a
//! boot order in which a chosen bootloader, loaded from the system's boot
//! partition, is tried first.
//!
//! # Pipeline
//!
//! - [`parser`]: efibootmgr listing to [`BootOrderSequence`]
//! - [`partition`]: `UUID MOUNTPOINT` listing to sorted [`Partitions`]
//! - [`classify`]: tag entries with [`Flag`]s
//! - [`reorder`]: bootloader pin, then substring pins
//! - [`driver`]: `inspect`, `dry-run` and `fix` on top of [`tools::BootTools`]
//!
//! # Example
//!
//! ```
//! use fix_efi_bootorder::{classify, parse_efibootmgr, Bootloader, Partitions, ReorderPlan};
//!
//! let listing = "\
//! BootCurrent: 0000
//! BootOrder: 0000,0001
//! Boot0000* UEFI OS\tHD(1,GPT,1111-aaaa)/File(\\EFI\\BOOT\\BOOTX64.EFI)
//! Boot0001* Linux Boot Manager\tHD(1,GPT,1111-aaaa)/File(\\EFI\\systemd\\systemd-bootx64.efi)
//! ";
//! let partitions = Partitions::parse("1111-aaaa /boot\n").unwrap();
//! let entries = classify(&parse_efibootmgr(listing).unwrap(), &partitions);
//!
//! let plan = ReorderPlan::new(Bootloader::SystemdBoot);
//! let result = plan.apply(&entries, &partitions).unwrap();
//! assert_eq!(result.sequence.ids(), vec!["0001", "0000"]);
//! ```

pub mod classify;
pub mod cli;
pub mod config;
pub mod driver;
pub mod entry;
pub mod error;
pub mod parser;
pub mod partition;
pub mod reorder;
pub mod tools;

pub use classify::classify;
pub use config::{Config, ConfigLoader};
pub use driver::Driver;
pub use entry::{BootEntry, BootOrderSequence, Bootloader, Flag};
pub use error::{ConfigError, Error, ParseError, Result, RuleViolation};
pub use parser::{format_efibootmgr, parse_efibootmgr, ListingParser};
pub use partition::{PartitionRef, Partitions};
pub use reorder::{MissingMatch, PinOutcome, ReorderPlan, Reordered};
pub use tools::{BootTools, SystemTools};
