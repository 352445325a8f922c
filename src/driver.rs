//! Inspect, dry-run and fix
//!
//! Each command fetches the partition list and the efibootmgr listing once,
//! then runs parse, classify and (for dry-run and fix) reorder. Listings and
//! pin moves go to `out`; skipped optional pins are reported on `err`. Only
//! [`Driver::fix`] writes to firmware, once, after every rule succeeded.

use crate::classify::classify;
use crate::config::Config;
use crate::entry::BootOrderSequence;
use crate::parser::ListingParser;
use crate::partition::Partitions;
use crate::reorder::{PinOutcome, Reordered};
use crate::tools::BootTools;
use crate::Result;
use console::style;
use std::io::Write;
use tracing::{debug, info};

/// Runs the commands against a [`BootTools`] implementation.
pub struct Driver<'a, T: BootTools> {
    tools: &'a T,
    config: &'a Config,
    parser: ListingParser,
}

impl<'a, T: BootTools> Driver<'a, T> {
    pub fn new(tools: &'a T, config: &'a Config) -> Self {
        Self {
            tools,
            config,
            parser: ListingParser::new(),
        }
    }

    /// Fetch and classify the current boot entries.
    pub fn classified(&self) -> Result<(BootOrderSequence, Partitions)> {
        let partitions = Partitions::parse(&self.tools.boot_partitions()?)?;
        debug!(?partitions, "boot partitions");

        let listing = self.tools.efibootmgr(&[])?;
        let parsed = self.parser.parse(&listing)?;
        Ok((classify(&parsed, &partitions), partitions))
    }

    /// Print every entry with its flags.
    pub fn inspect(&self, out: &mut impl Write) -> Result<BootOrderSequence> {
        let (entries, _) = self.classified()?;
        show(out, &entries)?;
        Ok(entries)
    }

    /// Compute the new order and print it next to the current one.
    pub fn dry_run(&self, out: &mut impl Write, err: &mut impl Write) -> Result<Reordered> {
        // validate before touching any external tool
        let plan = self.config.reorder_plan()?;

        let (entries, partitions) = self.classified()?;
        writeln!(out, "{}", style("Before:").bold())?;
        show(out, &entries)?;
        writeln!(out)?;

        let reordered = plan.apply(&entries, &partitions)?;
        for outcome in &reordered.outcomes {
            match outcome {
                PinOutcome::Skipped { .. } => writeln!(err, "{}", outcome)?,
                _ => writeln!(out, "{}", outcome)?,
            }
        }

        writeln!(out)?;
        writeln!(out, "{}", style("After:").bold())?;
        show(out, &reordered.sequence)?;
        Ok(reordered)
    }

    /// Dry-run, then commit the new order.
    pub fn fix(&self, out: &mut impl Write, err: &mut impl Write) -> Result<Vec<String>> {
        let reordered = self.dry_run(out, err)?;
        let order = reordered.sequence.ids();

        writeln!(out, "new order: {}", order.join(","))?;
        out.flush()?;

        self.tools.set_boot_order(&order)?;
        info!(order = %order.join(","), "boot order committed");
        Ok(order)
    }
}

/// Print one `<id> [<flags>] <content>` line per entry.
pub fn show(out: &mut impl Write, entries: &BootOrderSequence) -> std::io::Result<()> {
    for entry in entries.entries() {
        writeln!(out, "{}", entry)?;
    }
    Ok(())
}
