//! efibootmgr output parsing
//!
//! Reads the listing printed by `efibootmgr` with no arguments:
//!
//! ```text
//! BootCurrent: 0001
//! Timeout: 1 seconds
//! BootOrder: 0001,0000,0002
//! Boot0000* UEFI OS	HD(1,GPT,...)/File(\EFI\BOOT\BOOTX64.EFI)
//! Boot0001* Linux Boot Manager	HD(1,GPT,...)/File(\EFI\systemd\systemd-bootx64.efi)
//! Boot0002  PXE IPv4
//! ```
//!
//! Only the three line kinds above matter; anything else is ignored.

use crate::entry::{BootEntry, BootOrderSequence};
use crate::error::ParseError;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Compiled patterns for the efibootmgr listing.
pub struct ListingParser {
    current_re: Regex,
    order_re: Regex,
    entry_re: Regex,
}

impl ListingParser {
    pub fn new() -> Self {
        let current_re =
            Regex::new(r"(?m)BootCurrent:[ \t]*([0-9A-Fa-f]+)").expect("Invalid BootCurrent regex");
        let order_re =
            Regex::new(r"(?m)BootOrder:[ \t]*([0-9A-Fa-f,]+)").expect("Invalid BootOrder regex");
        let entry_re = Regex::new(r"(?m)^Boot([0-9A-Fa-f]+)(\*)?[ \t]+(.*?)[ \t\r]*$")
            .expect("Invalid boot entry regex");

        Self {
            current_re,
            order_re,
            entry_re,
        }
    }

    /// Parse efibootmgr output into a sequence in BootOrder order.
    pub fn parse(&self, text: &str) -> Result<BootOrderSequence, ParseError> {
        let current = self
            .current_re
            .captures(text)
            .map(|c| c[1].to_string())
            .ok_or(ParseError::MissingCurrentBoot)?;

        let order = self
            .order_re
            .captures(text)
            .map(|c| c[1].to_string())
            .ok_or(ParseError::MissingBootOrder)?;

        // first line wins when firmware lists an id twice
        let mut lines: HashMap<&str, (bool, &str)> = HashMap::new();
        for caps in self.entry_re.captures_iter(text) {
            let (Some(id), Some(content)) = (caps.get(1), caps.get(3)) else {
                continue;
            };
            lines
                .entry(id.as_str())
                .or_insert((caps.get(2).is_some(), content.as_str()));
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for id in order.split(',').filter(|id| !id.is_empty()) {
            if !seen.insert(id) {
                return Err(ParseError::DuplicateBootEntry(id.to_string()));
            }
            let (is_active, content) = lines
                .get(id)
                .copied()
                .ok_or_else(|| ParseError::BootEntryNotFound(id.to_string()))?;
            entries.push(BootEntry::new(id, id == current, is_active, content));
        }

        tracing::debug!(current = %current, order = %order, "parsed {} boot entries", entries.len());

        Ok(BootOrderSequence::new(current, entries))
    }
}

impl Default for ListingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse efibootmgr output with a freshly compiled [`ListingParser`].
pub fn parse_efibootmgr(text: &str) -> Result<BootOrderSequence, ParseError> {
    ListingParser::new().parse(text)
}

/// Render a sequence back into the efibootmgr listing grammar.
///
/// Feeding the result to [`parse_efibootmgr`] yields the same sequence
/// (flags aside, which are not part of the listing).
pub fn format_efibootmgr(seq: &BootOrderSequence) -> String {
    let mut out = format!("BootCurrent: {}\n", seq.current());
    out.push_str(&format!("BootOrder: {}\n", seq.ids().join(",")));
    for entry in seq.entries() {
        let mark = if entry.is_active() { "*" } else { " " };
        out.push_str(&format!("Boot{}{} {}\n", entry.id(), mark, entry.content()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const LISTING: &str = "\
BootCurrent: 0001
Timeout: 1 seconds
BootOrder: 0001,0000,0002
Boot0000* UEFI OS\tHD(1,GPT,aaaa-1111,0x800,0x100000)/File(\\EFI\\BOOT\\BOOTX64.EFI)
Boot0001* Linux Boot Manager\tHD(1,GPT,bbbb-2222,0x800,0x100000)/File(\\EFI\\systemd\\systemd-bootx64.efi)
Boot0002  PXE IPv4
Boot0003* Not in order
";

    #[test]
    fn test_parse_follows_boot_order() {
        let seq = parse_efibootmgr(LISTING).unwrap();
        assert_eq!(seq.current(), "0001");
        assert_eq!(seq.ids(), vec!["0001", "0000", "0002"]);

        let first = &seq.entries()[0];
        assert!(first.is_current());
        assert!(first.is_active());
        assert_eq!(
            first.content(),
            "Linux Boot Manager\tHD(1,GPT,bbbb-2222,0x800,0x100000)/File(\\EFI\\systemd\\systemd-bootx64.efi)"
        );

        let pxe = &seq.entries()[2];
        assert!(!pxe.is_active());
        assert!(!pxe.is_current());
        assert_eq!(pxe.content(), "PXE IPv4");
    }

    #[test]
    fn test_parse_entries_start_unflagged() {
        let seq = parse_efibootmgr(LISTING).unwrap();
        assert!(seq.entries().iter().all(|e| e.flags().is_empty()));
    }

    #[test]
    fn test_missing_boot_current() {
        let text = LISTING.replace("BootCurrent: 0001\n", "");
        assert_matches!(parse_efibootmgr(&text), Err(ParseError::MissingCurrentBoot));
        assert_eq!(
            parse_efibootmgr(&text).unwrap_err().to_string(),
            "No BootCurrent"
        );
    }

    #[test]
    fn test_missing_boot_order() {
        let text = LISTING.replace("BootOrder: 0001,0000,0002\n", "");
        assert_matches!(parse_efibootmgr(&text), Err(ParseError::MissingBootOrder));
    }

    #[test]
    fn test_missing_entry_line() {
        let text = LISTING.replace("BootOrder: 0001,0000,0002", "BootOrder: 0001,0004");
        assert_matches!(
            parse_efibootmgr(&text),
            Err(ParseError::BootEntryNotFound(id)) if id == "0004"
        );
    }

    #[test]
    fn test_duplicate_id_in_boot_order() {
        let text = LISTING.replace("BootOrder: 0001,0000,0002", "BootOrder: 0001,0000,0001");
        assert_matches!(
            parse_efibootmgr(&text),
            Err(ParseError::DuplicateBootEntry(id)) if id == "0001"
        );
    }

    #[test]
    fn test_entry_prefix_does_not_match_longer_id() {
        // Boot00010 must not satisfy a lookup for Boot0001
        let text = "BootCurrent: 0001\nBootOrder: 0001\nBoot00010* Other\n";
        assert_matches!(
            parse_efibootmgr(text),
            Err(ParseError::BootEntryNotFound(id)) if id == "0001"
        );
    }

    #[test]
    fn test_hex_ids() {
        let text = "BootCurrent: 000A\nBootOrder: 000A,0001\nBoot0001* One\nBoot000A* Ten\n";
        let seq = parse_efibootmgr(text).unwrap();
        assert_eq!(seq.ids(), vec!["000A", "0001"]);
        assert!(seq.entries()[0].is_current());
        assert_eq!(seq.entries()[0].content(), "Ten");
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = LISTING.replace('\n', "\r\n");
        let seq = parse_efibootmgr(&text).unwrap();
        assert_eq!(seq.ids(), vec!["0001", "0000", "0002"]);
        assert_eq!(seq.entries()[2].content(), "PXE IPv4");
    }

    #[test]
    fn test_trailing_comma_in_boot_order() {
        let text = LISTING.replace("BootOrder: 0001,0000,0002", "BootOrder: 0001,0000,");
        let seq = parse_efibootmgr(&text).unwrap();
        assert_eq!(seq.ids(), vec!["0001", "0000"]);
    }

    #[test]
    fn test_format_matches_listing_grammar() {
        let seq = parse_efibootmgr(LISTING).unwrap();
        let text = format_efibootmgr(&seq);
        assert!(text.starts_with("BootCurrent: 0001\nBootOrder: 0001,0000,0002\n"));
        assert!(text.contains("Boot0002  PXE IPv4\n"));
    }

    fn arb_sequence() -> impl Strategy<Value = BootOrderSequence> {
        prop::collection::btree_map(
            "[0-9A-F]{4}",
            (any::<bool>(), "[A-Za-z0-9(),./\\\\-]([A-Za-z0-9 (),./\\\\-]{0,30}[A-Za-z0-9(),./\\\\-])?"),
            1..8,
        )
        .prop_flat_map(|entries| {
            let entries: Vec<_> = entries.into_iter().collect();
            let len = entries.len();
            (Just(entries).prop_shuffle(), 0..len)
        })
        .prop_map(|(entries, current)| {
            let current_id = entries[current].0.clone();
            let entries = entries
                .into_iter()
                .map(|(id, (active, content))| {
                    let is_current = id == current_id;
                    BootEntry::new(id, is_current, active, content)
                })
                .collect();
            BootOrderSequence::new(current_id, entries)
        })
    }

    proptest! {
        #[test]
        fn round_trips_through_listing(seq in arb_sequence()) {
            let parsed = parse_efibootmgr(&format_efibootmgr(&seq)).unwrap();
            prop_assert_eq!(parsed, seq);
        }

        #[test]
        fn never_panics(text in any::<String>()) {
            let _ = parse_efibootmgr(&text);
        }
    }
}
