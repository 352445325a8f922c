//! Boot partition listing
//!
//! Input is the two-column `UUID MOUNTPOINT` text produced by the partition
//! listing utility, one partition per line.

use crate::error::ParseError;
use std::ops::Deref;

/// A mounted partition whose UUID may appear in boot entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRef {
    pub uuid: String,
    pub mount_point: String,
}

impl PartitionRef {
    pub fn new(uuid: impl Into<String>, mount_point: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            mount_point: mount_point.into(),
        }
    }
}

/// Partitions sorted ascending by mount point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitions(Vec<PartitionRef>);

impl Partitions {
    pub fn new(mut partitions: Vec<PartitionRef>) -> Self {
        partitions.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
        Self(partitions)
    }

    /// Parse listing text. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut partitions = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [uuid, mount_point] = fields.as_slice() else {
                return Err(ParseError::MalformedPartitionLine {
                    line: index + 1,
                    text: line.to_string(),
                });
            };
            partitions.push(PartitionRef::new(*uuid, *mount_point));
        }
        Ok(Self::new(partitions))
    }
}

impl Deref for Partitions {
    type Target = [PartitionRef];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_sorts_by_mount_point() {
        let text = "\
5e2b7c1a-0000-4000-8000-000000000002 /boot
8f1c9d3e-0000-4000-8000-000000000001 /
";
        let parts = Partitions::parse(text).unwrap();
        assert_eq!(
            parts.to_vec(),
            vec![
                PartitionRef::new("8f1c9d3e-0000-4000-8000-000000000001", "/"),
                PartitionRef::new("5e2b7c1a-0000-4000-8000-000000000002", "/boot"),
            ]
        );
    }

    #[test]
    fn test_parse_tolerates_blank_lines_and_padding() {
        let parts = Partitions::parse("\n  abcd\t /efi  \n\n").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], PartitionRef::new("abcd", "/efi"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(Partitions::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_single_column() {
        assert_matches!(
            Partitions::parse("abcd /boot\n/boot/efi\n"),
            Err(ParseError::MalformedPartitionLine { line: 2, text }) if text == "/boot/efi"
        );
    }

    #[test]
    fn test_parse_rejects_extra_columns() {
        assert_matches!(
            Partitions::parse("abcd /boot extra"),
            Err(ParseError::MalformedPartitionLine { line: 1, .. })
        );
    }

    #[test]
    fn test_new_sorts_lexicographically() {
        let parts = Partitions::new(vec![
            PartitionRef::new("c", "/efi"),
            PartitionRef::new("a", "/boot/efi"),
            PartitionRef::new("b", "/boot"),
        ]);
        let mounts: Vec<&str> = parts.iter().map(|p| p.mount_point.as_str()).collect();
        assert_eq!(mounts, vec!["/boot", "/boot/efi", "/efi"]);
    }
}
