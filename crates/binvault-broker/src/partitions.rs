//! Write-disabled partition set.
//!
//! Configuration expresses blocked partitions as range strings ("7" or
//! "3-5"). They are merged once at startup into a sorted, deduplicated
//! ascending list; membership on the write path is a binary search.

use binvault_core::types::{PartitionId, PARTITION_MAX};

use crate::error::{BrokerError, Result};

/// Parses configured range strings into the sorted disabled-partition list.
///
/// Overlapping and adjacent ranges collapse; the result is strictly
/// ascending with no duplicates.
pub fn parse_disabled_ranges(specs: &[String]) -> Result<Vec<PartitionId>> {
    let mut partitions = Vec::new();
    for spec in specs {
        let (lo, hi) = parse_one(spec)?;
        for p in lo..=hi {
            partitions.push(p);
        }
    }
    partitions.sort_unstable();
    partitions.dedup();
    Ok(partitions)
}

fn parse_one(spec: &str) -> Result<(PartitionId, PartitionId)> {
    let invalid = |reason: &str| BrokerError::InvalidPartitionRange {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = spec.trim();
    let (lo, hi) = match trimmed.split_once('-') {
        Some((lo, hi)) => (
            lo.trim().parse::<PartitionId>().map_err(|_| invalid("bad lower bound"))?,
            hi.trim().parse::<PartitionId>().map_err(|_| invalid("bad upper bound"))?,
        ),
        None => {
            let p = trimmed
                .parse::<PartitionId>()
                .map_err(|_| invalid("not a partition number"))?;
            (p, p)
        }
    };
    if lo > hi {
        return Err(invalid("lower bound exceeds upper bound"));
    }
    if hi > PARTITION_MAX {
        return Err(invalid("exceeds maximum partition"));
    }
    Ok((lo, hi))
}

/// Tests membership in the sorted disabled list.
pub fn is_disabled(disabled: &[PartitionId], partition: PartitionId) -> bool {
    disabled.binary_search(&partition).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_values_and_ranges() {
        let disabled = parse_disabled_ranges(&specs(&["7", "3-5"])).expect("parse failed");
        assert_eq!(disabled, vec![3, 4, 5, 7]);
    }

    #[test]
    fn test_overlapping_ranges_deduplicated() {
        let disabled = parse_disabled_ranges(&specs(&["1-3", "2-4", "3"])).expect("parse failed");
        assert_eq!(disabled, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_adjacent_values_deduplicated() {
        let disabled = parse_disabled_ranges(&specs(&["0-1", "1-2"])).expect("parse failed");
        assert_eq!(disabled, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_config() {
        let disabled = parse_disabled_ranges(&[]).expect("parse failed");
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = parse_disabled_ranges(&specs(&["5-3"])).unwrap_err();
        assert!(matches!(err, BrokerError::InvalidPartitionRange { .. }));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = parse_disabled_ranges(&specs(&["1020-1030"])).unwrap_err();
        assert!(matches!(err, BrokerError::InvalidPartitionRange { .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = parse_disabled_ranges(&specs(&["three"])).unwrap_err();
        assert!(matches!(err, BrokerError::InvalidPartitionRange { .. }));
    }

    #[test]
    fn test_membership() {
        let disabled = parse_disabled_ranges(&specs(&["1-2"])).expect("parse failed");
        assert!(!is_disabled(&disabled, 0));
        assert!(is_disabled(&disabled, 1));
        assert!(is_disabled(&disabled, 2));
        assert!(!is_disabled(&disabled, 3));
    }

    #[test]
    fn test_membership_empty_set() {
        assert!(!is_disabled(&[], 0));
    }
}
