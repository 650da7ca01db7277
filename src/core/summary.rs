//! Distribution summaries
//!
//! Groups records by a discrete field (KYC status, contract status, role) and
//! counts members per group, for the distribution widgets on the dashboards.
//!
//! Records whose group field is missing, null or blank are not dropped
//! silently: they are counted in [`Summary::unassigned`], so that
//! `sum(groups.count) + unassigned == records.len()` always holds.

use serde::Serialize;

use crate::core::derive::fold;
use crate::types::Record;

/// Colors for well-known statuses
const STATUS_COLORS: [(&str, &str); 10] = [
    ("approved", "#22c55e"),
    ("active", "#22c55e"),
    ("signed", "#22c55e"),
    ("pending", "#f59e0b"),
    ("under review", "#f59e0b"),
    ("rejected", "#ef4444"),
    ("cancelled", "#ef4444"),
    ("canceled", "#ef4444"),
    ("expired", "#6b7280"),
    ("finished", "#3b82f6"),
];

/// Cycled for labels without a fixed color
const PALETTE: [&str; 6] = ["#6366f1", "#14b8a6", "#ec4899", "#84cc16", "#f97316", "#0ea5e9"];

/// One group in a distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// Group label as first seen in the data
    pub label: String,
    pub count: usize,
    /// Hex color used to draw the group
    pub color: String,
}

/// Result of [`summarize`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Groups in order of first appearance
    pub groups: Vec<GroupCount>,
    /// Records without a value for the group field
    pub unassigned: usize,
}

impl Summary {
    /// Total number of records that landed in a group
    pub fn assigned(&self) -> usize {
        self.groups.iter().map(|group| group.count).sum()
    }

    pub fn count_of(&self, label: &str) -> usize {
        let wanted = fold(label);
        self.groups
            .iter()
            .find(|group| fold(&group.label) == wanted)
            .map_or(0, |group| group.count)
    }
}

/// Group `records` by the display text of `group_key`
///
/// Labels are compared case- and accent-insensitively; the first spelling
/// seen is the one reported.
pub fn summarize(records: &[Record], group_key: &str) -> Summary {
    let mut summary = Summary::default();
    let mut folded_labels: Vec<String> = Vec::new();
    let mut palette_index = 0;

    for record in records {
        let label = record
            .get(group_key)
            .filter(|value| !value.is_null())
            .map(|value| value.to_string().trim().to_string())
            .filter(|label| !label.is_empty());

        let Some(label) = label else {
            summary.unassigned += 1;
            continue;
        };

        let folded = fold(&label);
        match folded_labels.iter().position(|known| *known == folded) {
            Some(index) => summary.groups[index].count += 1,
            None => {
                let color = match STATUS_COLORS.iter().find(|(status, _)| *status == folded) {
                    Some((_, color)) => color.to_string(),
                    None => {
                        let color = PALETTE[palette_index % PALETTE.len()];
                        palette_index += 1;
                        color.to_string()
                    }
                };
                folded_labels.push(folded);
                summary.groups.push(GroupCount {
                    label,
                    count: 1,
                    color,
                });
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn kyc(status: impl Into<Value>) -> Record {
        Record::new().with("status", status)
    }

    #[test]
    fn test_counts_partition_the_input() {
        let records = vec![kyc("pending"), kyc("approved"), kyc("Pending"), kyc("rejected")];
        let summary = summarize(&records, "status");

        assert_eq!(summary.groups.len(), 3);
        assert_eq!(summary.groups[0].label, "pending");
        assert_eq!(summary.groups[0].count, 2);
        assert_eq!(summary.assigned(), records.len());
        assert_eq!(summary.unassigned, 0);
    }

    #[test]
    fn test_null_and_blank_groups_are_reported_not_dropped() {
        let records = vec![kyc("approved"), kyc(Value::Null), kyc("  "), Record::new()];
        let summary = summarize(&records, "status");

        assert_eq!(summary.assigned(), 1);
        assert_eq!(summary.unassigned, 3);
        assert_eq!(summary.assigned() + summary.unassigned, records.len());
    }

    #[test]
    fn test_known_statuses_get_fixed_colors() {
        let records = vec![kyc("Approved"), kyc("rejected"), kyc("on hold"), kyc("archived")];
        let summary = summarize(&records, "status");

        assert_eq!(summary.groups[0].color, "#22c55e");
        assert_eq!(summary.groups[1].color, "#ef4444");
        assert_eq!(summary.groups[2].color, PALETTE[0]);
        assert_eq!(summary.groups[3].color, PALETTE[1]);
    }

    #[test]
    fn test_numeric_groups_use_display_text() {
        let records = vec![
            Record::new().with("term_months", 12),
            Record::new().with("term_months", "12"),
            Record::new().with("term_months", 24),
        ];
        let summary = summarize(&records, "term_months");

        assert_eq!(summary.count_of("12"), 2);
        assert_eq!(summary.count_of("24"), 1);
        assert_eq!(summary.count_of("36"), 0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(summarize(&[], "status"), Summary::default());
    }
}
