//! Aggregate case statistics for the admin panel.
//!
//! Pure tallies over an already-filtered case list; the caller decides the
//! scope (all cases, a date range, one judge) via the listing filter.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::{CaseRecord, CaseStatus};

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: CaseStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseStatistics {
    pub total: usize,
    /// Every status, in workflow order, including zero counts.
    pub by_status: Vec<StatusCount>,
    /// Conflict types actually present, highest count first.
    pub by_conflict_type: Vec<LabelCount>,
    /// Block tags decoded from the multi-value column, one tally per
    /// appearance, highest count first.
    pub by_block: Vec<LabelCount>,
}

fn sorted_counts(tally: HashMap<&'static str, usize>) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = tally
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

pub fn case_statistics(cases: &[CaseRecord]) -> CaseStatistics {
    let by_status = CaseStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            label: status.label(),
            count: cases.iter().filter(|case| case.status == status).count(),
        })
        .collect();

    let mut conflict_tally: HashMap<&'static str, usize> = HashMap::new();
    for case in cases {
        *conflict_tally.entry(case.conflict_type.label()).or_default() += 1;
    }

    let mut block_tally: HashMap<&'static str, usize> = HashMap::new();
    for case in cases {
        for block in &case.location_blocks {
            *block_tally.entry(block.label()).or_default() += 1;
        }
    }

    CaseStatistics {
        total: cases.len(),
        by_status,
        by_conflict_type: sorted_counts(conflict_tally),
        by_block: sorted_counts(block_tally),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use crate::db::{CaseRecord, CaseStatus, ConflictType, LocationBlock};

    use super::{LabelCount, case_statistics};

    fn case(
        status: CaseStatus,
        conflict_type: ConflictType,
        blocks: Vec<LocationBlock>,
    ) -> CaseRecord {
        CaseRecord {
            id: Uuid::new_v4(),
            case_number: "JC-2026-08-0001".to_string(),
            date_registered: Utc::now(),
            applicant_name: "Solicitante".to_string(),
            applicant_id: "1700000000".to_string(),
            applicant_phone: None,
            applicant_email: None,
            involved_name: "Involucrado".to_string(),
            involved_id: None,
            conflict_description: "Descripción".to_string(),
            location: "Sector".to_string(),
            conflict_type,
            other_conflict_type: None,
            estimated_value: None,
            resolution_methods: vec![],
            other_resolution_method: None,
            location_blocks: blocks,
            other_location_block: None,
            notes: None,
            status,
            extension_granted: false,
            judge_id: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_input_yields_zero_counts_for_every_status() {
        let stats = case_statistics(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.by_status.len(), 4);
        assert!(stats.by_status.iter().all(|entry| entry.count == 0));
        assert!(stats.by_conflict_type.is_empty());
        assert!(stats.by_block.is_empty());
    }

    #[test]
    fn statuses_tally_in_workflow_order() {
        let cases = vec![
            case(CaseStatus::EnTramite, ConflictType::Vecinal, vec![]),
            case(CaseStatus::EnTramite, ConflictType::Vecinal, vec![]),
            case(CaseStatus::Resuelto, ConflictType::Individual, vec![]),
        ];
        let stats = case_statistics(&cases);
        assert_eq!(stats.total, 3);
        let counts: Vec<usize> = stats.by_status.iter().map(|entry| entry.count).collect();
        assert_eq!(counts, vec![0, 2, 1, 0]);
    }

    #[test]
    fn conflict_types_sort_by_count_descending() {
        let cases = vec![
            case(CaseStatus::Registrado, ConflictType::Patrimonial, vec![]),
            case(CaseStatus::Registrado, ConflictType::Vecinal, vec![]),
            case(CaseStatus::Registrado, ConflictType::Vecinal, vec![]),
        ];
        let stats = case_statistics(&cases);
        assert_eq!(stats.by_conflict_type[0].label, "Vecinal");
        assert_eq!(stats.by_conflict_type[0].count, 2);
        assert_eq!(stats.by_conflict_type[1].count, 1);
    }

    #[test]
    fn blocks_tally_each_appearance_across_cases() {
        let cases = vec![
            case(
                CaseStatus::Registrado,
                ConflictType::Vecinal,
                vec![LocationBlock::Bloque1, LocationBlock::Bloque3],
            ),
            case(
                CaseStatus::Registrado,
                ConflictType::Vecinal,
                vec![LocationBlock::Bloque3],
            ),
        ];
        let stats = case_statistics(&cases);
        assert_eq!(
            stats.by_block,
            vec![
                LabelCount {
                    label: "Bloque 3".to_string(),
                    count: 2
                },
                LabelCount {
                    label: "Bloque 1".to_string(),
                    count: 1
                },
            ]
        );
    }
}
