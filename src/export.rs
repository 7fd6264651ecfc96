//! CSV export of case records for administrators.

use std::collections::HashMap;
use std::io::Write;

use uuid::Uuid;

use crate::db::CaseRecord;
use crate::error::ExportError;

const HEADER: [&str; 15] = [
    "Número de Caso",
    "Fecha de Registro",
    "Solicitante",
    "Cédula Solicitante",
    "Involucrado",
    "Cédula Involucrado",
    "Lugar",
    "Tipo de Conflicto",
    "Bloque(s)",
    "Otro bloque",
    "Valor Estimado",
    "Estado",
    "Juez Asignado",
    "Prórroga",
    "Observaciones",
];

fn case_row(case: &CaseRecord, judge_names: &HashMap<Uuid, String>) -> Vec<String> {
    let judge = case
        .judge_id
        .and_then(|id| judge_names.get(&id).cloned())
        .unwrap_or_default();
    let blocks = case
        .location_blocks
        .iter()
        .map(|block| block.label())
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        case.case_number.clone(),
        case.date_registered.format("%d/%m/%Y %H:%M").to_string(),
        case.applicant_name.clone(),
        case.applicant_id.clone(),
        case.involved_name.clone(),
        case.involved_id.clone().unwrap_or_default(),
        case.location.clone(),
        case.conflict_type.label().to_string(),
        blocks,
        case.other_location_block.clone().unwrap_or_default(),
        case.estimated_value
            .map(|value| value.to_string())
            .unwrap_or_default(),
        case.status.label().to_string(),
        judge,
        if case.extension_granted { "Sí" } else { "No" }.to_string(),
        case.notes.clone().unwrap_or_default(),
    ]
}

/// Write the report: a header row, then one row per case in the given
/// order. `judge_names` maps judge ids to usernames; unmatched ids render
/// as an empty column.
pub fn write_cases_csv<W: Write>(
    writer: W,
    cases: &[CaseRecord],
    judge_names: &HashMap<Uuid, String>,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;
    for case in cases {
        csv_writer.write_record(case_row(case, judge_names))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::db::{CaseRecord, CaseStatus, ConflictType, LocationBlock, ResolutionMethod};

    use super::write_cases_csv;

    fn sample_case(judge_id: Uuid) -> CaseRecord {
        CaseRecord {
            id: Uuid::new_v4(),
            case_number: "JC-2026-08-0007".to_string(),
            date_registered: chrono::Utc
                .with_ymd_and_hms(2026, 8, 3, 14, 30, 0)
                .single()
                .expect("valid timestamp"),
            applicant_name: "Rosa Quishpe".to_string(),
            applicant_id: "1704567890".to_string(),
            applicant_phone: None,
            applicant_email: None,
            involved_name: "Pedro Armas".to_string(),
            involved_id: Some("1709876543".to_string()),
            conflict_description: "Linderos en disputa.".to_string(),
            location: "Sector La Esperanza".to_string(),
            conflict_type: ConflictType::Patrimonial,
            other_conflict_type: None,
            estimated_value: Some(dec!(350.00)),
            resolution_methods: vec![ResolutionMethod::Mediacion],
            other_resolution_method: None,
            location_blocks: vec![LocationBlock::Bloque2, LocationBlock::Bloque5],
            other_location_block: None,
            notes: Some("Primera audiencia pendiente.".to_string()),
            status: CaseStatus::EnTramite,
            extension_granted: true,
            judge_id: Some(judge_id),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn export_renders_header_and_formatted_row() {
        let judge_id = Uuid::new_v4();
        let mut judge_names = HashMap::new();
        judge_names.insert(judge_id, "jperez".to_string());

        let mut out = Vec::new();
        write_cases_csv(&mut out, &[sample_case(judge_id)], &judge_names).expect("export");

        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        let header = lines.next().expect("header line");
        assert!(header.starts_with("Número de Caso,Fecha de Registro"));

        let row = lines.next().expect("data line");
        assert!(row.starts_with("JC-2026-08-0007,03/08/2026 14:30,Rosa Quishpe"));
        assert!(row.contains("\"Bloque 2, Bloque 5\""));
        assert!(row.contains("350.00"));
        assert!(row.contains("En trámite"));
        assert!(row.contains("jperez"));
        assert!(row.contains("Sí"));
    }

    #[test]
    fn unknown_judge_renders_empty_column() {
        let mut out = Vec::new();
        write_cases_csv(&mut out, &[sample_case(Uuid::new_v4())], &HashMap::new())
            .expect("export");
        let text = String::from_utf8(out).expect("utf8");
        let row = text.lines().nth(1).expect("data line");
        assert!(row.contains(",En trámite,,Sí,"));
    }
}
