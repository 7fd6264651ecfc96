//! Case number formatting and parsing.
//!
//! Numbers look like `JC-2026-08-0042`: prefix, year, two-digit month, and
//! a four-digit sequence that restarts every month. Sequence allocation
//! itself happens in the storage layer (atomic per-month counter); this
//! module only renders and parses the format.

const PREFIX: &str = "JC";

/// Render a case number. Sequences past 9999 widen rather than truncate;
/// uniqueness wins over fixed width.
pub fn format_case_number(year: i32, month: u32, sequence: u32) -> String {
    format!("{PREFIX}-{year}-{month:02}-{sequence:04}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseNumberParts {
    pub year: i32,
    pub month: u32,
    pub sequence: u32,
}

/// Parse a case number back into its parts. Returns `None` for anything
/// that does not match the `JC-<year>-<month>-<seq>` shape.
pub fn parse_case_number(raw: &str) -> Option<CaseNumberParts> {
    let mut parts = raw.trim().split('-');
    if parts.next()? != PREFIX {
        return None;
    }
    let year: i32 = parts.next()?.parse().ok()?;
    let month_raw = parts.next()?;
    let month: u32 = month_raw.parse().ok()?;
    let sequence: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if month_raw.len() != 2 || !(1..=12).contains(&month) || sequence == 0 {
        return None;
    }
    Some(CaseNumberParts {
        year,
        month,
        sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::{CaseNumberParts, format_case_number, parse_case_number};

    #[test]
    fn format_pads_month_and_sequence() {
        assert_eq!(format_case_number(2026, 8, 1), "JC-2026-08-0001");
        assert_eq!(format_case_number(2026, 12, 742), "JC-2026-12-0742");
    }

    #[test]
    fn format_widens_past_four_digits() {
        assert_eq!(format_case_number(2026, 1, 10_000), "JC-2026-01-10000");
    }

    #[test]
    fn parse_round_trips() {
        let parts = parse_case_number("JC-2026-08-0042").expect("valid number");
        assert_eq!(
            parts,
            CaseNumberParts {
                year: 2026,
                month: 8,
                sequence: 42
            }
        );
        assert_eq!(
            format_case_number(parts.year, parts.month, parts.sequence),
            "JC-2026-08-0042"
        );
    }

    #[test]
    fn parse_rejects_malformed_numbers() {
        for bad in [
            "",
            "JC-2026-08",
            "JC-2026-13-0001",
            "JC-2026-8-0001",
            "XX-2026-08-0001",
            "JC-2026-08-0000",
            "JC-2026-08-0001-9",
            "JC-abcd-08-0001",
        ] {
            assert!(parse_case_number(bad).is_none(), "accepted '{bad}'");
        }
    }
}
