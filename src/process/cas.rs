// src/process/cas.rs

use crate::sheet::CellValue;

const MIN_LEN: usize = 5;

/// Trim a CAS cell and apply the shape check: at least five characters and
/// exactly two hyphens. Anything else is treated as no identifier.
pub fn clean_cas(cell: &CellValue) -> Option<String> {
    if matches!(cell, CellValue::Empty) {
        return None;
    }
    let raw = cell.to_string();
    let cas = raw.trim();
    if cas.chars().count() < MIN_LEN || cas.matches('-').count() != 2 {
        return None;
    }
    Some(cas.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn accepts_and_trims_well_shaped_numbers() {
        assert_eq!(clean_cas(&text("64-17-5")), Some("64-17-5".to_string()));
        assert_eq!(clean_cas(&text("  7732-18-5\t")), Some("7732-18-5".to_string()));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(clean_cas(&CellValue::Empty), None);
        assert_eq!(clean_cas(&text("")), None);
        assert_eq!(clean_cas(&text("   ")), None);
        assert_eq!(clean_cas(&text("12345")), None);
        assert_eq!(clean_cas(&text("6417-5")), None);
        assert_eq!(clean_cas(&text("1-2-3-4")), None);
        assert_eq!(clean_cas(&text("1-2-")), None);
    }

    #[test]
    fn non_text_cells_go_through_the_same_check() {
        assert_eq!(clean_cas(&CellValue::Number(64175.0)), None);
        assert_eq!(clean_cas(&CellValue::Bool(true)), None);
    }

    #[test]
    fn no_checksum_validation() {
        assert_eq!(clean_cas(&text("00-00-0")), Some("00-00-0".to_string()));
    }
}
