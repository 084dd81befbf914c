//! Stateless helper utilities used by the export pipeline.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to a valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!("{c_name:?} x{} at indices {l_pos:?}", l_pos.len()))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Convert a zero-based column index to A1 column letters.
pub fn derive_column_letters(col_idx: usize) -> String {
    let mut n_value = col_idx;
    let mut l_letters = Vec::new();
    loop {
        l_letters.push((b'A' + (n_value % 26) as u8) as char);
        if n_value < 26 {
            break;
        }
        n_value = n_value / 26 - 1;
    }
    l_letters.iter().rev().collect()
}

/// Build an absolute single-column A1 range like `$B$2:$B$11`.
///
/// Rows are one-based A1 row numbers.
pub fn derive_abs_column_range(col_idx: usize, row_first: usize, row_last: usize) -> String {
    let c_letters = derive_column_letters(col_idx);
    format!("${c_letters}${row_first}:${c_letters}${row_last}")
}

/// Cast a zero-based row index to the sheet row number type.
pub fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

/// Cast a zero-based column index to the sheet column number type.
pub fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimate

/// Estimate displayed width units for one normalized cell value.
///
/// Used by autofit width inference; non-ASCII characters count wider.
pub fn estimate_display_width(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => {
            if n.fract() == 0.0 {
                (*n as i64).to_string().len()
            } else {
                format!("{n:.2}").len()
            }
        }
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_sheet_name_replaces_and_truncates() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(
            sanitize_sheet_name("x".repeat(40).as_str(), "_").len(),
            31
        );
    }

    #[test]
    fn validate_unique_columns_rejects_duplicates() {
        let l_ok = vec!["a".to_string(), "b".to_string()];
        assert!(validate_unique_columns(&l_ok).is_ok());

        let l_dup = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let err = validate_unique_columns(&l_dup).expect_err("duplicates must fail");
        assert!(err.contains("\"a\""));
    }

    #[test]
    fn column_letters_cover_single_and_multi_letter_ranges() {
        assert_eq!(derive_column_letters(0), "A");
        assert_eq!(derive_column_letters(25), "Z");
        assert_eq!(derive_column_letters(26), "AA");
        assert_eq!(derive_column_letters(27), "AB");
        assert_eq!(derive_column_letters(701), "ZZ");
        assert_eq!(derive_column_letters(702), "AAA");
    }

    #[test]
    fn index_casts_reject_out_of_range_values() {
        assert_eq!(cast_col_num(0), Ok(0));
        assert_eq!(cast_col_num(16_383), Ok(16_383));
        assert!(cast_col_num(usize::from(u16::MAX) + 1).is_err());
        assert!(cast_row_num(u32::MAX as usize + 1).is_err());
    }

    #[test]
    fn abs_column_range_is_a1_anchored() {
        assert_eq!(derive_abs_column_range(1, 2, 11), "$B$2:$B$11");
        assert_eq!(derive_abs_column_range(26, 2, 4), "$AA$2:$AA$4");
    }

    #[test]
    fn width_estimate_tracks_content() {
        assert_eq!(
            estimate_display_width(&EnumCellValue::String("abcd".to_string())),
            4
        );
        assert_eq!(estimate_display_width(&EnumCellValue::Number(1234.0)), 4);
        assert_eq!(estimate_display_width(&EnumCellValue::Number(12.345)), 5);
        assert_eq!(estimate_display_width(&EnumCellValue::None), 0);
    }
}
