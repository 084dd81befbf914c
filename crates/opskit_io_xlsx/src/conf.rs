//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecExportOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Ordered substitution table applied to raw column labels.
///
/// Applied after trim and before lower-casing; every pair is applied
/// exactly once.
pub const TUP_COLUMN_NAME_SUBSTITUTIONS: [(&str, &str); 10] = [
    (" ", "_"),
    ("-", "_"),
    ("?", ""),
    (",", ""),
    (".", ""),
    ("/", "_"),
    ("(", ""),
    (")", ""),
    ("$", "dollar"),
    ("%", "percent"),
];

/// Regex for a leading digit followed by any second character.
pub const R_LEADING_DIGIT_PAIR: &str = "^([0-9].)";

/// Default minimum color for the two-color scale (white).
pub const C_COLOR_TWO_SCALE_MIN: &str = "#FFFFFF";
/// Default maximum color for the two-color scale (green).
pub const C_COLOR_TWO_SCALE_MAX: &str = "#63BE7B";

/// Default minimum color for the three-color scale (red).
pub const C_COLOR_THREE_SCALE_MIN: &str = "#F8696B";
/// Default midpoint color for the three-color scale (yellow).
pub const C_COLOR_THREE_SCALE_MID: &str = "#FFEB84";
/// Default maximum color for the three-color scale (green).
pub const C_COLOR_THREE_SCALE_MAX: &str = "#63BE7B";

/// Default highlight-extreme background color.
pub const C_COLOR_HIGHLIGHT_BG: &str = "#FFC7CE";
/// Default highlight-extreme font color.
pub const C_COLOR_HIGHLIGHT_FONT: &str = "#9C0006";

/// Integer display mask (thousands separator, no decimals).
pub const C_NUM_FMT_INTEGER: &str = "#,##0";
/// Currency display mask (dollar prefix, two decimals).
pub const C_NUM_FMT_CURRENCY: &str = "$#,##0.00";
/// Percent display mask (one decimal, percent suffix).
pub const C_NUM_FMT_PERCENT: &str = "0.0%";

/// Minimum autofit column width.
pub const N_WIDTH_CELL_MIN: usize = 8;
/// Maximum autofit column width.
pub const N_WIDTH_CELL_MAX: usize = 60;
/// Padding added to inferred column widths.
pub const N_WIDTH_CELL_PADDING: usize = 2;

/// Build the decimal display mask for `n_decimals` fixed places.
pub fn derive_decimal_num_format(n_decimals: usize) -> String {
    if n_decimals == 0 {
        return C_NUM_FMT_INTEGER.to_string();
    }
    format!("{}.{}", C_NUM_FMT_INTEGER, "0".repeat(n_decimals))
}

/// Build the default header cell format (bold, wrapped, vertically centered).
pub fn derive_default_header_format() -> SpecCellFormat {
    SpecCellFormat {
        bold: Some(true),
        text_wrap: Some(true),
        valign: Some("vcenter".to_string()),
        font_size: Some(9),
        ..Default::default()
    }
}

/// Build default export options.
pub fn derive_default_export_options() -> SpecExportOptions {
    SpecExportOptions::default()
}

#[cfg(test)]
mod tests {
    use super::derive_decimal_num_format;

    #[test]
    fn decimal_num_format_scales_with_places() {
        assert_eq!(derive_decimal_num_format(0), "#,##0");
        assert_eq!(derive_decimal_num_format(2), "#,##0.00");
        assert_eq!(derive_decimal_num_format(4), "#,##0.0000");
    }
}
