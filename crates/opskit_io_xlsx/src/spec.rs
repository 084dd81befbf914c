//! Shared export specification models.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use polars::prelude::DataFrame;

use crate::conf::{
    C_COLOR_HIGHLIGHT_BG, C_COLOR_HIGHLIGHT_FONT, C_COLOR_THREE_SCALE_MAX, C_COLOR_THREE_SCALE_MID,
    C_COLOR_THREE_SCALE_MIN, C_COLOR_TWO_SCALE_MAX, C_COLOR_TWO_SCALE_MIN, C_NUM_FMT_CURRENCY,
    C_NUM_FMT_INTEGER, C_NUM_FMT_PERCENT, derive_decimal_num_format,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification converted to a writer format at write time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Normalized cell value during the write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnDirectives

/// Which extreme of a column the highlight directive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumHighlightTarget {
    /// Highlight the cell equal to the column maximum.
    #[default]
    Max,
    /// Highlight the cell equal to the column minimum.
    Min,
}

/// Parameters for a two-color gradient scale.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTwoColorScale {
    /// Color at the low end of the range.
    pub color_min: String,
    /// Color at the high end of the range.
    pub color_max: String,
    /// Explicit lower threshold; auto when `None`.
    pub value_min: Option<f64>,
    /// Explicit upper threshold; auto when `None`.
    pub value_max: Option<f64>,
}

impl Default for SpecTwoColorScale {
    fn default() -> Self {
        Self {
            color_min: C_COLOR_TWO_SCALE_MIN.to_string(),
            color_max: C_COLOR_TWO_SCALE_MAX.to_string(),
            value_min: None,
            value_max: None,
        }
    }
}

/// Parameters for a three-color gradient scale.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecThreeColorScale {
    /// Color at the low end of the range.
    pub color_min: String,
    /// Color at the midpoint.
    pub color_mid: String,
    /// Color at the high end of the range.
    pub color_max: String,
    /// Explicit lower threshold; auto when `None`.
    pub value_min: Option<f64>,
    /// Explicit midpoint value; 50th percentile when `None`.
    pub value_mid: Option<f64>,
    /// Explicit upper threshold; auto when `None`.
    pub value_max: Option<f64>,
}

impl Default for SpecThreeColorScale {
    fn default() -> Self {
        Self {
            color_min: C_COLOR_THREE_SCALE_MIN.to_string(),
            color_mid: C_COLOR_THREE_SCALE_MID.to_string(),
            color_max: C_COLOR_THREE_SCALE_MAX.to_string(),
            value_min: None,
            value_mid: None,
            value_max: None,
        }
    }
}

/// Parameters for the single-cell extreme highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecHighlightExtreme {
    /// Extreme to highlight.
    pub target: EnumHighlightTarget,
    /// Cell background color.
    pub bg_color: String,
    /// Cell font color.
    pub font_color: String,
}

impl Default for SpecHighlightExtreme {
    fn default() -> Self {
        Self {
            target: EnumHighlightTarget::Max,
            bg_color: C_COLOR_HIGHLIGHT_BG.to_string(),
            font_color: C_COLOR_HIGHLIGHT_FONT.to_string(),
        }
    }
}

/// One formatting instruction targeting one column.
///
/// Directives on the same column stack independently: a color scale and a
/// display mask render together, they are never merged into one record.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumColumnDirective {
    /// Linear gradient from `color_min` to `color_max`.
    TwoColorScale(SpecTwoColorScale),
    /// Gradient through minimum, midpoint and maximum colors.
    ThreeColorScale(SpecThreeColorScale),
    /// Highlight the single cell equal to the column extreme.
    HighlightExtreme(SpecHighlightExtreme),
    /// Thousands-separated integer display mask.
    Integer,
    /// Fixed-decimals display mask.
    Decimal {
        /// Number of fixed decimal places.
        n_decimals: usize,
    },
    /// Dollar-prefixed two-decimal display mask.
    Currency,
    /// Percent-suffixed display mask.
    Percent,
}

impl EnumColumnDirective {
    /// Resolve a symbolic directive keyword to its default-parameter form.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "two_color_scale" => Some(Self::TwoColorScale(SpecTwoColorScale::default())),
            "three_color_scale" => Some(Self::ThreeColorScale(SpecThreeColorScale::default())),
            "highlight_extreme" | "highlight" => {
                Some(Self::HighlightExtreme(SpecHighlightExtreme::default()))
            }
            "integer" | "int" => Some(Self::Integer),
            "decimal" | "float" => Some(Self::Decimal { n_decimals: 2 }),
            "currency" | "dollar" => Some(Self::Currency),
            "percent" => Some(Self::Percent),
            _ => None,
        }
    }

    /// Display mask for numeric display kinds; `None` for conditional kinds.
    pub fn num_format(&self) -> Option<String> {
        match self {
            Self::Integer => Some(C_NUM_FMT_INTEGER.to_string()),
            Self::Decimal { n_decimals } => Some(derive_decimal_num_format(*n_decimals)),
            Self::Currency => Some(C_NUM_FMT_CURRENCY.to_string()),
            Self::Percent => Some(C_NUM_FMT_PERCENT.to_string()),
            Self::TwoColorScale(_) | Self::ThreeColorScale(_) | Self::HighlightExtreme(_) => None,
        }
    }
}

/// Column name to directive-list mapping for one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecColumnFormatSpec {
    /// Stacked directives keyed by column name.
    pub directives_by_col: BTreeMap<String, Vec<EnumColumnDirective>>,
}

impl SpecColumnFormatSpec {
    /// Empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one directive to `col_name`'s stack.
    pub fn push(&mut self, col_name: &str, directive: EnumColumnDirective) -> &mut Self {
        self.directives_by_col
            .entry(col_name.to_string())
            .or_default()
            .push(directive);
        self
    }

    /// Append a symbolic directive; error on unknown keyword.
    pub fn push_keyword(&mut self, col_name: &str, keyword: &str) -> Result<&mut Self, String> {
        let directive = EnumColumnDirective::from_keyword(keyword)
            .ok_or_else(|| format!("Unknown format directive keyword: {keyword:?}"))?;
        Ok(self.push(col_name, directive))
    }

    /// True when no column has any directive.
    pub fn is_empty(&self) -> bool {
        self.directives_by_col.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BindingsAndOptions

/// Association of one frame with one destination sheet name.
#[derive(Debug, Clone)]
pub struct SpecSheetBinding {
    /// Source frame; read-only for the export flow.
    pub df: DataFrame,
    /// Destination sheet name (sanitized/uniquified at write time).
    pub sheet_name: String,
    /// Optional per-column directives for this sheet.
    pub format_spec: Option<SpecColumnFormatSpec>,
}

/// Writer-wide export options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportOptions {
    /// Output file name inside the resolved directory.
    pub filename: String,
    /// Output directory; acquired from the location provider when `None`.
    pub dir_out: Option<PathBuf>,
    /// Header row cell format.
    pub fmt_header: SpecCellFormat,
    /// Infer column widths from header and body content.
    pub if_autofit_columns: bool,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        Self {
            filename: "test.xlsx".to_string(),
            dir_out: None,
            fmt_header: crate::conf::derive_default_header_format(),
            if_autofit_columns: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-export call report.
///
/// This is the partial-success indicator of the export flow: write-time
/// failures are recorded here instead of propagating to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// Actual sheet names written to the workbook.
    pub sheets_written: Vec<String>,
    /// Sheet names skipped because their frame had zero rows.
    pub sheets_skipped_empty: Vec<String>,
    /// Directive column names with no match in their frame.
    pub cols_skipped: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Write-time failures swallowed by the orchestrator.
    pub errors: Vec<String>,
}

impl SpecExportReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Add a swallowed error message.
    pub fn error(&mut self, msg: impl AsRef<str>) {
        self.errors.push(msg.as_ref().to_string());
    }

    /// Number of swallowed errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} written={} skipped_empty={} cols_skipped={} errors={} warnings={}",
            self.sheets_written.len(),
            self.sheets_skipped_empty.len(),
            self.cols_skipped.len(),
            self.errors.len(),
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXPORT]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ErrorsInit

/// Save failure classification used by the lock-retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumSaveFailure {
    /// Destination is open elsewhere; eligible for retry.
    Locked(String),
    /// Any other save failure; swallowed and reported.
    Fatal(String),
}

/// "Top-level call failed" errors (input validation / setup stage).
///
/// Write-time failures never surface here; they land in
/// [`SpecExportReport::errors`].
#[derive(Debug)]
pub enum ExportSetupError {
    /// Frame and sheet-name sequences differ in length.
    LengthMismatch {
        /// Number of frames supplied.
        n_frames: usize,
        /// Number of sheet names supplied.
        n_sheet_names: usize,
    },
    /// The location provider declined to supply an output directory.
    NoOutputLocation,
}

impl fmt::Display for ExportSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                n_frames,
                n_sheet_names,
            } => write!(
                f,
                "Frame/sheet-name length mismatch: {n_frames} frames vs {n_sheet_names} names."
            ),
            Self::NoOutputLocation => {
                write!(f, "No output location supplied and provider returned none.")
            }
        }
    }
}

impl std::error::Error for ExportSetupError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_format_merge_right_side_wins() {
        let fmt_base = SpecCellFormat {
            bold: Some(true),
            font_size: Some(9),
            num_format: Some("#,##0".to_string()),
            ..Default::default()
        };
        let fmt_patch = SpecCellFormat {
            num_format: Some("$#,##0.00".to_string()),
            ..Default::default()
        };

        let fmt_merged = fmt_base.merge(&fmt_patch);
        assert_eq!(fmt_merged.bold, Some(true));
        assert_eq!(fmt_merged.font_size, Some(9));
        assert_eq!(fmt_merged.num_format, Some("$#,##0.00".to_string()));
    }

    #[test]
    fn directive_keywords_resolve_to_defaults() {
        assert_eq!(
            EnumColumnDirective::from_keyword("currency"),
            Some(EnumColumnDirective::Currency)
        );
        assert_eq!(
            EnumColumnDirective::from_keyword("Decimal"),
            Some(EnumColumnDirective::Decimal { n_decimals: 2 })
        );
        assert!(matches!(
            EnumColumnDirective::from_keyword("two_color_scale"),
            Some(EnumColumnDirective::TwoColorScale(_))
        ));
        assert_eq!(EnumColumnDirective::from_keyword("sparkline"), None);
    }

    #[test]
    fn display_directives_carry_masks_and_conditional_ones_do_not() {
        assert_eq!(
            EnumColumnDirective::Currency.num_format(),
            Some("$#,##0.00".to_string())
        );
        assert_eq!(
            EnumColumnDirective::Decimal { n_decimals: 3 }.num_format(),
            Some("#,##0.000".to_string())
        );
        assert_eq!(
            EnumColumnDirective::Percent.num_format(),
            Some("0.0%".to_string())
        );
        assert_eq!(
            EnumColumnDirective::TwoColorScale(SpecTwoColorScale::default()).num_format(),
            None
        );
    }

    #[test]
    fn format_spec_stacks_directives_per_column() {
        let mut format_spec = SpecColumnFormatSpec::new();
        format_spec
            .push("rev", EnumColumnDirective::Currency)
            .push_keyword("rev", "two_color_scale")
            .expect("known keyword");

        assert_eq!(format_spec.directives_by_col["rev"].len(), 2);
        assert!(format_spec.push_keyword("rev", "nope").is_err());
    }

    #[test]
    fn export_report_formats_summary_line() {
        let mut report = SpecExportReport::default();
        report.sheets_written.push("data".to_string());
        report.warn("w");
        report.error("e");

        assert_eq!(
            report.to_string(),
            "[EXPORT] written=1 skipped_empty=0 cols_skipped=0 errors=1 warnings=1"
        );
        assert_eq!(report.error_count(), 1);
    }
}
