//! `opskit_io_xlsx` v1:
//! Rust-side XLSX export kernel for retail-ops reporting frames.
//!
//! Module layout:
//! - `conf`      : constants and default presets
//! - `spec`      : specs/models/options/report
//! - `util`      : pure helper functions
//! - `normalize` : column-label and dtype normalization
//! - `condfmt`   : column directives and conditional formats
//! - `writer`    : writer kernel and export orchestration
pub mod condfmt;
pub mod conf;
pub mod normalize;
pub mod spec;
pub mod util;
pub mod writer;

pub use condfmt::{apply_formatting, derive_column_num_format_overrides, parse_hex_color};
pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_decimal_num_format, derive_default_export_options, derive_default_header_format,
};
pub use normalize::{normalize_column_name, normalize_columns};
pub use spec::{
    EnumCellValue, EnumColumnDirective, EnumHighlightTarget, EnumSaveFailure, ExportSetupError,
    SpecCellFormat, SpecColumnFormatSpec, SpecExportOptions, SpecExportReport,
    SpecHighlightExtreme, SpecSheetBinding, SpecThreeColorScale, SpecTwoColorScale,
};
pub use util::{sanitize_sheet_name, validate_unique_columns};
pub use writer::{
    XlsxExportWriter, classify_save_error, export_to_excel, format_header, plan_column_formats,
    save_with_lock_retry,
};
