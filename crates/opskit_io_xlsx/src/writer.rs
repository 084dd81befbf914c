//! XLSX export writer kernel: sheet writing, lock-aware save, orchestration.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, error, info, warn};
use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};

use crate::condfmt::{apply_formatting, derive_column_num_format_overrides};
use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_WIDTH_CELL_MAX,
    N_WIDTH_CELL_MIN, N_WIDTH_CELL_PADDING,
};
use crate::spec::{
    EnumCellValue, EnumSaveFailure, ExportSetupError, SpecCellFormat, SpecColumnFormatSpec,
    SpecExportOptions, SpecExportReport, SpecSheetBinding,
};
use crate::util::{
    cast_col_num, cast_row_num, estimate_display_width, sanitize_sheet_name,
    validate_unique_columns,
};

////////////////////////////////////////////////////////////////////////////////
// #region ExportWriter

/// Stateful workbook writer for the export flow.
///
/// Sheets accumulate in memory; the workbook is handed back via
/// [`Self::finish`] and saved by the orchestrator's retry loop.
pub struct XlsxExportWriter {
    workbook: Workbook,
    fmt_header: SpecCellFormat,
    if_autofit_columns: bool,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecExportReport,
}

impl XlsxExportWriter {
    /// Create a writer bound to the export options' presets.
    pub fn new(options: &SpecExportOptions) -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_header: options.fmt_header.clone(),
            if_autofit_columns: options.if_autofit_columns,
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecExportReport::default(),
        }
    }

    /// Immutable view of the accumulated report.
    pub fn report(&self) -> &SpecExportReport {
        &self.report
    }

    /// Consume the writer, returning the workbook and the report.
    pub fn finish(self) -> (Workbook, SpecExportReport) {
        (self.workbook, self.report)
    }

    /// Write one frame as one worksheet.
    ///
    /// Zero-row frames are skipped and recorded, not errors. Returned errors
    /// are per-sheet write failures; the orchestrator records them on the
    /// report and keeps going.
    pub fn write_sheet(&mut self, binding: &SpecSheetBinding) -> Result<(), String> {
        let df = &binding.df;
        let n_height = df.height();
        let n_width = df.width();

        if n_height == 0 {
            debug!("Skipping sheet {:?}: frame has no rows.", binding.sheet_name);
            self.report
                .sheets_skipped_empty
                .push(binding.sheet_name.clone());
            return Ok(());
        }
        if n_height + 1 > N_NROWS_EXCEL_MAX {
            return Err(format!(
                "Sheet {:?} exceeds the Excel row limit: {n_height} data rows.",
                binding.sheet_name
            ));
        }
        if n_width > N_NCOLS_EXCEL_MAX {
            return Err(format!(
                "Sheet {:?} exceeds the Excel column limit: {n_width} columns.",
                binding.sheet_name
            ));
        }

        let l_colnames: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames)?;

        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(&binding.sheet_name, "_"));

        let l_fmt_data_by_col: Vec<Format> =
            plan_column_formats(&l_colnames, binding.format_spec.as_ref())
                .iter()
                .map(derive_rust_xlsx_format)
                .collect();
        let fmt_header = derive_rust_xlsx_format(&self.fmt_header);

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name_unique)
            .map_err(derive_xlsx_error_text)?;

        format_header(worksheet, &l_colnames, &fmt_header, n_height)?;

        let mut l_width_by_col = vec![0usize; n_width];
        if self.if_autofit_columns {
            for (n_idx_col, c_name) in l_colnames.iter().enumerate() {
                l_width_by_col[n_idx_col] =
                    estimate_display_width(&EnumCellValue::String(c_name.clone()));
            }
        }

        let l_cols = df.get_columns();
        for n_idx_row in 0..n_height {
            for (n_idx_col, col) in l_cols.iter().enumerate() {
                let value = derive_cell_value_from_any_value(
                    col.get(n_idx_row)
                        .map_err(|err| format!("Failed to access cell value: {err}"))?,
                );
                if self.if_autofit_columns {
                    l_width_by_col[n_idx_col] = usize::max(
                        l_width_by_col[n_idx_col],
                        estimate_display_width(&value),
                    );
                }
                write_cell_with_format(
                    worksheet,
                    n_idx_row + 1,
                    n_idx_col,
                    &value,
                    &l_fmt_data_by_col[n_idx_col],
                )?;
            }
        }

        if let Some(format_spec) = &binding.format_spec {
            apply_formatting(worksheet, df, format_spec, &mut self.report)?;
        }

        if self.if_autofit_columns {
            for (n_idx_col, n_width_recorded) in l_width_by_col.iter().enumerate() {
                let n_width_final = usize::min(
                    N_WIDTH_CELL_MAX,
                    usize::max(N_WIDTH_CELL_MIN, n_width_recorded + N_WIDTH_CELL_PADDING),
                );
                worksheet
                    .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                    .map_err(derive_xlsx_error_text)?;
            }
        }

        info!("Wrote sheet {sheet_name_unique:?}: {n_height} rows x {n_width} cols.");
        self.report.sheets_written.push(sheet_name_unique);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Build the per-column cell format specs for one sheet.
///
/// Columns with a display-mask directive in `format_spec` get that mask as
/// their number format; every other column keeps the default format.
pub fn plan_column_formats(
    l_colnames: &[String],
    format_spec: Option<&SpecColumnFormatSpec>,
) -> Vec<SpecCellFormat> {
    let dict_masks = format_spec
        .map(derive_column_num_format_overrides)
        .unwrap_or_default();
    l_colnames
        .iter()
        .map(|c_name| SpecCellFormat {
            num_format: dict_masks.get(c_name).cloned(),
            ..Default::default()
        })
        .collect()
}

/// Write the header row and enable the filter/freeze chrome.
///
/// Column names land in row 0 with `fmt_header`; the autofilter spans the
/// header plus `n_height_data` data rows and row 0 is frozen. Re-applying
/// replaces the same cells and settings in place.
pub fn format_header(
    worksheet: &mut Worksheet,
    l_colnames: &[String],
    fmt_header: &Format,
    n_height_data: usize,
) -> Result<(), String> {
    if l_colnames.is_empty() {
        return Ok(());
    }

    for (n_idx_col, c_name) in l_colnames.iter().enumerate() {
        worksheet
            .write_string_with_format(0, cast_col_num(n_idx_col)?, c_name, fmt_header)
            .map_err(derive_xlsx_error_text)?;
    }
    worksheet
        .autofilter(
            0,
            0,
            cast_row_num(n_height_data)?,
            cast_col_num(l_colnames.len() - 1)?,
        )
        .map_err(derive_xlsx_error_text)?;
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(derive_xlsx_error_text)?;
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SaveRetry

/// Classify one save failure for the retry loop.
///
/// A permission-denied I/O error is how an open/locked destination file
/// surfaces on save; everything else is fatal for that attempt.
pub fn classify_save_error(err: &XlsxError) -> EnumSaveFailure {
    match err {
        XlsxError::IoError(err_io) if err_io.kind() == ErrorKind::PermissionDenied => {
            EnumSaveFailure::Locked(err.to_string())
        }
        _ => EnumSaveFailure::Fatal(err.to_string()),
    }
}

/// Save via `fn_save`, re-prompting `fn_locate_dir` while the target is locked.
///
/// Lock failures re-prompt for a directory and retry without an attempt cap;
/// the provider returning `None` ends the loop with
/// [`ExportSetupError::NoOutputLocation`]. Fatal failures are recorded on the
/// report and the call returns `Ok(None)` (nothing saved).
pub fn save_with_lock_retry<FSave, FLocate>(
    path_initial: PathBuf,
    filename: &str,
    fn_save: &mut FSave,
    fn_locate_dir: &mut FLocate,
    report: &mut SpecExportReport,
) -> Result<Option<PathBuf>, ExportSetupError>
where
    FSave: FnMut(&PathBuf) -> Result<(), XlsxError>,
    FLocate: FnMut() -> Option<PathBuf>,
{
    let mut path_file_out = path_initial;
    loop {
        match fn_save(&path_file_out) {
            Ok(()) => return Ok(Some(path_file_out)),
            Err(err) => match classify_save_error(&err) {
                EnumSaveFailure::Locked(c_msg) => {
                    warn!(
                        "Output file {:?} appears to be open elsewhere; re-prompting.",
                        path_file_out
                    );
                    report.warn(format!("Locked output file, re-prompted: {c_msg}"));
                    let Some(dir_next) = fn_locate_dir() else {
                        return Err(ExportSetupError::NoOutputLocation);
                    };
                    path_file_out = dir_next.join(filename);
                }
                EnumSaveFailure::Fatal(c_msg) => {
                    error!("Failed to save workbook: {c_msg}");
                    report.error(format!("Failed to save workbook: {c_msg}"));
                    return Ok(None);
                }
            },
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOrchestration

/// Export frames to one workbook, one sheet per frame.
///
/// `dict_format_specs` is keyed by sheet name; sheets without an entry get
/// default formatting. `fn_locate_dir` supplies the output directory when
/// `options.dir_out` is `None` and again whenever a save attempt finds the
/// destination locked.
///
/// Per-sheet write failures and fatal save failures never propagate: they
/// are recorded on the returned report. The `Err` side covers setup failures
/// only (length mismatch, no output location).
pub fn export_to_excel<FLocate>(
    l_frames: &[DataFrame],
    l_sheet_names: &[String],
    dict_format_specs: &BTreeMap<String, SpecColumnFormatSpec>,
    options: &SpecExportOptions,
    mut fn_locate_dir: FLocate,
) -> Result<SpecExportReport, ExportSetupError>
where
    FLocate: FnMut() -> Option<PathBuf>,
{
    if l_frames.len() != l_sheet_names.len() {
        return Err(ExportSetupError::LengthMismatch {
            n_frames: l_frames.len(),
            n_sheet_names: l_sheet_names.len(),
        });
    }

    let dir_out = match options.dir_out.clone() {
        Some(dir) => dir,
        None => fn_locate_dir().ok_or(ExportSetupError::NoOutputLocation)?,
    };

    info!(
        "Exporting {} frame(s) to {:?} in {:?}.",
        l_frames.len(),
        options.filename,
        dir_out
    );

    let mut writer = XlsxExportWriter::new(options);
    for (df, c_sheet_name) in l_frames.iter().zip(l_sheet_names) {
        let binding = SpecSheetBinding {
            df: df.clone(),
            sheet_name: c_sheet_name.clone(),
            format_spec: dict_format_specs.get(c_sheet_name).cloned(),
        };
        if let Err(c_msg) = writer.write_sheet(&binding) {
            error!("Failed to write sheet {c_sheet_name:?}: {c_msg}");
            writer
                .report
                .error(format!("Sheet {c_sheet_name:?}: {c_msg}"));
        }
    }

    let (mut workbook, mut report) = writer.finish();

    if report.sheets_written.is_empty() {
        info!("No sheets written; skipping save. {report}");
        return Ok(report);
    }

    let mut fn_save = |path: &PathBuf| workbook.save(path);
    let path_saved = save_with_lock_retry(
        dir_out.join(&options.filename),
        &options.filename,
        &mut fn_save,
        &mut fn_locate_dir,
        &mut report,
    )?;
    if let Some(path) = path_saved {
        info!("Saved workbook to {:?}. {report}", path);
    }

    Ok(report)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int128(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
