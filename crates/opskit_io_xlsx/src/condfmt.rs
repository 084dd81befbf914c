//! Column directive application: conditional formats and display-mask plans.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use rust_xlsxwriter::{
    Color, ConditionalFormat2ColorScale, ConditionalFormat3ColorScale, ConditionalFormatCell,
    ConditionalFormatCellRule, ConditionalFormatType, Format, FormatPattern, Formula, Worksheet,
};

use crate::spec::{
    EnumColumnDirective, EnumHighlightTarget, SpecColumnFormatSpec, SpecExportReport,
    SpecHighlightExtreme, SpecThreeColorScale, SpecTwoColorScale,
};
use crate::util::{cast_col_num, derive_abs_column_range};

////////////////////////////////////////////////////////////////////////////////
// #region ColorParsing

/// Parse a `#RRGGBB` (or bare `RRGGBB`) hex color.
pub fn parse_hex_color(hex: &str) -> Result<Color, String> {
    let c_digits = hex.strip_prefix('#').unwrap_or(hex);
    if c_digits.len() != 6 {
        return Err(format!("Invalid hex color (want 6 digits): {hex:?}"));
    }
    let n_rgb = u32::from_str_radix(c_digits, 16)
        .map_err(|err| format!("Invalid hex color {hex:?}: {err}"))?;
    Ok(Color::RGB(n_rgb))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DisplayMaskPlan

/// Resolve per-column display masks from the directive stacks.
///
/// Conditional directives contribute nothing here; when a column stacks
/// several display directives the last one wins.
pub fn derive_column_num_format_overrides(
    format_spec: &SpecColumnFormatSpec,
) -> BTreeMap<String, String> {
    let mut dict_masks = BTreeMap::new();
    for (c_col, l_directives) in &format_spec.directives_by_col {
        for directive in l_directives {
            if let Some(c_mask) = directive.num_format() {
                dict_masks.insert(c_col.clone(), c_mask);
            }
        }
    }
    dict_masks
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConditionalApplication

/// Apply all conditional directives in `format_spec` to the data rows of `ws`.
///
/// `df` must already carry its final (normalized) column names; the data
/// occupies sheet rows `1..=height` below the header row. Directive columns
/// with no match in the frame are recorded on `report.cols_skipped` and
/// skipped without error.
pub fn apply_formatting(
    ws: &mut Worksheet,
    df: &DataFrame,
    format_spec: &SpecColumnFormatSpec,
    report: &mut SpecExportReport,
) -> Result<(), String> {
    let n_height = df.height();
    if n_height == 0 {
        return Ok(());
    }
    let l_colnames = df.get_column_names_str();

    for (c_col, l_directives) in &format_spec.directives_by_col {
        let Some(n_col_idx) = l_colnames.iter().position(|c_name| *c_name == c_col.as_str())
        else {
            report.cols_skipped.push(c_col.clone());
            continue;
        };

        let n_col = cast_col_num(n_col_idx)?;
        let n_row_first = 1u32;
        let n_row_last = n_height as u32;

        for directive in l_directives {
            match directive {
                EnumColumnDirective::TwoColorScale(scale) => {
                    apply_two_color_scale(ws, scale, n_row_first, n_row_last, n_col)?;
                }
                EnumColumnDirective::ThreeColorScale(scale) => {
                    apply_three_color_scale(ws, scale, n_row_first, n_row_last, n_col)?;
                }
                EnumColumnDirective::HighlightExtreme(highlight) => {
                    apply_highlight_extreme(
                        ws, highlight, n_col_idx, n_row_first, n_row_last, n_col,
                    )?;
                }
                EnumColumnDirective::Integer
                | EnumColumnDirective::Decimal { .. }
                | EnumColumnDirective::Currency
                | EnumColumnDirective::Percent => {
                    // Display masks are planned into the column cell format.
                }
            }
        }
    }

    Ok(())
}

fn apply_two_color_scale(
    ws: &mut Worksheet,
    scale: &SpecTwoColorScale,
    n_row_first: u32,
    n_row_last: u32,
    n_col: u16,
) -> Result<(), String> {
    let mut cond_fmt = ConditionalFormat2ColorScale::new()
        .set_minimum_color(parse_hex_color(&scale.color_min)?)
        .set_maximum_color(parse_hex_color(&scale.color_max)?);
    if let Some(n_min) = scale.value_min {
        cond_fmt = cond_fmt.set_minimum(ConditionalFormatType::Number, n_min);
    }
    if let Some(n_max) = scale.value_max {
        cond_fmt = cond_fmt.set_maximum(ConditionalFormatType::Number, n_max);
    }

    ws.add_conditional_format(n_row_first, n_col, n_row_last, n_col, &cond_fmt)
        .map_err(|err| format!("Failed to add two-color scale: {err}"))?;
    Ok(())
}

fn apply_three_color_scale(
    ws: &mut Worksheet,
    scale: &SpecThreeColorScale,
    n_row_first: u32,
    n_row_last: u32,
    n_col: u16,
) -> Result<(), String> {
    let mut cond_fmt = ConditionalFormat3ColorScale::new()
        .set_minimum_color(parse_hex_color(&scale.color_min)?)
        .set_midpoint_color(parse_hex_color(&scale.color_mid)?)
        .set_maximum_color(parse_hex_color(&scale.color_max)?);
    if let Some(n_min) = scale.value_min {
        cond_fmt = cond_fmt.set_minimum(ConditionalFormatType::Number, n_min);
    }
    if let Some(n_mid) = scale.value_mid {
        cond_fmt = cond_fmt.set_midpoint(ConditionalFormatType::Number, n_mid);
    }
    if let Some(n_max) = scale.value_max {
        cond_fmt = cond_fmt.set_maximum(ConditionalFormatType::Number, n_max);
    }

    ws.add_conditional_format(n_row_first, n_col, n_row_last, n_col, &cond_fmt)
        .map_err(|err| format!("Failed to add three-color scale: {err}"))?;
    Ok(())
}

fn apply_highlight_extreme(
    ws: &mut Worksheet,
    highlight: &SpecHighlightExtreme,
    n_col_idx: usize,
    n_row_first: u32,
    n_row_last: u32,
    n_col: u16,
) -> Result<(), String> {
    // A1 rows are one-based, plus one more for the header row.
    let c_range = derive_abs_column_range(
        n_col_idx,
        n_row_first as usize + 1,
        n_row_last as usize + 1,
    );
    let c_func = match highlight.target {
        EnumHighlightTarget::Max => "MAX",
        EnumHighlightTarget::Min => "MIN",
    };
    let formula = Formula::new(format!("{c_func}({c_range})"));

    let color_bg = parse_hex_color(&highlight.bg_color)?;
    let fmt_highlight = Format::new()
        .set_foreground_color(color_bg)
        .set_background_color(color_bg)
        .set_pattern(FormatPattern::Solid)
        .set_font_color(parse_hex_color(&highlight.font_color)?);

    let cond_fmt = ConditionalFormatCell::new()
        .set_rule(ConditionalFormatCellRule::EqualTo(formula))
        .set_format(fmt_highlight);

    ws.add_conditional_format(n_row_first, n_col, n_row_last, n_col, &cond_fmt)
        .map_err(|err| format!("Failed to add extreme highlight: {err}"))?;
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, DataFrame};
    use rust_xlsxwriter::Worksheet;

    use super::*;
    use crate::spec::EnumColumnDirective;

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("sku".into(), &["a", "b", "c"]),
            Column::new("revenue".into(), &[10.0f64, 20.0, 30.0]),
        ])
        .expect("frame")
    }

    #[test]
    fn hex_colors_parse_with_and_without_hash() {
        assert_eq!(parse_hex_color("#63BE7B"), Ok(Color::RGB(0x63BE7B)));
        assert_eq!(parse_hex_color("FFFFFF"), Ok(Color::RGB(0xFFFFFF)));
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn last_display_mask_wins_per_column() {
        let mut format_spec = SpecColumnFormatSpec::new();
        format_spec
            .push("revenue", EnumColumnDirective::Integer)
            .push("revenue", EnumColumnDirective::Currency)
            .push("share", EnumColumnDirective::Percent)
            .push(
                "share",
                EnumColumnDirective::TwoColorScale(SpecTwoColorScale::default()),
            );

        let dict_masks = derive_column_num_format_overrides(&format_spec);
        assert_eq!(dict_masks["revenue"], "$#,##0.00");
        assert_eq!(dict_masks["share"], "0.0%");
        assert_eq!(dict_masks.len(), 2);
    }

    #[test]
    fn conditional_directives_apply_to_matching_columns() {
        let df = sample_frame();
        let mut ws = Worksheet::new();
        let mut report = SpecExportReport::default();

        let mut format_spec = SpecColumnFormatSpec::new();
        format_spec
            .push(
                "revenue",
                EnumColumnDirective::TwoColorScale(SpecTwoColorScale::default()),
            )
            .push(
                "revenue",
                EnumColumnDirective::ThreeColorScale(SpecThreeColorScale::default()),
            )
            .push(
                "revenue",
                EnumColumnDirective::HighlightExtreme(SpecHighlightExtreme::default()),
            );

        apply_formatting(&mut ws, &df, &format_spec, &mut report).expect("apply");
        assert!(report.cols_skipped.is_empty());
    }

    #[test]
    fn unmatched_directive_columns_are_recorded_not_fatal() {
        let df = sample_frame();
        let mut ws = Worksheet::new();
        let mut report = SpecExportReport::default();

        let mut format_spec = SpecColumnFormatSpec::new();
        format_spec.push("no_such_col", EnumColumnDirective::Currency);

        apply_formatting(&mut ws, &df, &format_spec, &mut report).expect("apply");
        assert_eq!(report.cols_skipped, vec!["no_such_col".to_string()]);
    }
}
