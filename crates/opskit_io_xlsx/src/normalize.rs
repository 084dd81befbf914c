//! Column-label cleanup, date-column stringify/sort and numeric narrowing.

use polars::prelude::{DataFrame, DataType, SortMultipleOptions};
use regex::Regex;

use crate::conf::{R_LEADING_DIGIT_PAIR, TUP_COLUMN_NAME_SUBSTITUTIONS};
use crate::util::validate_unique_columns;

/// Clean one raw column label.
///
/// Trim, apply the substitution table, lower-case, then prefix an underscore
/// when the label starts with a digit followed by any second character.
pub fn normalize_column_name(name: &str, re_leading_digit: &Regex) -> String {
    let mut c_name = name.trim().to_string();
    for (c_from, c_to) in TUP_COLUMN_NAME_SUBSTITUTIONS {
        c_name = c_name.replace(c_from, c_to);
    }
    c_name = c_name.to_lowercase();
    re_leading_digit.replace(&c_name, "_$1").to_string()
}

/// Normalize a frame for warehouse/export use.
///
/// - Column labels are cleaned via [`normalize_column_name`].
/// - Columns whose cleaned name contains `date` are cast to string and the
///   frame is re-sorted ascending by all such columns combined. Callers must
///   expect the row-order change.
/// - `Float64` narrows to `Float32`, `Int64` narrows to `Int32`.
///
/// Errors when renaming would produce duplicate column names.
pub fn normalize_columns(df: &DataFrame) -> Result<DataFrame, String> {
    let re_leading_digit = Regex::new(R_LEADING_DIGIT_PAIR)
        .map_err(|err| format!("Failed to compile column-name pattern: {err}"))?;

    let l_colnames_new: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(|c_name| normalize_column_name(c_name, &re_leading_digit))
        .collect();
    validate_unique_columns(&l_colnames_new)?;

    let mut df_out = df.clone();
    df_out
        .set_column_names(l_colnames_new.clone())
        .map_err(|err| format!("Failed to rename columns: {err}"))?;

    let l_cols_date: Vec<String> = l_colnames_new
        .iter()
        .filter(|c_name| c_name.contains("date"))
        .cloned()
        .collect();
    if !l_cols_date.is_empty() {
        for c_name in &l_cols_date {
            let col_casted = df_out
                .column(c_name)
                .map_err(|err| format!("Failed to access column {c_name:?}: {err}"))?
                .cast(&DataType::String)
                .map_err(|err| format!("Failed to stringify column {c_name:?}: {err}"))?;
            df_out
                .with_column(col_casted)
                .map_err(|err| format!("Failed to replace column {c_name:?}: {err}"))?;
        }
        df_out = df_out
            .sort(l_cols_date, SortMultipleOptions::default())
            .map_err(|err| format!("Failed to sort by date columns: {err}"))?;
    }

    let l_casts_narrow: Vec<(String, DataType)> = df_out
        .get_columns()
        .iter()
        .filter_map(|col| match col.dtype() {
            DataType::Float64 => Some((col.name().to_string(), DataType::Float32)),
            DataType::Int64 => Some((col.name().to_string(), DataType::Int32)),
            _ => None,
        })
        .collect();
    for (c_name, dtype_target) in l_casts_narrow {
        let col_casted = df_out
            .column(&c_name)
            .map_err(|err| format!("Failed to access column {c_name:?}: {err}"))?
            .cast(&dtype_target)
            .map_err(|err| format!("Failed to narrow column {c_name:?}: {err}"))?;
        df_out
            .with_column(col_casted)
            .map_err(|err| format!("Failed to replace column {c_name:?}: {err}"))?;
    }

    Ok(df_out)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{AnyValue, Column, DataFrame, DataType};
    use regex::Regex;

    use super::{normalize_column_name, normalize_columns};
    use crate::conf::R_LEADING_DIGIT_PAIR;

    fn leading_digit_regex() -> Regex {
        Regex::new(R_LEADING_DIGIT_PAIR).expect("valid pattern")
    }

    #[test]
    fn column_names_are_cleaned_and_substituted() {
        let re = leading_digit_regex();
        assert_eq!(
            normalize_column_name(" Sale Price ($) ", &re),
            "sale_price_dollar"
        );
        assert_eq!(normalize_column_name("Margin %", &re), "margin_percent");
        assert_eq!(normalize_column_name("Ship-To/Region", &re), "ship_to_region");
        assert_eq!(normalize_column_name("Qty?", &re), "qty");
    }

    #[test]
    fn leading_digit_pair_gets_underscore_prefix() {
        let re = leading_digit_regex();
        assert_eq!(normalize_column_name("7. Revenue", &re), "_7_revenue");
        assert_eq!(normalize_column_name("30 day units", &re), "_30_day_units");
        // Single-character labels have no digit-pair to rewrite.
        assert_eq!(normalize_column_name("7", &re), "7");
        assert_eq!(normalize_column_name("revenue", &re), "revenue");
    }

    #[test]
    fn date_columns_become_text_and_drive_row_order() {
        let df = DataFrame::new(vec![
            Column::new(
                "Order Date".into(),
                &["2024-02-01", "2024-01-01", "2024-03-01"],
            ),
            Column::new("units".into(), &[2i64, 1, 3]),
        ])
        .expect("frame");

        let df_out = normalize_columns(&df).expect("normalize");
        let col_date = df_out.column("order_date").expect("renamed column");
        assert_eq!(col_date.dtype(), &DataType::String);

        match col_date.get(0).expect("cell") {
            AnyValue::String(s) => assert_eq!(s, "2024-01-01"),
            other => panic!("unexpected cell value: {other:?}"),
        }
        // Rows stay aligned through the sort.
        match df_out.column("units").expect("units").get(0).expect("cell") {
            AnyValue::Int32(v) => assert_eq!(v, 1),
            other => panic!("unexpected cell value: {other:?}"),
        }
    }

    #[test]
    fn numeric_storage_is_narrowed() {
        let df = DataFrame::new(vec![
            Column::new("units".into(), &[1i64, 2]),
            Column::new("price".into(), &[1.5f64, 2.5]),
            Column::new("note".into(), &["a", "b"]),
        ])
        .expect("frame");

        let df_out = normalize_columns(&df).expect("normalize");
        assert_eq!(
            df_out.column("units").expect("units").dtype(),
            &DataType::Int32
        );
        assert_eq!(
            df_out.column("price").expect("price").dtype(),
            &DataType::Float32
        );
        assert_eq!(
            df_out.column("note").expect("note").dtype(),
            &DataType::String
        );
    }

    #[test]
    fn colliding_normalized_names_are_rejected() {
        let df = DataFrame::new(vec![
            Column::new("a b".into(), &[1i64]),
            Column::new("a_b".into(), &[2i64]),
        ])
        .expect("frame");

        let err = normalize_columns(&df).expect_err("collision must fail");
        assert!(err.contains("Duplicate column names"));
    }
}
