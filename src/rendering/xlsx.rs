// src/rendering/xlsx.rs
// Workbook output: a summary sheet plus one sheet per render group.

use log::{debug, info, warn};
use rust_xlsxwriter::{
    Color, ColNum, Format, FormatAlign, FormatBorder, FormatUnderline, RowNum, Workbook,
    Worksheet, XlsxError,
};
use std::collections::HashMap;
use std::path::Path;

use crate::clustering::render_groups::RenderGroup;
use crate::errors::Result;
use crate::models::{GroupId, Outcome};
use crate::rendering::{Report, ReportRenderer};

const SUMMARY_SHEET: &str = "Summary";
const ANALYZED_RESULT_LABEL: &str = "Analyzed Result";

// Summary sheet, 0-based.
const SUMMARY_LIST_ROW: RowNum = 8;
const SUMMARY_TITLE_COL: ColNum = 1;
const SUMMARY_SHEET_COL: ColNum = 7;

// Render group sheets, 0-based.
const GROUP_TOP_ROW: usize = 4;
const GROUP_HEADER_ROWS: usize = 6;
const FIRST_DATA_COL: usize = 2;

struct Styles {
    title: Format,
    subtitle: Format,
    link: Format,
    key_value: Format,
    outcome: Format,
    header: Format,
    header_units: Format,
    group: Format,
    metric: Format,
    metric_value: Format,
    class: Format,
    analyzed_class: Format,
    analyzed_result: Format,
    box_cell: Format,
    render_group: Format,
}

impl Styles {
    fn new() -> Self {
        let boxed = Format::new().set_border(FormatBorder::Thin);
        Self {
            title: Format::new().set_bold().set_font_size(18),
            subtitle: Format::new().set_italic().set_font_size(12),
            link: Format::new()
                .set_font_size(12)
                .set_font_color(Color::Blue)
                .set_underline(FormatUnderline::Single),
            key_value: Format::new().set_bold().set_align(FormatAlign::Left),
            outcome: Format::new().set_bold(),
            header: boxed
                .clone()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_background_color(Color::RGB(0xDDEBF7)),
            header_units: boxed
                .clone()
                .set_italic()
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(0xDDEBF7)),
            group: boxed
                .clone()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(0xF2F2F2)),
            metric: boxed.clone().set_italic().set_align(FormatAlign::Center),
            metric_value: boxed.clone().set_align(FormatAlign::Center),
            class: boxed.clone().set_bold().set_text_wrap(),
            analyzed_class: boxed
                .clone()
                .set_bold()
                .set_italic()
                .set_align(FormatAlign::VerticalCenter)
                .set_background_color(Color::RGB(0xFFF2CC)),
            analyzed_result: boxed
                .clone()
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(0xFFF2CC)),
            render_group: boxed
                .clone()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            box_cell: boxed,
        }
    }
}

/// Writes the report as an `.xlsx` workbook.
#[derive(Debug, Clone, Default)]
pub struct XlsxRenderer;

impl XlsxRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn build_workbook(&self, report: &Report<'_>) -> Result<Workbook> {
        let styles = Styles::new();
        let mut workbook = Workbook::new();

        let sheet_names: Vec<String> = (1..=report.render_groups.len())
            .map(sheet_name)
            .collect();

        let summary = summary_sheet(report, &sheet_names, &styles)?;
        workbook.push_worksheet(summary);

        for (group, name) in report.render_groups.iter().zip(&sheet_names) {
            debug!("Writing {} as '{}'", group.id(), name);
            let sheet = render_group_sheet(report, group, name, &styles)?;
            workbook.push_worksheet(sheet);
        }
        Ok(workbook)
    }
}

impl ReportRenderer for XlsxRenderer {
    fn render(&self, report: &Report<'_>, destination: &Path) -> Result<()> {
        let mut workbook = self.build_workbook(report)?;
        workbook.save(destination)?;
        info!(
            "Saved {} render groups to {}",
            report.render_groups.len(),
            destination.display()
        );
        Ok(())
    }
}

pub fn sheet_name(sequence: usize) -> String {
    format!("Render Group {}", sequence)
}

fn summary_sheet(report: &Report<'_>, sheet_names: &[String], styles: &Styles) -> Result<Worksheet> {
    let summary = report.summary;
    let mut sheet = Worksheet::new();
    sheet.set_name(SUMMARY_SHEET)?;

    sheet.write_string_with_format(1, 1, &summary.title, &styles.title)?;
    if !summary.url.is_empty() {
        sheet.write_url_with_format(2, 1, summary.url.as_str(), &styles.link)?;
    }

    let facts = [
        ("NCT ID", &summary.nct_id),
        ("Started", &summary.started),
        ("Completed", &summary.completed),
    ];
    for (offset, (label, value)) in facts.iter().enumerate() {
        let row = 4 + offset as RowNum;
        sheet.write_string(row, 1, *label)?;
        sheet.merge_range(row, 2, row, 5, value.as_str(), &styles.key_value)?;
    }

    sheet.set_column_width(0, 6)?;
    sheet.set_column_width(1, 14)?;
    for col in 2..=11 {
        sheet.set_column_width(col, 20)?;
    }

    let mut row = SUMMARY_LIST_ROW;
    for (group, name) in report.render_groups.iter().zip(sheet_names) {
        let start = row;
        for id in group.outcomes() {
            if let Some(outcome) = report.outcomes.get(id) {
                sheet.write_string_with_format(row, SUMMARY_TITLE_COL, &outcome.title, &styles.box_cell)?;
                row += 1;
            }
        }
        if row == start {
            continue;
        }
        let end = row - 1;
        if end > start {
            sheet.merge_range(start, SUMMARY_SHEET_COL, end, SUMMARY_SHEET_COL, name, &styles.render_group)?;
        } else {
            sheet.write_string_with_format(start, SUMMARY_SHEET_COL, name, &styles.render_group)?;
        }
    }

    Ok(sheet)
}

/// Row positions of one render group sheet, 0-based.
struct GroupLayout {
    header_row: RowNum,
    units_row: RowNum,
    group_row: RowNum,
    metric_row: RowNum,
    analyzed_units_row: RowNum,
    analyzed_value_row: RowNum,
    first_class_row: RowNum,
}

impl GroupLayout {
    fn for_members(members: usize) -> std::result::Result<Self, XlsxError> {
        let data_top = row_num(GROUP_TOP_ROW + members)?;
        Ok(Self {
            header_row: data_top + 2,
            units_row: data_top + 3,
            group_row: data_top + 4,
            metric_row: data_top + 5,
            analyzed_units_row: data_top + 6,
            analyzed_value_row: data_top + 7,
            first_class_row: row_num(GROUP_TOP_ROW + members + GROUP_HEADER_ROWS + 2)?,
        })
    }
}

fn render_group_sheet(
    report: &Report<'_>,
    group: &RenderGroup,
    name: &str,
    styles: &Styles,
) -> Result<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(name)?;

    sheet.set_column_width(0, 6)?;
    sheet.set_column_width(1, 24)?;
    for col in 2..=11 {
        sheet.set_column_width(col, 14)?;
    }
    sheet.set_freeze_panes(0, 2)?;

    sheet.write_string_with_format(1, 1, name, &styles.title)?;
    sheet.write_string_with_format(2, 1, "Grouped Outcomes", &styles.subtitle)?;

    let members: Vec<&Outcome> = group
        .outcomes()
        .iter()
        .filter_map(|id| report.outcomes.get(id))
        .collect();
    let layout = GroupLayout::for_members(members.len())?;

    sheet.merge_range(
        layout.analyzed_units_row,
        1,
        layout.analyzed_value_row,
        1,
        ANALYZED_RESULT_LABEL,
        &styles.analyzed_class,
    )?;

    let mut class_rows: HashMap<String, RowNum> = HashMap::new();
    for (offset, class) in group.classes().iter().enumerate() {
        let row = layout.first_class_row + row_num(offset)?;
        sheet.write_string_with_format(row, 1, class, &styles.class)?;
        class_rows.entry(class.to_lowercase()).or_insert(row);
    }

    let mut start_col = FIRST_DATA_COL;
    for (index, outcome) in members.iter().enumerate() {
        let list_row = row_num(GROUP_TOP_ROW + index)?;
        sheet.write_string_with_format(list_row, 1, &outcome.title, &styles.outcome)?;
        start_col += write_outcome_columns(&mut sheet, outcome, start_col, &layout, &class_rows, styles)?;
    }

    Ok(sheet)
}

/// Writes one outcome's block of columns starting at `start_col` and returns
/// how many columns it used.
fn write_outcome_columns(
    sheet: &mut Worksheet,
    outcome: &Outcome,
    start_col: usize,
    layout: &GroupLayout,
    class_rows: &HashMap<String, RowNum>,
    styles: &Styles,
) -> Result<usize> {
    let measure = &outcome.measure;
    let width = measure.width.max(1);
    let outcome_width = outcome.groups.len() * width;
    if outcome_width == 0 {
        warn!("Outcome '{}' lists no groups, no data columns written", outcome.title);
        return Ok(0);
    }

    let column_width = if width == 1 { 28 } else { 14 };
    for col in start_col..start_col + outcome_width {
        sheet.set_column_width(col_num(col)?, column_width)?;
    }

    let last_col = start_col + outcome_width - 1;
    write_span(sheet, layout.header_row, start_col, last_col, &outcome.title, &styles.header)?;
    write_span(sheet, layout.units_row, start_col, last_col, &units_label(outcome), &styles.header_units)?;

    let mut group_columns: HashMap<&GroupId, usize> = HashMap::new();
    for (index, group) in outcome.groups.iter().enumerate() {
        let group_col = start_col + index * width;
        group_columns.insert(&group.id, group_col);
        write_span(sheet, layout.group_row, group_col, group_col + width - 1, &group.title, &styles.group)?;

        for (offset, key) in measure.metric_keys().enumerate() {
            sheet.write_string_with_format(
                layout.metric_row,
                col_num(group_col + offset)?,
                &metric_label(key),
                &styles.metric,
            )?;
        }
    }

    for count in &measure.analyzed.data {
        let Some(&group_col) = group_columns.get(&count.group_id) else {
            warn!(
                "Analyzed count for unknown group {} in '{}'",
                count.group_id, outcome.title
            );
            continue;
        };
        let last = group_col + width - 1;
        write_span(sheet, layout.analyzed_units_row, group_col, last, &measure.analyzed.units, &styles.analyzed_result)?;
        let value = count.value("value").unwrap_or_default();
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() && width == 1 => {
                sheet.write_number_with_format(
                    layout.analyzed_value_row,
                    col_num(group_col)?,
                    number,
                    &styles.analyzed_result,
                )?;
            }
            _ => write_span(sheet, layout.analyzed_value_row, group_col, last, value, &styles.analyzed_result)?,
        }
    }

    for class in &measure.raw {
        let Some(&row) = class_rows.get(&class.class.to_lowercase()) else {
            warn!("Class '{}' missing from render group sheet", class.class);
            continue;
        };
        for measurement in &class.data {
            let Some(&group_col) = group_columns.get(&measurement.group_id) else {
                continue;
            };
            for (offset, value) in measurement.metric_values().enumerate() {
                write_value(sheet, row, col_num(group_col + offset)?, value, &styles.metric_value)?;
            }
        }
    }

    Ok(outcome_width)
}

fn units_label(outcome: &Outcome) -> String {
    let measure = &outcome.measure;
    let mut label = measure.param.clone();
    if !measure.units.is_empty() {
        label.push_str(&format!(", as {}", measure.units));
    }
    if !measure.dispersion.is_empty() {
        label.push_str(&format!(", with {}", measure.dispersion));
    }
    label
}

/// `lower_limit` becomes `Lower Limit`.
fn metric_label(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Writes `text` across `first_col..=last_col`, merging only when the span is
/// wider than one cell.
fn write_span(
    sheet: &mut Worksheet,
    row: RowNum,
    first_col: usize,
    last_col: usize,
    text: &str,
    format: &Format,
) -> Result<()> {
    let first = col_num(first_col)?;
    let last = col_num(last_col)?;
    if last > first {
        sheet.merge_range(row, first, row, last, text, format)?;
    } else {
        sheet.write_string_with_format(row, first, text, format)?;
    }
    Ok(())
}

/// Numeric strings are written as numbers, anything else as text.
fn write_value(sheet: &mut Worksheet, row: RowNum, col: ColNum, value: &str, format: &Format) -> Result<()> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => {
            sheet.write_number_with_format(row, col, number, format)?;
        }
        _ => {
            sheet.write_string_with_format(row, col, value, format)?;
        }
    }
    Ok(())
}

fn col_num(index: usize) -> std::result::Result<ColNum, XlsxError> {
    ColNum::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn row_num(index: usize) -> std::result::Result<RowNum, XlsxError> {
    RowNum::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}
