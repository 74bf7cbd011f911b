use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::ExportError;
use crate::models::Student;

use super::HEADERS;

const TITLE: &str = "Students Report";

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 36;
const TITLE_SIZE: i64 = 18;
/// Vertical space taken by the title block on the first page.
const TITLE_BLOCK: i64 = 40;
const FONT_SIZE: i64 = 9;
const ROW_HEIGHT: i64 = 18;
/// Column widths summing to the printable width (`PAGE_WIDTH - 2 * MARGIN`).
const COLUMN_WIDTHS: [i64; 6] = [35, 170, 40, 70, 50, 158];
/// Horizontal padding kept free inside each cell.
const CELL_PADDING: i64 = 3;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Render `students` into a paginated A4 PDF: a title followed by a gridded
/// table whose header row is repeated on every page.
pub fn write_report(path: &Path, students: &[Student]) -> Result<(), ExportError> {
    let rows: Vec<[String; 6]> = students.iter().map(report_row).collect();
    let mut doc = build_document(&rows)?;

    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    doc.save_to(&mut writer).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn report_row(student: &Student) -> [String; 6] {
    [
        student.id.to_string(),
        student.name.clone(),
        student.age.to_string(),
        student.class_name.clone(),
        student.score_display(),
        student.date_added_display().to_string(),
    ]
}

fn build_document(rows: &[[String; 6]]) -> Result<Document, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let mut page_ids: Vec<Object> = Vec::new();
    for (index, chunk) in paginate(rows).into_iter().enumerate() {
        let operations = page_operations(index == 0, chunk);
        let encoded = Content { operations }.encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

/// Split rows across pages. The first page loses room to the title; every
/// page reserves one row for the repeated header. Always yields at least one
/// page so an empty report still shows its title and header.
fn paginate(rows: &[[String; 6]]) -> Vec<&[[String; 6]]> {
    let first_capacity = ((table_top(true) - MARGIN) / ROW_HEIGHT - 1) as usize;
    let capacity = ((table_top(false) - MARGIN) / ROW_HEIGHT - 1) as usize;

    let mut pages = Vec::new();
    let split = first_capacity.min(rows.len());
    pages.push(&rows[..split]);
    let mut rest = &rows[split..];
    while !rest.is_empty() {
        let take = capacity.min(rest.len());
        pages.push(&rest[..take]);
        rest = &rest[take..];
    }
    pages
}

fn table_top(first_page: bool) -> i64 {
    if first_page {
        PAGE_HEIGHT - MARGIN - TITLE_BLOCK
    } else {
        PAGE_HEIGHT - MARGIN
    }
}

fn page_operations(first_page: bool, rows: &[[String; 6]]) -> Vec<Operation> {
    let mut ops = Vec::new();

    if first_page {
        let width = text_width(TITLE, TITLE_SIZE);
        let x = (PAGE_WIDTH - width) / 2;
        let y = PAGE_HEIGHT - MARGIN - TITLE_SIZE;
        push_text(&mut ops, BOLD_FONT, TITLE_SIZE, x, y, TITLE);
    }

    let top = table_top(first_page);

    // Header background, #2E86AB.
    ops.push(Operation::new("rg", vec![0.18.into(), 0.525.into(), 0.671.into()]));
    ops.push(Operation::new(
        "re",
        vec![
            MARGIN.into(),
            (top - ROW_HEIGHT).into(),
            COLUMN_WIDTHS.iter().sum::<i64>().into(),
            ROW_HEIGHT.into(),
        ],
    ));
    ops.push(Operation::new("f", vec![]));

    // Header text in whitesmoke.
    ops.push(Operation::new("rg", vec![0.96.into(), 0.96.into(), 0.96.into()]));
    push_row_text(&mut ops, BOLD_FONT, top - ROW_HEIGHT, HEADERS.iter().copied());

    ops.push(Operation::new("g", vec![0.into()]));
    for (index, row) in rows.iter().enumerate() {
        let y = top - ROW_HEIGHT * (index as i64 + 2);
        push_row_text(&mut ops, REGULAR_FONT, y, row.iter().map(String::as_str));
    }

    // Grid.
    ops.push(Operation::new("G", vec![0.5.into()]));
    ops.push(Operation::new("w", vec![0.5.into()]));
    for line in 0..=rows.len() as i64 {
        let y = top - ROW_HEIGHT * (line + 1);
        let mut x = MARGIN;
        for width in COLUMN_WIDTHS {
            ops.push(Operation::new(
                "re",
                vec![x.into(), y.into(), width.into(), ROW_HEIGHT.into()],
            ));
            x += width;
        }
    }
    ops.push(Operation::new("S", vec![]));

    ops
}

/// Centered, truncated cell text for one row whose bottom edge is at `y`.
fn push_row_text<'a>(
    ops: &mut Vec<Operation>,
    font: &str,
    y: i64,
    cells: impl Iterator<Item = &'a str>,
) {
    let baseline = y + (ROW_HEIGHT - FONT_SIZE) / 2 + 2;
    let mut x = MARGIN;
    for (cell, width) in cells.zip(COLUMN_WIDTHS) {
        let text = fit_to_width(cell, width - 2 * CELL_PADDING);
        let offset = (width - text_width(&text, FONT_SIZE)) / 2;
        push_text(ops, font, FONT_SIZE, x + offset.max(CELL_PADDING), baseline, &text);
        x += width;
    }
}

fn push_text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
    ops.push(Operation::new("ET", vec![]));
}

/// Rough Helvetica advance: half the font size per character.
fn text_width(text: &str, size: i64) -> i64 {
    text.chars().count() as i64 * size / 2
}

fn fit_to_width(text: &str, width: i64) -> String {
    let max_chars = (width * 2 / FONT_SIZE).max(1) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Standard Type1 fonts only cover a single-byte encoding. Latin-1 characters
/// map directly; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}
