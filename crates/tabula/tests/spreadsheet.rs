//! Tests for cell classification and evaluation through the sheet

use pretty_assertions::assert_eq;
use tabula::prelude::*;

fn num(n: f64) -> CellValue {
    CellValue::Number(n)
}

fn assert_column(sheet: &Spreadsheet, expected: &[(&str, f64)]) {
    for (cell, value) in expected {
        assert_eq!(sheet.get(cell).unwrap(), num(*value), "{}", cell);
    }
}

/// Sheet with literals in column A and formulas over them in column B
fn sample_sheet() -> Spreadsheet {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "10").unwrap();
    sheet.set("A2", "20.5").unwrap();
    sheet.set("A3", "3e1").unwrap();
    sheet.set("A4", "=40").unwrap();
    sheet.set("A5", "=5e+1").unwrap();
    sheet.set("B1", "=A1+A2*A3").unwrap();
    sheet.set("B2", "= -A1 ^ 2 - A2 / 2   ").unwrap();
    sheet.set("B3", "= 2 ^ $A$1").unwrap();
    sheet.set("B4", "=($A1+A$2)^2").unwrap();
    sheet.set("B5", "=B1+B2+B3+B4").unwrap();
    sheet.set("B6", "=B1+B2+B3+B4+B5").unwrap();
    sheet
}

#[test]
fn test_literals() {
    let mut sheet = sample_sheet();
    sheet
        .set("A6", "raw text with any characters, including a quote \" or a newline\n")
        .unwrap();
    sheet
        .set("A7", "=\"quoted string, quotes must be doubled: \"\".\"")
        .unwrap();

    assert_column(
        &sheet,
        &[("A1", 10.0), ("A2", 20.5), ("A3", 30.0), ("A4", 40.0), ("A5", 50.0)],
    );
    assert_eq!(
        sheet.get("A6").unwrap(),
        CellValue::text("raw text with any characters, including a quote \" or a newline\n")
    );
    assert_eq!(
        sheet.get("A7").unwrap(),
        CellValue::text("quoted string, quotes must be doubled: \".")
    );
    assert_eq!(sheet.get("A8").unwrap(), CellValue::Empty);
    assert_eq!(sheet.get("AAAA9999").unwrap(), CellValue::Empty);
}

#[test]
fn test_formulas_follow_their_inputs() {
    let mut sheet = sample_sheet();
    assert_column(
        &sheet,
        &[
            ("B1", 625.0),
            ("B2", -110.25),
            ("B3", 1024.0),
            ("B4", 930.25),
            ("B5", 2469.0),
            ("B6", 4938.0),
        ],
    );

    sheet.set("A1", "12").unwrap();
    assert_column(
        &sheet,
        &[
            ("B1", 627.0),
            ("B2", -154.25),
            ("B3", 4096.0),
            ("B4", 1056.25),
            ("B5", 5625.0),
            ("B6", 11250.0),
        ],
    );
}

#[test]
fn test_clones_are_independent() {
    let mut x0 = sample_sheet();
    x0.set("A1", "12").unwrap();
    let mut x1 = x0.clone();

    x0.set("A2", "100").unwrap();
    x1.set("A2", "=A3+A5+A4").unwrap();

    assert_column(
        &x0,
        &[
            ("B1", 3012.0),
            ("B2", -194.0),
            ("B3", 4096.0),
            ("B4", 12544.0),
            ("B5", 19458.0),
            ("B6", 38916.0),
        ],
    );
    assert_column(
        &x1,
        &[
            ("B1", 3612.0),
            ("B2", -204.0),
            ("B3", 4096.0),
            ("B4", 17424.0),
            ("B5", 24928.0),
            ("B6", 49856.0),
        ],
    );
}

#[test]
fn test_exponent_literal() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "55e0").unwrap();
    assert_eq!(sheet.get("A1").unwrap(), num(55.0));
}

#[test]
fn test_text_concatenation() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "ahoj").unwrap();
    sheet.set("A2", " svete").unwrap();
    sheet.set("A3", "=A1+A2").unwrap();
    assert_eq!(sheet.get("A3").unwrap(), CellValue::text("ahoj svete"));

    sheet.set("A2", "3").unwrap();
    assert_eq!(sheet.get("A3").unwrap(), CellValue::text("ahoj3"));

    sheet.set("A2", "0.25").unwrap();
    sheet.set("A3", "=A2+A1").unwrap();
    assert_eq!(sheet.get("A3").unwrap(), CellValue::text("0.25ahoj"));
}

#[test]
fn test_cycles_are_empty() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "=A2").unwrap();
    sheet.set("A2", "=A1").unwrap();
    assert_eq!(sheet.get("A1").unwrap(), CellValue::Empty);
    assert_eq!(sheet.get("A2").unwrap(), CellValue::Empty);

    // Breaking the cycle restores values
    sheet.set("A2", "7").unwrap();
    assert_eq!(sheet.get("A1").unwrap(), num(7.0));
}

#[test]
fn test_empty_results() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "=1/0").unwrap();
    sheet.set("A2", "=\"x\"*2").unwrap();
    sheet.set("A3", "=Z99+1").unwrap();
    sheet.set("A4", "=A1+1").unwrap();

    for cell in ["A1", "A2", "A3", "A4"] {
        assert_eq!(sheet.get(cell).unwrap(), CellValue::Empty, "{}", cell);
    }
}

#[test]
fn test_comparisons() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "apple").unwrap();
    sheet.set("A2", "banana").unwrap();
    sheet.set("A3", "=A1<A2").unwrap();
    sheet.set("A4", "=A1=\"apple\"").unwrap();
    sheet.set("A5", "=1+1>=3").unwrap();
    sheet.set("A6", "=A1<>1").unwrap();

    assert_eq!(sheet.get("A3").unwrap(), num(1.0));
    assert_eq!(sheet.get("A4").unwrap(), num(1.0));
    assert_eq!(sheet.get("A5").unwrap(), num(0.0));
    assert_eq!(sheet.get("A6").unwrap(), CellValue::Empty);
}

#[test]
fn test_rejected_formula_keeps_old_content() {
    let mut sheet = Spreadsheet::new();
    sheet.set("C3", "=1+2").unwrap();

    for bad in ["=", "=1+", "=SUM(A1)", "=(1", "=A1 A2", "=\"open"] {
        assert!(matches!(sheet.set("C3", bad), Err(Error::Formula(_))), "{}", bad);
    }
    assert_eq!(sheet.get("C3").unwrap(), num(3.0));
    assert_eq!(sheet.cell_count(), 1);
}

#[test]
fn test_iteration_order() {
    let mut sheet = Spreadsheet::new();
    sheet.set("B2", "1").unwrap();
    sheet.set("A2", "x").unwrap();
    sheet.set("C1", "=B2").unwrap();

    let cells: Vec<_> = sheet
        .iter()
        .map(|(addr, cell)| (addr.to_string(), cell.kind()))
        .collect();
    assert_eq!(
        cells,
        vec![
            ("C1".to_string(), "formula"),
            ("A2".to_string(), "text"),
            ("B2".to_string(), "number"),
        ]
    );
}
