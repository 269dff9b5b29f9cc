//! End-to-end tests for binary save/load

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tabula::prelude::*;

fn addr(text: &str) -> CellAddress {
    CellAddress::parse(text).unwrap()
}

fn saved(sheet: &Spreadsheet) -> Vec<u8> {
    let mut buf = Vec::new();
    sheet.save(&mut buf).unwrap();
    buf
}

fn sample_sheet() -> Spreadsheet {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "12").unwrap();
    sheet.set("A2", "100").unwrap();
    sheet.set("A3", "3e1").unwrap();
    sheet.set("A4", "=40").unwrap();
    sheet.set("A5", "=5e+1").unwrap();
    sheet.set("A6", "text with \"quotes\"\nand a newline").unwrap();
    sheet.set("B1", "=A1+A2*A3").unwrap();
    sheet.set("B2", "= -A1 ^ 2 - A2 / 2   ").unwrap();
    sheet.set("B3", "= 2 ^ $A$1").unwrap();
    sheet.set("B4", "=($A1+A$2)^2").unwrap();
    sheet.set("B5", "=B1+B2+B3+B4").unwrap();
    sheet.set("B6", "=B1+B2+B3+B4+B5").unwrap();
    sheet
}

fn assert_same_values(left: &Spreadsheet, right: &Spreadsheet) {
    assert_eq!(left.cell_count(), right.cell_count());
    for (addr, _) in left.iter() {
        assert_eq!(left.get_value(addr), right.get_value(addr), "{}", addr);
    }
}

#[test]
fn test_roundtrip() {
    let x0 = sample_sheet();
    let mut x1 = Spreadsheet::new();
    x1.set("Z1", "leftover").unwrap();

    x1.load(saved(&x0).as_slice()).unwrap();
    assert_same_values(&x0, &x1);
    assert_eq!(x1.get("Z1").unwrap(), CellValue::Empty);
    assert_eq!(x1.get("B1").unwrap(), CellValue::Number(3012.0));
    assert_eq!(x1.get("B6").unwrap(), CellValue::Number(38916.0));
    assert_eq!(
        x1.formula_text(addr("B2")).as_deref(),
        Some("= -A1 ^ 2 - A2 / 2   ")
    );
}

#[test]
fn test_loaded_copy_is_independent() {
    let mut x0 = sample_sheet();
    let mut x1 = Spreadsheet::new();
    x1.load(saved(&x0).as_slice()).unwrap();

    x0.set("A3", "4e1").unwrap();
    assert_eq!(x1.get("B1").unwrap(), CellValue::Number(3012.0));
    assert_eq!(x0.get("B1").unwrap(), CellValue::Number(4012.0));
}

#[test]
fn test_corrupted_stream_is_rejected() {
    let x0 = sample_sheet();
    let mut data = saved(&x0);
    for byte in data.iter_mut().take(10) {
        *byte ^= 0x5a;
    }

    let mut x1 = sample_sheet();
    assert!(x1.load(data.as_slice()).is_err());
    assert!(x1.is_empty());
}

/// Offsets of the `u64` length fields of every text and formula record
fn length_fields(data: &[u8]) -> Vec<usize> {
    let mut fields = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let kind = i32::from_le_bytes(data[offset + 8..offset + 12].try_into().unwrap());
        offset += 12;
        if kind == 1 {
            offset += 8;
        } else {
            fields.push(offset);
            let len = u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap());
            offset += 8 + len as usize;
        }
    }
    fields
}

#[test]
fn test_corrupted_length_is_rejected() {
    let long_text = "abcdefghij".repeat(30);
    for content in ["plain text of moderate length", "=A1+B1*2", long_text.as_str()] {
        // Numbers first, so the payload record is the last one in the stream
        let mut x0 = Spreadsheet::new();
        x0.set("A1", "12").unwrap();
        x0.set("B1", "2.5").unwrap();
        x0.set("A2", content).unwrap();

        let data = saved(&x0);
        let fields = length_fields(&data);
        assert_eq!(fields, vec![52]);

        for field in fields {
            for bit in 0..64 {
                let mut corrupt = data.clone();
                corrupt[field + bit / 8] ^= 1 << (bit % 8);

                let mut x1 = sample_sheet();
                let result = x1.load(corrupt.as_slice());
                assert!(result.is_err(), "{:?}: bit {} accepted", content, bit);
                assert!(x1.is_empty());
            }
        }
    }
}

#[test]
fn test_truncated_stream_is_rejected() {
    let data = saved(&sample_sheet());
    for cut in [1, 5, 13, data.len() / 2, data.len() - 1] {
        let mut sheet = sample_sheet();
        let result = sheet.load(&data[..cut]);
        assert!(
            matches!(result, Err(PersistError::Truncated { .. })),
            "cut at {}: {:?}",
            cut,
            result
        );
        assert!(sheet.is_empty());
    }
}

#[test]
fn test_copied_formulas_survive_save() {
    let mut x0 = Spreadsheet::new();
    x0.set("D1", "10").unwrap();
    x0.set("D2", "20").unwrap();
    x0.set("F11", "=D1+5").unwrap();
    x0.set("F12", "=$D1+5").unwrap();
    x0.copy_rect(addr("G12"), addr("F11"), 1, 2);
    x0.copy_rect(addr("A1"), addr("F11"), 1, 1);

    let mut x1 = Spreadsheet::new();
    x1.load(saved(&x0).as_slice()).unwrap();

    assert_same_values(&x0, &x1);
    assert_eq!(x1.formula_text(addr("G12")).as_deref(), Some("=E2+5"));
    assert_eq!(x1.formula_text(addr("G13")).as_deref(), Some("=$D2+5"));
    assert_eq!(x1.formula_text(addr("A1")).as_deref(), Some("=#REF!+5"));
    assert_eq!(x1.get("G13").unwrap(), CellValue::Number(25.0));
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.tab");

    let x0 = sample_sheet();
    x0.save_to_path(&path).unwrap();

    let mut x1 = Spreadsheet::new();
    x1.load_from_path(&path).unwrap();
    assert_same_values(&x0, &x1);

    let missing = dir.path().join("missing.tab");
    assert!(matches!(
        x1.load_from_path(&missing),
        Err(PersistError::Io(_))
    ));
    assert!(x1.is_empty());
}

fn cell_content() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i32>().prop_map(|n| n.to_string()),
        (-1e6f64..1e6).prop_map(|n| n.to_string()),
        "[a-z ]{0,12}",
        (0u32..20, 0u32..5).prop_map(|(row, col)| format!(
            "={}{}*2+1",
            CellAddress::column_to_letters(col),
            row + 1
        )),
    ]
}

proptest! {
    #[test]
    fn prop_save_load_identity(
        cells in prop::collection::vec(((0u32..20, 0u32..5), cell_content()), 0..40)
    ) {
        let mut x0 = Spreadsheet::new();
        for ((row, col), content) in &cells {
            x0.set_cell_at(*row, *col, content).unwrap();
        }

        let bytes = saved(&x0);
        let mut x1 = Spreadsheet::new();
        x1.load(bytes.as_slice()).unwrap();

        prop_assert_eq!(x0.cell_count(), x1.cell_count());
        for (addr, cell) in x0.iter() {
            prop_assert_eq!(Some(cell), x1.cell(addr));
        }
        prop_assert_eq!(saved(&x1), bytes);
    }
}
