//! Binary save/load of a sheet.
//!
//! A stream is a sequence of records with no header, one per stored cell,
//! in row-major order. All integers are little-endian.
//!
//! | Field   | Type  | Notes                                         |
//! |---------|-------|-----------------------------------------------|
//! | row     | `i32` | 0-based                                       |
//! | col     | `i32` | 0-based                                       |
//! | kind    | `i32` | 1 = number, 2 = text, 3 = formula             |
//! | payload |       | number: `f64`; text/formula: `u64` length + UTF-8 bytes |
//!
//! Formulas are stored as their text and re-parsed on load. Payloads are
//! limited to [`MAX_PAYLOAD_LEN`] bytes; [`Spreadsheet::set_cell`] refuses
//! longer content, so only corrupt streams trip the limit.

use crate::spreadsheet::{Cell, FormulaCell, Spreadsheet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tabula_core::{CellAddress, CellStorage};
use tabula_formula::parse_formula;
use thiserror::Error;

/// Longest text or formula content a cell may hold, in bytes
pub const MAX_PAYLOAD_LEN: u64 = 1_000_000;

const KIND_NUMBER: i32 = 1;
const KIND_TEXT: i32 = 2;
const KIND_FORMULA: i32 = 3;

/// Errors from saving or loading a sheet
#[derive(Debug, Error)]
pub enum PersistError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream ended inside a record
    #[error("unexpected end of data at offset {offset}")]
    Truncated { offset: usize },

    #[error("unknown cell kind {kind} at offset {offset}")]
    InvalidKind { kind: i32, offset: usize },

    #[error("invalid cell position row={row} col={col}")]
    InvalidAddress { row: i32, col: i32 },

    #[error("payload of {len} bytes at offset {offset} exceeds the limit")]
    PayloadTooLong { len: u64, offset: usize },

    #[error("payload at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("formula in {address} does not parse: {reason}")]
    InvalidFormula { address: String, reason: String },

    /// The same cell appears twice in one stream
    #[error("duplicate cell {0}")]
    DuplicateCell(String),

    /// Cell position does not fit the on-disk format
    #[error("cell {0} is outside the storable range")]
    AddressOutOfRange(String),
}

impl Spreadsheet {
    /// Write every stored cell to `writer`
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), PersistError> {
        let mut buf = Vec::new();
        for (addr, cell) in self.cells.iter() {
            write_record(&mut buf, addr, cell)?;
        }
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }

    /// Replace the sheet's contents with the cells read from `reader`
    ///
    /// On any error the sheet is left empty.
    pub fn load<R: Read>(&mut self, mut reader: R) -> Result<(), PersistError> {
        let result = read_cells(&mut reader);
        match result {
            Ok(cells) => {
                self.cells = cells;
                Ok(())
            }
            Err(err) => {
                log::warn!("rejecting sheet stream: {}", err);
                self.cells.clear();
                Err(err)
            }
        }
    }

    /// Save to a file, replacing it
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let file = File::create(path)?;
        self.save(BufWriter::new(file))
    }

    /// Load from a file
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PersistError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                self.cells.clear();
                return Err(err.into());
            }
        };
        self.load(BufReader::new(file))
    }
}

// === Writing ===

fn write_record(buf: &mut Vec<u8>, addr: CellAddress, cell: &Cell) -> Result<(), PersistError> {
    let row =
        i32::try_from(addr.row).map_err(|_| PersistError::AddressOutOfRange(addr.to_string()))?;
    let col =
        i32::try_from(addr.col).map_err(|_| PersistError::AddressOutOfRange(addr.to_string()))?;

    buf.extend_from_slice(&row.to_le_bytes());
    buf.extend_from_slice(&col.to_le_bytes());

    match cell {
        Cell::Number(n) => {
            buf.extend_from_slice(&KIND_NUMBER.to_le_bytes());
            buf.extend_from_slice(&n.to_le_bytes());
        }
        Cell::Text(s) => {
            buf.extend_from_slice(&KIND_TEXT.to_le_bytes());
            write_payload(buf, s);
        }
        Cell::Formula(formula) => {
            buf.extend_from_slice(&KIND_FORMULA.to_le_bytes());
            write_payload(buf, &formula.text(addr));
        }
    }

    Ok(())
}

fn write_payload(buf: &mut Vec<u8>, text: &str) {
    buf.extend_from_slice(&(text.len() as u64).to_le_bytes());
    buf.extend_from_slice(text.as_bytes());
}

// === Reading ===

fn read_cells<R: Read>(reader: &mut R) -> Result<CellStorage<Cell>, PersistError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut cells = CellStorage::new();
    let mut offset = 0;

    // A clean end of stream is only allowed between records
    while offset < data.len() {
        let row = read_i32(&data, &mut offset)?;
        let col = read_i32(&data, &mut offset)?;
        let (Ok(r), Ok(c)) = (u32::try_from(row), u32::try_from(col)) else {
            return Err(PersistError::InvalidAddress { row, col });
        };
        let addr = CellAddress::new(r, c);

        let kind_offset = offset;
        let kind = read_i32(&data, &mut offset)?;
        let cell = match kind {
            KIND_NUMBER => Cell::Number(read_f64(&data, &mut offset)?),
            KIND_TEXT => Cell::Text(read_payload(&data, &mut offset)?),
            KIND_FORMULA => {
                let text = read_payload(&data, &mut offset)?;
                let expr =
                    parse_formula(&text, addr).map_err(|e| PersistError::InvalidFormula {
                        address: addr.to_string(),
                        reason: e.to_string(),
                    })?;
                Cell::Formula(FormulaCell {
                    expr,
                    source: Some(text),
                })
            }
            _ => {
                return Err(PersistError::InvalidKind {
                    kind,
                    offset: kind_offset,
                })
            }
        };

        if cells.insert(addr, cell).is_some() {
            return Err(PersistError::DuplicateCell(addr.to_string()));
        }
    }

    Ok(cells)
}

/// Take `len` bytes at `offset`, advancing `offset`.
fn take<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8], PersistError> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or(PersistError::Truncated { offset: *offset })?;
    let bytes = &data[*offset..end];
    *offset = end;
    Ok(bytes)
}

#[inline]
fn read_i32(data: &[u8], offset: &mut usize) -> Result<i32, PersistError> {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(take(data, offset, 4)?);
    Ok(i32::from_le_bytes(bytes))
}

#[inline]
fn read_u64(data: &[u8], offset: &mut usize) -> Result<u64, PersistError> {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(take(data, offset, 8)?);
    Ok(u64::from_le_bytes(bytes))
}

#[inline]
fn read_f64(data: &[u8], offset: &mut usize) -> Result<f64, PersistError> {
    read_u64(data, offset).map(f64::from_bits)
}

/// Read a length-prefixed UTF-8 payload
fn read_payload(data: &[u8], offset: &mut usize) -> Result<String, PersistError> {
    let len_offset = *offset;
    let len = read_u64(data, offset)?;
    if len > MAX_PAYLOAD_LEN {
        return Err(PersistError::PayloadTooLong {
            len,
            offset: len_offset,
        });
    }

    let start = *offset;
    let bytes = take(data, offset, len as usize)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| PersistError::InvalidUtf8 { offset: start })
}
