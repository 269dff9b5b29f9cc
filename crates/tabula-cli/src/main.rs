//! Tabula CLI - edit and inspect binary sheet files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::Path;
use std::path::PathBuf;
use tabula::prelude::*;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about = "Spreadsheet cell editing and evaluation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set a cell and save the sheet (the file is created if missing)
    Set {
        /// Sheet file
        file: PathBuf,

        /// Cell address, e.g. B3
        cell: String,

        /// Cell content: a number, text, or a formula starting with '='
        content: String,
    },

    /// Print the evaluated value of a cell
    Get {
        /// Sheet file
        file: PathBuf,

        /// Cell address, e.g. B3
        cell: String,
    },

    /// Copy a rectangle of cells and save the sheet
    Copy {
        /// Sheet file
        file: PathBuf,

        /// Top-left cell of the destination
        dst: String,

        /// Top-left cell of the source
        src: String,

        /// Number of columns
        #[arg(long, default_value = "1")]
        width: u32,

        /// Number of rows
        #[arg(long, default_value = "1")]
        height: u32,
    },

    /// List every cell with its content and value
    Dump {
        /// Sheet file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Set {
            file,
            cell,
            content,
        } => set_cell(&file, &cell, &content),
        Commands::Get { file, cell } => get_cell(&file, &cell),
        Commands::Copy {
            file,
            dst,
            src,
            width,
            height,
        } => copy_rect(&file, &dst, &src, width, height),
        Commands::Dump { file } => dump(&file),
    }
}

fn open(path: &Path) -> Result<Spreadsheet> {
    let mut sheet = Spreadsheet::new();
    sheet
        .load_from_path(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    Ok(sheet)
}

fn save(sheet: &Spreadsheet, path: &Path) -> Result<()> {
    sheet
        .save_to_path(path)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    eprintln!("Wrote {} cells to '{}'", sheet.cell_count(), path.display());
    Ok(())
}

fn parse_address(text: &str) -> Result<CellAddress> {
    CellAddress::parse(text).with_context(|| format!("Invalid cell '{}'", text))
}

fn set_cell(path: &Path, cell: &str, content: &str) -> Result<()> {
    let mut sheet = if path.exists() {
        open(path)?
    } else {
        eprintln!("Creating new sheet '{}'", path.display());
        Spreadsheet::new()
    };

    let addr = parse_address(cell)?;
    sheet
        .set_cell(addr, content)
        .with_context(|| format!("Failed to set {}", addr))?;

    save(&sheet, path)
}

fn get_cell(path: &Path, cell: &str) -> Result<()> {
    let sheet = open(path)?;
    let addr = parse_address(cell)?;
    println!("{}", sheet.get_value(addr));
    Ok(())
}

fn copy_rect(path: &Path, dst: &str, src: &str, width: u32, height: u32) -> Result<()> {
    let mut sheet = open(path)?;
    let dst = parse_address(dst)?;
    let src = parse_address(src)?;

    sheet.copy_rect(dst, src, width, height);
    eprintln!("Copied {}x{} cells from {} to {}", width, height, src, dst);

    save(&sheet, path)
}

fn dump(path: &Path) -> Result<()> {
    let sheet = open(path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (addr, cell) in sheet.iter() {
        let source = match cell {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => format!("{:?}", s),
            Cell::Formula(formula) => formula.text(addr),
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            addr,
            cell.kind(),
            source,
            sheet.get_value(addr)
        )
        .context("Failed to write to stdout")?;
    }

    if sheet.is_empty() {
        eprintln!("Warning: Sheet is empty");
    }

    Ok(())
}
