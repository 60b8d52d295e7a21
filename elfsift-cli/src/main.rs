mod render;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use elfsift_core::{
    AmbiguityPolicy, Binary, ElfFile, ParseOptions, PossibleFrames, DEFAULT_SOURCES,
};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Bounds-checked ELF metadata inspector
#[derive(Parser)]
#[command(
    name = "elfsift",
    about = "Inspect ELF headers, segments, sections, symbols and relocations",
    version,
    author
)]
struct Cli {
    /// Path to binary file
    #[arg(required = true)]
    path: std::path::PathBuf,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Accept duplicate string or symbol tables, keeping the last one
    #[arg(long, global = true)]
    last_wins: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the file header
    Header,
    /// List program headers
    Segments,
    /// List section headers
    Sections,
    /// List symbols
    Symbols {
        /// Show the dynamic symbol table instead of the static one
        #[arg(long)]
        dynamic: bool,
    },
    /// List relocation entries grouped by section
    Relocs,
    /// Show all discovered functions
    Functions {
        /// Where to read function boundaries from (symtab, dynsym, eh_frame)
        #[arg(long)]
        source: Option<PossibleFrames>,
    },
    /// Everything above
    All,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_table<T: Tabled>(title: &str, rows: Vec<T>) {
    println!("\n{}", title.bold().cyan());
    if rows.is_empty() {
        println!("{}", "(none)".dimmed());
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct RelocationGroup {
    section: usize,
    name: String,
    kind: String,
    entries: Vec<render::RelocationRow>,
}

fn relocation_groups(elf: &ElfFile<'_>) -> Vec<RelocationGroup> {
    elf.relocations()
        .tables()
        .map(|table| RelocationGroup {
            section: table.section,
            name: elf.section_name(table.section).unwrap_or("NONE").to_string(),
            kind: format!("{:?}", table.kind).to_uppercase(),
            entries: render::relocation_rows(table, elf.header().e_machine),
        })
        .collect()
}

fn show_header(elf: &ElfFile<'_>, json: bool) -> Result<()> {
    let rows = render::header_rows(elf.header());
    if json {
        return print_json(&rows);
    }
    print_table("ELF Header", rows);
    Ok(())
}

fn show_segments(elf: &ElfFile<'_>, json: bool) -> Result<()> {
    let rows: Vec<_> = elf.segments().iter().map(render::segment_row).collect();
    if json {
        return print_json(&rows);
    }
    print_table("Program Headers", rows);
    Ok(())
}

fn show_sections(elf: &ElfFile<'_>, json: bool) -> Result<()> {
    let rows = render::section_rows(elf);
    if json {
        return print_json(&rows);
    }
    print_table("Section Headers", rows);
    Ok(())
}

fn show_symbols(elf: &ElfFile<'_>, dynamic: bool, json: bool) -> Result<()> {
    let (title, table) = if dynamic {
        ("Dynamic Symbols (.dynsym)", elf.dynamic_symbols())
    } else {
        ("Symbols (.symtab)", elf.static_symbols())
    };
    let rows = render::symbol_rows(table);
    if json {
        return print_json(&rows);
    }
    print_table(title, rows);
    Ok(())
}

fn show_relocations(elf: &ElfFile<'_>, json: bool) -> Result<()> {
    let groups = relocation_groups(elf);
    if json {
        return print_json(&groups);
    }
    if groups.is_empty() {
        print_table::<render::RelocationRow>("Relocations", Vec::new());
    }
    for group in groups {
        let title = format!("Relocation section {} ({})", group.name, group.kind);
        print_table(&title, group.entries);
    }
    Ok(())
}

fn show_functions(elf: &ElfFile<'_>, source: Option<PossibleFrames>, json: bool) -> Result<()> {
    let sources = match source {
        Some(source) => vec![source],
        None => DEFAULT_SOURCES.to_vec(),
    };
    let functions = elfsift_core::discover_functions(elf, &sources)?;
    let rows: Vec<_> = functions.iter().map(render::function_row).collect();
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No functions found (stripped binary without .eh_frame).");
        return Ok(());
    }
    print_table("Functions", rows);
    Ok(())
}

#[derive(Serialize)]
struct Everything {
    header: Vec<render::HeaderRow>,
    segments: Vec<render::SegmentRow>,
    sections: Vec<render::SectionRow>,
    symbols: Vec<render::SymbolRow>,
    dynamic_symbols: Vec<render::SymbolRow>,
    relocations: Vec<RelocationGroup>,
}

fn show_all(elf: &ElfFile<'_>, json: bool) -> Result<()> {
    if json {
        return print_json(&Everything {
            header: render::header_rows(elf.header()),
            segments: elf.segments().iter().map(render::segment_row).collect(),
            sections: render::section_rows(elf),
            symbols: render::symbol_rows(elf.static_symbols()),
            dynamic_symbols: render::symbol_rows(elf.dynamic_symbols()),
            relocations: relocation_groups(elf),
        });
    }
    show_header(elf, false)?;
    show_segments(elf, false)?;
    show_sections(elf, false)?;
    show_symbols(elf, false, false)?;
    show_symbols(elf, true, false)?;
    show_relocations(elf, false)
}

fn run(cli: &Cli) -> Result<()> {
    let bin = Binary::open(&cli.path)?;
    let options = ParseOptions {
        ambiguity: if cli.last_wins {
            AmbiguityPolicy::LastWins
        } else {
            AmbiguityPolicy::Reject
        },
    };

    let elf = bin
        .parse(options)
        .with_context(|| format!("failed to parse {}", bin.path))?;

    match &cli.command {
        Command::Header => show_header(&elf, cli.json)?,
        Command::Segments => show_segments(&elf, cli.json)?,
        Command::Sections => show_sections(&elf, cli.json)?,
        Command::Symbols { dynamic } => show_symbols(&elf, *dynamic, cli.json)?,
        Command::Relocs => show_relocations(&elf, cli.json)?,
        Command::Functions { source } => show_functions(&elf, *source, cli.json)?,
        Command::All => show_all(&elf, cli.json)?,
    }

    elf.release();
    bin.close();
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
