use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;

use rvgen::assembler::{Assembler, GenError};
use rvgen::isa::{Bank, Format, InstructionSet, Operand, RegisterFile, RegisterQuery};

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "rvgen")]
#[command(about = "rvgen - randomized RISC-V assembly stimulus generator")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// CLI instruction-format selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    /// R-type: rd, rs1, rs2
    R,
    /// I-type: rd, rs1, imm
    I,
    /// B-type: rs1, rs2, label
    B,
    /// U-type: rd, imm
    U,
    /// J-type: rd, label
    J,
    /// Float R-type: fd, fs1, fs2
    Fr,
    /// CSR register form: rd, csr, rs1
    CsrR,
    /// CSR immediate form: rd, csr, imm
    CsrI,
    /// Load/store form: rd, offset(base)
    LoadStore,
}

impl From<CliFormat> for Format {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::R => Format::r(),
            CliFormat::I => Format::i(),
            CliFormat::B => Format::b(),
            CliFormat::U => Format::u(),
            CliFormat::J => Format::j(),
            CliFormat::Fr => Format::fr(),
            CliFormat::CsrR => Format::csr_r(),
            CliFormat::CsrI => Format::csr_i(),
            CliFormat::LoadStore => Format::load_store(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random instruction sequence
    Generate {
        /// Number of instructions to generate
        #[arg(long, short, default_value = "100")]
        count: usize,
        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Output file for the generated program
        #[arg(long, short, default_value = "random_asm_output.asm")]
        output: PathBuf,
        /// Restrict to instructions from this extension (e.g. I, F)
        #[arg(long)]
        extension: Option<String>,
        /// Restrict to instructions with this operand format
        #[arg(long, value_enum)]
        format: Option<CliFormat>,
        /// Restrict to these mnemonics (repeatable)
        #[arg(long = "mnemonic")]
        mnemonics: Vec<String>,
        /// Echo generated lines to stdout
        #[arg(long, short)]
        verbose: bool,
    },
    /// Generate a chain that XORs every result into a reserved accumulator
    Chain {
        /// Number of chain links to generate (two instructions each)
        #[arg(long, short, default_value = "100")]
        count: usize,
        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Output file for the generated program
        #[arg(long, short, default_value = "random_asm_output.asm")]
        output: PathBuf,
    },
    /// Print the default register file
    Registers,
    /// Print the stock instruction catalog
    Isa,
}

fn main() {
    let args = Args::parse();

    let result = match args.command {
        Commands::Generate {
            count,
            seed,
            output,
            extension,
            format,
            mnemonics,
            verbose,
        } => run_generate(count, seed, &output, extension, format, mnemonics, verbose),
        Commands::Chain {
            count,
            seed,
            output,
        } => run_chain(count, seed, &output),
        Commands::Registers => {
            println!("{}", RegisterFile::standard());
            Ok(())
        }
        Commands::Isa => {
            println!("{}", InstructionSet::standard());
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run_generate(
    count: usize,
    seed: Option<u64>,
    output: &PathBuf,
    extension: Option<String>,
    format: Option<CliFormat>,
    mnemonics: Vec<String>,
    verbose: bool,
) -> Result<(), GenError> {
    let mut asm = Assembler::new(seed);
    let format = format.map(Format::from);
    let mnemonic_refs: Vec<&str> = mnemonics.iter().map(String::as_str).collect();
    let list = if mnemonic_refs.is_empty() {
        None
    } else {
        Some(mnemonic_refs.as_slice())
    };

    asm.generate(count, extension.as_deref(), format.as_ref(), list)?;

    if verbose {
        for line in asm.lines() {
            println!("{line}");
        }
    }
    asm.write_to_file(output)?;
    println!("Wrote {} lines to {}", asm.lines().len(), output.display());
    Ok(())
}

fn run_chain(count: usize, seed: Option<u64>, output: &PathBuf) -> Result<(), GenError> {
    let mut asm = Assembler::new(seed);
    asm.push_comment("accumulator chain stimulus");
    asm.place_label("chain_head")?;

    // R- and I-format instructions both take (rd, rs1, <reg|imm>), so a
    // rolling destination can feed the next link's first source.
    let mut pool = asm.isa().filter(None, None, Some(&Format::r()));
    pool.merge(asm.isa().filter(None, None, Some(&Format::i())));

    let unreserved = RegisterQuery::new()
        .with_bank(Bank::Integer)
        .with_reserved(false);
    let acc = asm.pick_register(&unreserved, true)?;
    let mut rd = asm.pick_register(&unreserved, false)?;

    for _ in 0..count {
        let rs1 = rd;
        rd = asm.pick_register(&unreserved, false)?;
        let def = asm.pick_from(&pool).ok_or(GenError::NoInstruction)?;
        let last = asm.random_operand(def.format().kinds()[2])?;
        asm.push_instruction(
            def.mnemonic(),
            &[Operand::Register(rd), Operand::Register(rs1), last],
        )?;
        asm.push_instruction(
            "XOR",
            &[
                Operand::Register(acc),
                Operand::Register(acc),
                Operand::Register(rd),
            ],
        )?;
    }

    asm.write_to_file(output)?;
    println!("Wrote {} lines to {}", asm.lines().len(), output.display());
    Ok(())
}
