use clap::{ArgGroup, Parser, ValueEnum};
use kmodal::{parse, Axiom, Formula, FormulaError, ModalSystem};
use std::error::Error;
use std::fs::File;
use std::io::{self, Read, Write};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum System {
    K,
    S5,
}

impl From<System> for ModalSystem {
    fn from(system: System) -> Self {
        match system {
            System::K => ModalSystem::K,
            System::S5 => ModalSystem::S5,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Nnf,
    Tail,
    Simplify,
    Flatten,
    Axiom,
    Normalize,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rewrites multi-modal formulas, one per line", long_about = None)]
#[clap(group(
    ArgGroup::new("input_source")
        .required(false)
        .args(&["filein", "input"]),
))]
struct Args {
    #[arg(short = 'I', long)]
    filein: Option<String>,

    #[arg(short = 'i', long)]
    input: Option<String>,

    #[arg(short = 'O', long)]
    fileout: Option<String>,

    #[arg(short, long, value_enum, default_value_t = System::K)]
    system: System,

    #[arg(short, long, value_enum, default_value_t = Pass::Normalize)]
    pass: Pass,

    /// Axiom id for `--pass axiom`: 1 T, 2 B, 3 D, 4 4, 5 5.
    #[arg(short, long, default_value_t = 4)]
    axiom: u32,

    /// Number of modal operators assumed above the input for `--pass axiom`.
    #[arg(short, long, default_value_t = 0)]
    depth: u32,

    #[arg(short, long)]
    verbose: bool,

    #[arg(trailing_var_arg = true)]
    direct_input: Vec<String>,
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}

fn read_input(args: &Args) -> io::Result<String> {
    if let Some(file_path) = &args.filein {
        let mut buffer = String::new();
        if file_path == "-" {
            io::stdin().read_to_string(&mut buffer)?;
        } else {
            File::open(file_path)?.read_to_string(&mut buffer)?;
        }
        Ok(buffer)
    } else if let Some(input_str) = &args.input {
        Ok(input_str.clone())
    } else if !args.direct_input.is_empty() {
        Ok(args.direct_input.join(" "))
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn run_pass(formula: &Formula, args: &Args) -> Result<Formula, FormulaError> {
    Ok(match args.pass {
        Pass::Nnf => formula.negated_normal_form(),
        Pass::Tail => formula.tail_normal_form()?,
        Pass::Simplify => formula.simplify(),
        Pass::Flatten => formula.modal_flatten(),
        Pass::Axiom => formula.axiom_simplify(Axiom::from_id(args.axiom)?, args.depth),
        Pass::Normalize => formula.normalize(),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let input = read_input(&args)?;
    let system = ModalSystem::from(args.system);
    let mut output = String::new();
    for line in input.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let formula = parse(line, system)?;
        let result = run_pass(&formula, &args)?;
        debug!(
            size_before = formula.size(),
            size_after = result.size(),
            "pass finished"
        );
        output.push_str(&result.to_string());
        output.push('\n');
    }
    info!(pass = ?args.pass, ?system, "done");

    match args.fileout.as_deref() {
        Some(file_path) if file_path != "-" => {
            File::create(file_path)?.write_all(output.as_bytes())?
        }
        _ => io::stdout().write_all(output.as_bytes())?,
    }

    Ok(())
}
