use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use clap::{Parser as ClapParser, ValueEnum};
use log::info;

use opforge::bytecode::disasm::{format_image, print_image};
use opforge::{Compiler, Image, Node, ValueSlot, link};

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Compile a JSON syntax tree into op-lines", long_about = None)]
struct Cli {
    /// JSON file holding the top-level statement list
    input: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::Listing)]
    emit: Emit,

    /// Write output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Route top-level results into one shared slot
    #[arg(long)]
    with_context: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Human-readable disassembly
    Listing,
    /// Linked image as JSON
    Json,
    /// Linked image as postcard bytes
    Postcard,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ast = load_ast(&cli.input);
    let context = cli.with_context.then(ValueSlot::new);

    let ops = match Compiler::new().compile(&ast, context.as_ref()) {
        Ok(ops) => ops,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    info!("compiled {} top-level op-lines", ops.len());

    let image = match link(&ops) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    emit(&image, cli.emit, cli.output.as_deref());
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_ast(path: &Path) -> Vec<Node> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", path.display(), e);
            process::exit(1);
        }
    };

    match serde_json::from_str(&source) {
        Ok(ast) => ast,
        Err(e) => {
            eprintln!("Invalid syntax tree in '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn emit(image: &Image, format: Emit, output: Option<&Path>) {
    let bytes = match format {
        Emit::Listing if output.is_none() => {
            print_image(image);
            return;
        }
        Emit::Listing => format_image(image).into_bytes(),
        Emit::Json => match serde_json::to_vec_pretty(image) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Failed to encode image as JSON: {}", e);
                process::exit(1);
            }
        },
        Emit::Postcard => match image.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Failed to encode image: {}", e);
                process::exit(1);
            }
        },
    };

    let written = match output {
        Some(path) => fs::write(path, &bytes),
        None => io::stdout().write_all(&bytes),
    };

    if let Err(e) = written {
        eprintln!("Failed to write output: {}", e);
        process::exit(1);
    }
}
