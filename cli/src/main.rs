mod test_runner;

use std::io::Read;
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use planparse::{ParseOptions, Plan};

const SUBCOMMANDS: &[&str] = &["parse", "test", "help"];

#[derive(Parser)]
#[command(name = "planparse", version, about = "Planner pseudocode to instruction list")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log each recognized line (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a pseudocode file into instructions
    Parse(ParseArgs),

    /// Run .test.plan fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Pseudocode file to parse, or `-` for stdin
    file: String,

    /// Print instructions as JSON
    #[arg(long)]
    json: bool,

    /// Parse only (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Skip dict entries without a `:` instead of failing
    #[arg(long)]
    lenient_dicts: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.plan file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // Backwards compatibility: if the first positional arg is not a known
    // subcommand, inject "parse" so `planparse plan.py` works.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first_pos) = args.iter().skip(1).find(|a| !a.starts_with('-') || a.as_str() == "-") {
        let first_pos = first_pos.clone();
        if !SUBCOMMANDS.contains(&first_pos.as_str()) {
            if let Some(pos) = args.iter().skip(1).position(|a| *a == first_pos) {
                args.insert(pos + 1, "parse".to_string());
            }
        }
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Parse(parse_args) => do_parse(parse_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "planparse=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(file)
    }
}

fn do_parse(args: ParseArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match read_source(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let options = ParseOptions {
        lenient_dicts: args.lenient_dicts,
    };
    tracing::debug!(file = %args.file, ?options, "parsing");
    let parser = planparse::Parser::with_options(source, file_id, options);
    let plan = match parser.parse() {
        Ok(p) => p,
        Err(error) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            let diagnostic = error.to_diagnostic();
            let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            process::exit(1);
        }
    };

    if args.check {
        eprintln!(
            "ok: {} parsed successfully ({} steps)",
            args.file,
            plan.instructions.len()
        );
        return;
    }

    if args.json {
        match serde_json::to_string_pretty(&plan.instructions) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize instructions: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    print_plan(&plan);
}

fn print_plan(plan: &Plan) {
    if plan.instructions.is_empty() {
        println!("(no instructions)");
        return;
    }
    for instruction in &plan.instructions {
        println!("{}", instruction);
        println!("---");
    }
    println!("{} step(s)", plan.instructions.len());
}
