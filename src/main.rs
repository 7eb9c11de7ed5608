use log::{debug, info};
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use zcore::config::RunConfig;
use zcore::interpreter::{Interpreter, RunOutcome};
use zcore::opcode_tables;
use zcore::trace::LoggingObserver;
use zcore::vm::{Game, VM};

fn print_usage(program: &str) {
    println!("zcore - decode-and-dispatch core for Z-machine story files");
    println!();
    println!(
        "Usage: {} <story-file> [--steps N] [--trace] [--config FILE] [--header] [--coverage]",
        program
    );
    println!();
    println!("  --steps N       stop after N instructions");
    println!("  --trace         log every instruction, store and call");
    println!("  --config FILE   read settings from a TOML file");
    println!("  --header        print the story header and exit");
    println!("  --coverage      list the opcodes this core executes and exit");
    println!();
    println!("RUST_LOG controls log verbosity, e.g. RUST_LOG=debug");
}

struct Options {
    story: String,
    steps: Option<u64>,
    trace: bool,
    config: Option<String>,
    header: bool,
    coverage: bool,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        story: args[1].clone(),
        steps: None,
        trace: false,
        config: None,
        header: false,
        coverage: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--steps" => {
                let value = args.get(i + 1).ok_or("--steps needs a number")?;
                options.steps = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid step count: {}", value))?,
                );
                i += 1;
            }
            "--config" => {
                let value = args.get(i + 1).ok_or("--config needs a file name")?;
                options.config = Some(value.clone());
                i += 1;
            }
            "--trace" => options.trace = true,
            "--header" => options.header = true,
            "--coverage" => options.coverage = true,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }
    Ok(options)
}

/// Read the whole story file, explaining the common failures
fn read_story(path: &str) -> Vec<u8> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            match e.kind() {
                std::io::ErrorKind::NotFound => {
                    eprintln!("Error: Story file not found: {}", path);
                    eprintln!();
                    eprintln!("Please check:");
                    eprintln!("• File path is correct");
                    eprintln!("• You're running from the right directory");
                }
                std::io::ErrorKind::PermissionDenied => {
                    eprintln!("Error: Permission denied accessing story file: {}", path);
                }
                _ => {
                    eprintln!("Error: Cannot open story file '{}': {}", path, e);
                }
            }
            std::process::exit(1);
        }
    };
    let mut data = Vec::new();
    if let Err(e) = file.read_to_end(&mut data) {
        eprintln!("Error: Cannot read story file '{}': {}", path, e);
        std::process::exit(1);
    }
    data
}

fn print_coverage(version: u8) {
    if let Err(problems) = opcode_tables::verify_dispatch_table(version) {
        for problem in &problems {
            println!("Dispatch table problem: {}", problem);
        }
    }
    let report = opcode_tables::coverage(version);
    let implemented = report.iter().filter(|e| e.implemented).count();
    println!(
        "V{} opcodes: {} of {} implemented",
        version,
        implemented,
        report.len()
    );
    for entry in &report {
        println!(
            "  {}:{:02x} {:<16} {}",
            entry.count,
            entry.number,
            entry.name,
            if entry.implemented { "yes" } else { "-" }
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // No story file is a request for help, not an error
    if args.len() < 2 {
        print_usage(args.first().map(String::as_str).unwrap_or("zcore"));
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
    };

    let config = match &options.config {
        Some(path) => RunConfig::load(Path::new(path))?,
        None => RunConfig::default(),
    };

    // Tracing is logged at info level, so it raises the default
    let trace = options.trace || config.trace;
    let default_filter = match config.log_level.as_deref() {
        Some(level) => level,
        None if trace => "info",
        None => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    debug!("Loading story file: {}", options.story);
    let game = match Game::from_memory(read_story(&options.story)) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: '{}' is not a usable story file: {}", options.story, e);
            std::process::exit(1);
        }
    };

    if options.header {
        print!("{}", game.header);
        let computed = game.memory.checksum(game.header.file_size());
        println!(
            "Computed checksum:        {:#06x} ({})",
            computed,
            if computed == game.header.checksum_file {
                "matches"
            } else {
                "MISMATCH"
            }
        );
        return Ok(());
    }

    if options.coverage {
        print_coverage(game.header.version);
        return Ok(());
    }

    let mut interpreter = Interpreter::new(VM::new(game));
    if trace {
        interpreter.set_observer(Box::new(LoggingObserver::new()));
    }

    let step_limit = options.steps.or(config.step_limit);
    info!(
        "V{} story, initial PC {:05x}",
        interpreter.vm.version(),
        interpreter.vm.pc
    );

    match interpreter.run_with_limit(step_limit) {
        Ok(RunOutcome::Quit { instructions }) => {
            println!("Story quit after {} instructions.", instructions);
            Ok(())
        }
        Ok(RunOutcome::StepLimitReached { instructions }) => {
            println!(
                "Stopped after {} instructions at PC {:05x}.",
                instructions, interpreter.vm.pc
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError during execution: {}", e);
            Err(e.into())
        }
    }
}
