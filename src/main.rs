//! CLI tool to inspect and compile SQL scripts with directive blocks.

use std::fs;
use std::process::ExitCode;

use sqlm::{CompileOptions, Compiler, Environment, FsLoader, Migrations, Recompiler};
use tracing_subscriber::EnvFilter;

fn usage() -> ExitCode {
    eprintln!("Usage: sqlm <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  parse <files...>        Print the directive block of each script");
    eprintln!("  compile <file>          Compile a script and print it to stdout");
    eprintln!("  watch <input> <output>  Recompile input into output on every write");
    eprintln!();
    eprintln!("Options (compile, watch):");
    eprintln!("  --env <dev|prod|local|int>  Target environment (default: dev)");
    eprintln!("  --set <key=value>           Override a keyword, repeatable");
    eprintln!("  --migrations <file.json>    Migration records per environment");
    eprintln!();
    eprintln!("Nested sqlmfile paths resolve against the current directory.");
    eprintln!("Set SQLM_LOG (e.g. SQLM_LOG=debug) to control diagnostics.");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("SQLM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        return usage();
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "parse" => parse_files(rest),
        "compile" | "watch" => {
            let (positional, options) = match parse_options(rest) {
                Ok(parsed) => parsed,
                Err(msg) => {
                    eprintln!("Error: {msg}");
                    return ExitCode::from(2);
                }
            };
            if command == "compile" {
                compile_file(&positional, &options)
            } else {
                watch_file(&positional, options)
            }
        }
        _ => {
            eprintln!("Unknown command: {command}");
            usage()
        }
    }
}

fn parse_files(files: &[String]) -> ExitCode {
    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;
    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };
        match sqlm::parse(&content) {
            Ok(d) => {
                let nested: usize = Environment::ALL
                    .into_iter()
                    .map(|env| d.env(env).nested.len())
                    .sum();
                eprintln!("{path}: valid ({nested} nested reference(s))");
                print!("{}", sqlm::format(&d));
            }
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn parse_options(args: &[String]) -> Result<(Vec<String>, CompileOptions), String> {
    let mut positional = Vec::new();
    let mut options = CompileOptions::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--env" => {
                let value = iter.next().ok_or("--env needs a value")?;
                let env = value
                    .parse::<Environment>()
                    .map_err(|e| e.to_string())?;
                options = options.env(env);
            }
            "--set" => {
                let value = iter.next().ok_or("--set needs key=value")?;
                let (key, val) = value
                    .split_once('=')
                    .ok_or_else(|| format!("--set expects key=value, got '{value}'"))?;
                options = options.set(key, val);
            }
            "--migrations" => {
                let path = iter.next().ok_or("--migrations needs a file")?;
                let json = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
                let migrations = Migrations::from_json(&json)
                    .map_err(|e| format!("{path}: {}", sqlm::Error::from(e)))?;
                options = options.migrations(migrations);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ => positional.push(arg.clone()),
        }
    }
    Ok((positional, options))
}

fn compile_file(positional: &[String], options: &CompileOptions) -> ExitCode {
    let [path] = positional else {
        eprintln!("Error: compile takes exactly one file");
        return ExitCode::from(2);
    };

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    match sqlm::compile(&content, options) {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn watch_file(positional: &[String], options: CompileOptions) -> ExitCode {
    let [input, output] = positional else {
        eprintln!("Error: watch takes an input and an output file");
        return ExitCode::from(2);
    };

    let recompiler = Recompiler::new(Compiler::new(FsLoader::new(".")), options, input, output);
    if let Err(e) = recompiler.recompile() {
        eprintln!("{input}: {e}");
    }
    match recompiler.watch() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{input}: {}", sqlm::Error::from(e));
            ExitCode::FAILURE
        }
    }
}
