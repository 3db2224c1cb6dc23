use minicpp::{
    config::RunConfig,
    pipeline::{check_source, interpret_source},
    runtime::WriterSink,
    tools::{conformance, diagnostics::emit_pipeline_error},
};
use std::{
    env, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

const USAGE: &str = "Usage: minicpp [run|check|test] <file.cpp>... \
[--entry <name>] [--max-call-depth <n>] [--config <path>]";

#[derive(Debug, Default)]
struct Cli {
    command: String,
    inputs: Vec<String>,
    entry: Option<String>,
    max_call_depth: Option<usize>,
    config: Option<PathBuf>,
}

fn main() {
    init_tracing();
    let cli = match parse_args(env::args().skip(1)) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            process::exit(2);
        }
    };
    let code = match execute(&cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("{message}");
            1
        }
    };
    io::stdout().flush().ok();
    process::exit(code);
}

/// Logs go to stderr and only when `RUST_LOG` is set, so program output on
/// stdout stays exactly what the program printed.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Cli, String> {
    let mut cli = Cli {
        command: args.next().ok_or("missing command")?,
        ..Cli::default()
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--entry" => cli.entry = Some(flag_value(&mut args, "--entry")?),
            "--max-call-depth" => {
                let value = flag_value(&mut args, "--max-call-depth")?;
                let depth = value
                    .parse()
                    .map_err(|_| format!("invalid call depth `{value}`"))?;
                cli.max_call_depth = Some(depth);
            }
            "--config" => cli.config = Some(PathBuf::from(flag_value(&mut args, "--config")?)),
            flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
            _ => cli.inputs.push(arg),
        }
    }
    Ok(cli)
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("`{flag}` needs a value"))
}

fn execute(cli: &Cli) -> Result<i32, String> {
    let config = match &cli.config {
        Some(path) => RunConfig::load(path),
        None => RunConfig::discover(Path::new(".")),
    }
    .map_err(|err| err.to_string())?;

    let mut options = config.run_options();
    if let Some(entry) = &cli.entry {
        options.entry = entry.clone();
    }
    if cli.max_call_depth.is_some() {
        options.max_call_depth = cli.max_call_depth;
    }

    match cli.command.as_str() {
        "run" => {
            let (name, source) = read_single_input(cli)?;
            let stdout = io::stdout();
            let mut sink = WriterSink::new(stdout.lock());
            match interpret_source(&source, &options, &mut sink) {
                // Exit statuses carry the low byte of `main`'s result.
                Ok(code) => Ok((code & 0xff) as i32),
                Err(err) => {
                    emit_pipeline_error(&name, &source, &err);
                    Ok(1)
                }
            }
        }
        "check" => {
            let (name, source) = read_single_input(cli)?;
            match check_source(&source, &options.entry) {
                Ok(_) => {
                    println!("{name}: ok");
                    Ok(0)
                }
                Err(err) => {
                    emit_pipeline_error(&name, &source, &err);
                    Ok(1)
                }
            }
        }
        "test" => conformance::run_tests(&config.test.dir, &cli.inputs, &options).map(|_| 0),
        other => Err(format!("unknown command `{other}`\n{USAGE}")),
    }
}

fn read_single_input(cli: &Cli) -> Result<(String, String), String> {
    let [path] = cli.inputs.as_slice() else {
        return Err(format!("`{}` takes exactly one file\n{USAGE}", cli.command));
    };
    let source =
        fs::read_to_string(path).map_err(|e| format!("Could not read {path}: {e}"))?;
    Ok((path.clone(), source))
}
