use std::{fs, process::ExitCode};

use anyhow::{bail, Context};

use vena::{backend::RenderBackend, config::Config, errors::CompileError};

enum Mode {
    Tree,
    Emit,
    Compile,
}

fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: vena <file> [--tree | --emit | --compile]");
    };
    let mode = match args.next().as_deref() {
        None | Some("--emit") => Mode::Emit,
        Some("--tree") => Mode::Tree,
        Some("--compile") => Mode::Compile,
        Some(other) => bail!("unknown option '{other}'"),
    };

    let source = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;

    let result = match mode {
        Mode::Tree => vena::print_tree(&source, &path),
        Mode::Emit => vena::emit(&source, &path).map(|unit| unit.to_string()),
        Mode::Compile => {
            let mut backend = RenderBackend::default();
            vena::compile(&source, &path, &mut backend, &config)
                .map(|_| backend.last.unwrap_or_default())
        }
    };

    match result {
        Ok(output) => {
            print!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report(err: &CompileError) {
    for diagnostic in err.diagnostics() {
        eprintln!("{diagnostic}");
    }
    eprintln!("{err}");
}
