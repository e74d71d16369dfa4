use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use num_traits::ToPrimitive;
use plcparse::runtime::Value;
use plcparse::{analyzer, interpreter, lexer, parser};

fn main() -> Result<ExitCode> {
    let mut args = std::env::args().skip(1);
    let mut input_path: Option<String> = None;
    if let Some(arg) = args.next() {
        input_path = Some(arg);
        if args.next().is_some() {
            bail!("Only one input file is supported");
        }
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let tokens = lexer::lex(&source)?;
    let program = parser::parse(tokens)?;
    analyzer::analyze(&program)?;
    let evaluation = interpreter::evaluate(&program)?;
    for line in &evaluation.output {
        println!("{line}");
    }
    Ok(exit_code(&evaluation.value))
}

/// `main/0` returns an Integer; narrow it into the exit-code range.
fn exit_code(value: &Value) -> ExitCode {
    let Value::Integer(result) = value else {
        return ExitCode::SUCCESS;
    };
    ExitCode::from(result.to_u8().unwrap_or(u8::MAX))
}
