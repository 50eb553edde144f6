use minisql::database::DatabaseEngine;
use minisql::logger::{FileLogger, Logger};
use minisql::vm::Row;
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

const DB_FILE: &str = "example.db";
const LOG_FILE: &str = "minisql.log";

fn main() -> ExitCode {
    let logger: Rc<dyn Logger> = match FileLogger::open(LOG_FILE) {
        Ok(file_logger) => Rc::new(file_logger),
        Err(_) => minisql::logger::null(),
    };

    let mut engine = match DatabaseEngine::with_logger(DB_FILE, logger) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = env::args().collect();
    let status = match args.get(1) {
        Some(path) => run_script(&mut engine, path),
        None => run_repl(&mut engine),
    };

    if let Err(err) = engine.close() {
        eprintln!("Error: {}", err);
    }
    status
}

/// Executes every statement in the file in order. Statements are split
/// on `;`, with the terminator re-appended before execution.
fn run_script(engine: &mut DatabaseEngine, path: &str) -> ExitCode {
    if !Path::new(path).is_file() {
        eprintln!("Error: file '{}' does not exist", path);
        return ExitCode::FAILURE;
    }

    let script = match fs::read_to_string(path) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("Error: failed to read '{}': {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    println!("Executing SQL script from {}", path);
    let statements = script
        .split(';')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty());
    for (index, statement) in statements.enumerate() {
        println!("\n>> Statement {}: {}", index + 1, statement);
        run_statement(engine, &format!("{};", statement));
    }

    ExitCode::SUCCESS
}

fn run_repl(engine: &mut DatabaseEngine) -> ExitCode {
    println!("minisql - SQL engine");
    println!("Type 'exit' to quit\n");

    let stdin = io::stdin();
    loop {
        print!("minisql> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        run_statement(engine, query);
    }

    ExitCode::SUCCESS
}

/// Engine errors are printed and the driver keeps going; a statement
/// either yields a full result or an error, never part of one.
fn run_statement(engine: &mut DatabaseEngine, query: &str) {
    match engine.execute(query) {
        Ok(Some(rows)) => {
            if rows.is_empty() {
                println!("No results.");
            } else {
                for row in &rows {
                    println!("{}", render_row(row));
                }
            }
        }
        Ok(None) => println!("OK"),
        Err(err) => eprintln!("Error: {}", err),
    }
}

fn render_row(row: &Row) -> String {
    let mut columns: Vec<&String> = row.keys().collect();
    columns.sort();
    columns
        .iter()
        .map(|column| format!("{}={}", column, row[*column]))
        .collect::<Vec<_>>()
        .join(", ")
}
