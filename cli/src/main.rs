//! text2sql CLI binary: ask questions, run raw completions, render timetables, serve HTTP.
//!
//! Subcommands: `serve`, `ask`, `sql`, `timetable`.

mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{ask, read_input, run_sql, write_timetable, Mode};
use text2sql::{Domain, Settings, TimetableQuery};

#[derive(Parser, Debug)]
#[command(name = "text2sql")]
#[command(about = "text2sql: answer course and teacher questions with generated SQL")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// SQLite database (overrides TEXT2SQL_DATABASE)
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, env = "LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default 127.0.0.1:3278 or TEXT2SQL_ADDR)
    Serve {
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
    /// Ask a question and print the response envelope
    Ask {
        /// teacher, teacher-timetable, course or unified
        #[arg(short, long, default_value = "unified", value_parser = parse_domain)]
        domain: Domain,
        #[arg(short, long, value_enum, default_value = "rows")]
        mode: Mode,
        /// Question text (joined when given as several words)
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Extract SQL from a raw completion and execute it
    Sql {
        /// Raw completion text; read from stdin when omitted or `-`
        input: Option<String>,
        /// Print the extracted SQL without executing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Render a teacher's timetable to a JPEG file
    Timetable {
        /// Teacher name, matched directly (no model call)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        /// Free-text question, answered through the timetable prompt
        #[arg(long, value_name = "TEXT")]
        question: Option<String>,
        #[arg(short, long, default_value = "timetable.jpg")]
        output: PathBuf,
    },
}

fn parse_domain(s: &str) -> Result<Domain, String> {
    s.parse().map_err(|e: text2sql::TemplateError| e.to_string())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", s);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("text2sql", None::<&std::path::Path>).ok();

    let args = Args::parse();
    let _log_guard = logging::init(args.log_file.as_deref())?;

    let mut settings = Settings::from_env();
    if let Some(db) = args.database.clone() {
        settings.database = db;
    }

    match args.cmd {
        Command::Serve { addr } => {
            if let Err(e) = serve::run_serve_with_settings(&settings, addr.as_deref()).await {
                eprintln!("serve error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Ask {
            domain,
            mode,
            question,
        } => {
            let pipeline = settings.build_pipeline()?;
            let out = ask(&pipeline, domain, mode, &question.join(" ")).await;
            print_json(&out, args.pretty)?;
            if out["success"] != true {
                std::process::exit(1);
            }
        }
        Command::Sql { input, dry_run } => {
            let raw = read_input(input)?;
            if dry_run {
                println!("{}", text2sql::extract_sql(&raw).trim());
                return Ok(());
            }
            let executor = settings.build_executor();
            match run_sql(&executor, &raw).await {
                Ok(rows) => {
                    let rows = rows.into_iter().map(serde_json::Value::Object).collect();
                    print_json(&serde_json::Value::Array(rows), args.pretty)?;
                }
                Err(e) => {
                    eprintln!("text2sql: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Timetable {
            name,
            question,
            output,
        } => {
            let pipeline = settings.build_pipeline()?;
            let timetable = settings.build_timetable(pipeline)?;
            let query = TimetableQuery { question, name };
            match write_timetable(&timetable, &query, &output).await {
                Ok(bytes) => eprintln!("wrote {} ({} bytes)", output.display(), bytes),
                Err(e) => {
                    eprintln!("text2sql: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
