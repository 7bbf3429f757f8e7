//! KevaDB command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session
//! keva -H localhost -p 3223
//!
//! # Execute a single command
//! keva -c "SET greeting hello"
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::runtime::Runtime;

use keva_net::{TcpClient, TcpClientOptions};

/// KevaDB command-line client
#[derive(Parser, Debug)]
#[command(
    name = "keva",
    version,
    about = "Command-line client for KevaDB",
    long_about = "Interactive client for KevaDB.\n\n\
                  Commands: SET <key> <value>, GET <key>, DEL <key>."
)]
struct Args {
    /// Server hostname
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "KEVA_HOST")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = 3223, env = "KEVA_PORT")]
    port: u16,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Round-trip timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = Runtime::new().context("failed to start runtime")?;
    let address = format!("{}:{}", args.host, args.port);
    let options =
        TcpClientOptions::default().with_idle_timeout(Duration::from_millis(args.timeout_ms));

    let mut client = runtime
        .block_on(TcpClient::connect(&address, options))
        .with_context(|| format!("failed to connect to {address}"))?;

    if let Some(command) = args.command {
        let response = runtime.block_on(client.send(command.trim().as_bytes()))?;
        println!("{}", String::from_utf8_lossy(&response));
        return Ok(());
    }

    println!("connected to {address}; type 'exit' to quit");
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("keva> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }

                editor.add_history_entry(line)?;
                match runtime.block_on(client.send(line.as_bytes())) {
                    Ok(response) => println!("{}", String::from_utf8_lossy(&response)),
                    Err(err) => {
                        eprintln!("error: {err}");
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
