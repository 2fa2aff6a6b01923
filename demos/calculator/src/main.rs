//! # Calculator JSON-RPC Demo
//!
//! Serves a `Calculator` class and the `Class` greeter over TCP, and doubles
//! as a one-shot client for calling them.
//!
//! ## Usage
//! ```bash
//! # Start the server
//! cargo run --package calculator -- serve --port 6342
//!
//! # Call a method; parameters are parsed as JSON, falling back to strings
//! cargo run --package calculator -- call Calculator.Add 2 40
//! cargo run --package calculator -- call Class.ReturnString
//! cargo run --package calculator -- call Calculator.Echo hello
//! ```
//!
//! ## Equivalent netcat session
//! ```bash
//! echo '{"jsonrpc":"2.0","method":"Calculator.Divide","params":[1,0],"id":1}' | nc localhost 6342
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use turul_jsonrpc2::prelude::*;
use turul_jsonrpc2::codec::DEFAULT_MAX_MESSAGE_SIZE;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the JSON-RPC server
    Serve {
        /// Host to bind
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "6342")]
        port: u16,

        /// Largest accepted request in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
        max_message_size: usize,

        /// Close a connection when a response cannot be written
        #[arg(long, default_value = "false")]
        close_on_write_error: bool,
    },
    /// Send one call and print the response
    Call {
        /// Server address
        #[arg(long, default_value = "localhost:6342")]
        addr: String,

        /// Call string of the form Class.Method
        method: String,

        /// Positional parameters
        params: Vec<String>,
    },
}

#[derive(Default)]
pub struct Calculator;

#[rpc_class]
impl Calculator {
    pub fn add(&self, a: f64, b: f64) -> f64 {
        a + b
    }

    pub fn subtract(&self, a: f64, b: f64) -> f64 {
        a - b
    }

    pub fn divide(&self, a: f64, b: f64) -> Result<f64, String> {
        if b == 0.0 {
            return Err("division by zero".to_string());
        }
        Ok(a / b)
    }

    pub fn echo(&self, value: Value) -> Value {
        value
    }
}

#[derive(Default)]
pub struct Class;

#[rpc_class]
impl Class {
    pub fn return_string(&self) -> String {
        "Hello, World!".to_string()
    }
}

/// Parse a command-line parameter as JSON, or take it verbatim as a string
fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn serve(
    host: String,
    port: u16,
    max_message_size: usize,
    close_on_write_error: bool,
) -> Result<()> {
    let write_failure = if close_on_write_error {
        WriteFailurePolicy::Close
    } else {
        WriteFailurePolicy::LogAndContinue
    };
    let config = ServerConfig::default()
        .with_host(host)
        .with_max_message_size(max_message_size)
        .with_write_failure(write_failure);

    let server = Server::with_config(config);
    server.register(Calculator);
    server.register(Class);

    info!("Registered classes: {:?}", server.registered_classes());
    server.listen(port).await?;
    Ok(())
}

async fn call(addr: String, method: String, params: Vec<String>) -> Result<()> {
    let mut client = Client::dial(&addr)
        .await
        .with_context(|| format!("Failed to connect to {}", addr))?;

    let params = params.iter().map(|raw| parse_param(raw)).collect();
    let response = client.call(&method, params).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match args.command {
        Command::Serve {
            host,
            port,
            max_message_size,
            close_on_write_error,
        } => serve(host, port, max_message_size, close_on_write_error).await,
        Command::Call {
            addr,
            method,
            params,
        } => call(addr, method, params).await,
    }
}
