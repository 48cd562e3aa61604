//! Lock-step RPC demo.
//!
//! ```text
//! lockstep-rpc serve [--max-requests N]     registers add, minus; serves TCP
//! lockstep-rpc call                         add(2, 3), minus(1000, 1)
//! ```
//!
//! Both take `--config <file.json>` (see [`RpcConfig`]); `RUST_LOG`
//! controls log output.
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use lockstep_rpc::config::RpcConfig;
use lockstep_rpc::invoke;
use lockstep_rpc::rpc::{Client, ServiceRegistry, Server, TcpAcceptor};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file; missing fields take their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve `add` and `minus` on the configured bind address
    Serve {
        /// Stop after this many handled requests
        #[arg(long)]
        max_requests: Option<u64>,
    },
    /// Call `add(2, 3)` and `minus(1000, 1)` on the configured server
    Call,
}

fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

/// Stateful service object; `minus` is exposed as a bound method.
struct Calculator {
    name: &'static str,
}

impl Calculator {
    fn minus(&self, a: i32, b: i32) -> i32 {
        info!("{}: minus({}, {})", self.name, a, b);
        a.wrapping_sub(b)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RpcConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RpcConfig::default(),
    };

    match cli.command {
        Commands::Serve { max_requests } => serve(&config, max_requests),
        Commands::Call => call(&config),
    }
}

fn serve(config: &RpcConfig, max_requests: Option<u64>) -> Result<()> {
    let calculator = Calculator { name: "calculator" };

    let mut registry = ServiceRegistry::new();
    registry.register("add", add);
    registry.register_method("minus", &calculator, Calculator::minus);
    info!("services: {:?}", registry.service_ids());

    let mut server = Server::new(registry);
    if let Some(limit) = max_requests {
        server = server.with_request_limit(limit);
    }

    let acceptor = TcpAcceptor::bind(config).context("binding listener")?;
    let exit = server.serve_tcp(&acceptor)?;
    info!(
        "server exited ({:?}) after {} requests",
        exit,
        server.requests_handled()
    );
    Ok(())
}

fn call(config: &RpcConfig) -> Result<()> {
    let mut client = Client::connect(config)
        .with_context(|| format!("connecting to {}", config.connect_addr))?;

    let sum: i32 = invoke!(client, "add", 2i32, 3i32)?;
    println!("add(2, 3) = {sum}");

    let diff: i32 = invoke!(client, "minus", 1000i32, 1i32)?;
    println!("minus(1000, 1) = {diff}");
    Ok(())
}
