//! queued CLI Client
//!
//! Command-line interface for interacting with a queued daemon.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use queued_client::{Client, ClientConfig, QueueError};
use tracing_subscriber::{fmt, EnvFilter};

/// queued CLI
#[derive(Parser, Debug)]
#[command(name = "queued-cli")]
#[command(about = "CLI for the queued job-queue daemon")]
#[command(version)]
struct Args {
    /// Daemon address (host:port)
    #[arg(short, long)]
    server: String,

    /// Authenticate as this user before running the command
    #[arg(short, long, requires = "pass")]
    user: Option<String>,

    /// Password for --user
    #[arg(short, long, requires = "user")]
    pass: Option<String>,

    /// Read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "0")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the daemon
    Ping,

    /// Submit a job that is ready immediately
    Push {
        queue: String,
        priority: u32,
        /// Job body (read from stdin when omitted)
        job: Option<String>,
    },

    /// Submit a job that becomes ready after a delay
    Delay {
        queue: String,
        priority: u32,
        /// Delay in seconds
        delay: u64,
        /// Job body (read from stdin when omitted)
        job: Option<String>,
    },

    /// Submit a job that becomes ready at an absolute time
    Timer {
        queue: String,
        priority: u32,
        /// Absolute time, as YYYY-MM-DD/hh:mm:ss
        time: String,
        /// Job body (read from stdin when omitted)
        job: Option<String>,
    },

    /// Submit a job with the enqueue verb
    Enqueue {
        queue: String,
        priority: u32,
        /// Delay in seconds
        #[arg(short, long, default_value = "0")]
        delay: u64,
        /// Job body (read from stdin when omitted)
        job: Option<String>,
    },

    /// Take the next job off a queue
    Pop { queue: String },

    /// Take the next job off a queue with the dequeue verb
    Dequeue { queue: String },

    /// Take the next job off a queue with the watch verb
    Watch { queue: String },

    /// Take the next job and hold it for recycling
    Touch { queue: String },

    /// Take the next job and hold it for recycling, with the fetch verb
    Fetch { queue: String },

    /// Return a touched job to its queue
    Recycle {
        recycle_id: u64,
        priority: u32,
        /// Delay in seconds
        #[arg(default_value = "0")]
        delay: u64,
    },

    /// Delete a queue
    Remove { queue: String },

    /// Show the number of jobs in a queue
    Qsize { queue: String },

    /// Show the number of jobs in a queue, with the size verb
    Size { queue: String },

    /// Run a function registered on the daemon
    Exec {
        function: String,
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,queued_client=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            if e.is_fatal() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn run(args: Args) -> Result<(), QueueError> {
    let config = ClientConfig::builder()
        .addr(&args.server)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build()?;

    let mut client = Client::connect(config)?;
    tracing::debug!("queued-cli v{} connected to {}", queued_client::VERSION, client.peer_addr());

    if let (Some(user), Some(pass)) = (&args.user, &args.pass) {
        client.auth(user, pass)?;
    }

    let mut out = io::stdout().lock();

    match args.command {
        Commands::Ping => {
            if !client.ping()? {
                return Err(QueueError::Server("ping rejected".to_string()));
            }
            writeln!(out, "PONG")?;
        }
        Commands::Push { queue, priority, job } => {
            client.push(&queue, priority, &job_body(job)?)?;
            writeln!(out, "OK")?;
        }
        Commands::Delay { queue, priority, delay, job } => {
            client.delay(&queue, priority, delay, &job_body(job)?)?;
            writeln!(out, "OK")?;
        }
        Commands::Timer { queue, priority, time, job } => {
            client.timer(&queue, priority, &time, &job_body(job)?)?;
            writeln!(out, "OK")?;
        }
        Commands::Enqueue { queue, priority, delay, job } => {
            client.enqueue(&queue, priority, delay, &job_body(job)?)?;
            writeln!(out, "OK")?;
        }
        Commands::Pop { queue } => out.write_all(&client.pop(&queue)?)?,
        Commands::Dequeue { queue } => out.write_all(&client.dequeue(&queue)?)?,
        Commands::Watch { queue } => out.write_all(&client.watch(&queue)?)?,
        Commands::Touch { queue } => {
            let touched = client.touch(&queue)?;
            writeln!(out, "{}", touched.recycle_id)?;
            out.write_all(&touched.job)?;
        }
        Commands::Fetch { queue } => {
            let touched = client.fetch(&queue)?;
            writeln!(out, "{}", touched.recycle_id)?;
            out.write_all(&touched.job)?;
        }
        Commands::Recycle { recycle_id, priority, delay } => {
            client.recycle(recycle_id, priority, delay)?;
            writeln!(out, "OK")?;
        }
        Commands::Remove { queue } => {
            client.remove(&queue)?;
            writeln!(out, "OK")?;
        }
        Commands::Qsize { queue } => writeln!(out, "{}", client.qsize(&queue)?)?,
        Commands::Size { queue } => writeln!(out, "{}", client.size(&queue)?)?,
        Commands::Exec { function, args } => {
            client.exec(&function, &args)?;
            writeln!(out, "OK")?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Job body from the argument, or all of stdin
fn job_body(arg: Option<String>) -> Result<Vec<u8>, QueueError> {
    match arg {
        Some(job) => Ok(job.into_bytes()),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
