use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "bastion", version, about = "Bastion policy CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file and print what it declares.
    Check {
        /// Path to the configuration file
        #[arg(short, long, default_value = "bastion.yaml", env = "BASTION_CONFIG")]
        config: PathBuf,
    },

    /// Check a SQL statement against the tenant isolation policy.
    CheckSql {
        #[arg(short, long, default_value = "bastion.yaml", env = "BASTION_CONFIG")]
        config: PathBuf,

        /// Tenant of the simulated request
        #[arg(long)]
        tenant: Option<String>,

        /// The statement to check
        #[arg(long)]
        sql: String,

        /// Bound parameters as JSON: an array for positional binds, an object
        /// for named ones
        #[arg(long)]
        params: Option<String>,

        /// Check inside an IDOR-disabled scope
        #[arg(long, default_value_t = false)]
        idor_disabled: bool,
    },

    /// Print the route template of each path.
    Normalize {
        #[arg(short, long, env = "BASTION_CONFIG")]
        config: Option<PathBuf>,

        /// Paths or URLs to normalize
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Send a burst of simulated requests through the request checkpoint.
    Simulate {
        #[arg(short, long, default_value = "bastion.yaml", env = "BASTION_CONFIG")]
        config: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        ip: String,

        #[arg(long, default_value = "")]
        user_agent: String,

        /// Rate-limit group of the requests
        #[arg(long)]
        group: Option<String>,

        /// User id attached to the requests
        #[arg(long)]
        user: Option<String>,

        #[arg(long, default_value = "GET")]
        method: String,

        #[arg(long, default_value = "/")]
        path: String,

        /// Number of requests to send
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Check { config } => commands::check::run(&config)?,

        Command::CheckSql {
            config,
            tenant,
            sql,
            params,
            idor_disabled,
        } => commands::sql::run(
            &config,
            &commands::sql::SqlCheck {
                tenant,
                sql,
                params,
                idor_disabled,
            },
        )?,

        Command::Normalize { config, paths } => commands::normalize::run(config.as_deref(), &paths)?,

        Command::Simulate {
            config,
            ip,
            user_agent,
            group,
            user,
            method,
            path,
            count,
        } => commands::simulate::run(
            &config,
            &commands::simulate::Simulation {
                ip,
                user_agent,
                group,
                user,
                method,
                path,
                count,
            },
        )?,
    }

    Ok(())
}
