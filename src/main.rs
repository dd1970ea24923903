use anyhow::Context;
use tracing::info;

use sockline::config::{Config, ServerConfig};
use sockline::http::{HttpClient, Target};
use sockline::net::Resolver;
use sockline::server::echo;

const USAGE: &str = "\
Usage:
    sockline get [<url>]
    sockline echo [<service>]
    sockline resolve <hostname> [<service>]";

enum Command {
    Get { url: String },
    Echo { service: String },
    Resolve { hostname: String, service: Option<String> },
}

impl Command {
    fn from_args(mut args: impl Iterator<Item = String>, cfg: &Config) -> anyhow::Result<Self> {
        let command = match args.next().as_deref() {
            Some("get") => Command::Get {
                url: args.next().unwrap_or_else(|| cfg.client.url.clone()),
            },
            Some("echo") => Command::Echo {
                service: args.next().unwrap_or_else(|| cfg.server.service.clone()),
            },
            Some("resolve") => Command::Resolve {
                hostname: args.next().context(USAGE)?,
                service: args.next(),
            },
            _ => anyhow::bail!("{USAGE}"),
        };

        if args.next().is_some() {
            anyhow::bail!("Too many arguments\n{USAGE}");
        }

        Ok(command)
    }

    fn run(self, cfg: &Config) -> anyhow::Result<()> {
        match self {
            Command::Get { url } => {
                let target = Target::parse(&url)?;
                let mut http = HttpClient::connect(&target.hostname, &target.service)?
                    .buffer_size(cfg.client.buffer_size);

                http.request(&target.path)?;
                let page = http.await_response(cfg.client.include_headers)?;
                println!("Page:\n{page}");
            }

            Command::Echo { service } => {
                let server = ServerConfig {
                    service,
                    ..cfg.server.clone()
                };
                let stats = echo::run(&server)?;
                info!(bytes = stats.bytes_echoed, "Echo server done");
            }

            Command::Resolve { hostname, service } => {
                let resolver = Resolver::new(Some(hostname.as_str()), service.as_deref().unwrap_or("0"), false)?;
                for candidate in resolver {
                    let addr = candidate.address();
                    if addr.port() != 0 {
                        println!("IPv4: {} (port {})", addr.ip(), addr.port());
                    } else {
                        println!("IPv4: {}", addr.ip());
                    }
                }
            }
        }

        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.max_level()?)
        .init();

    let command = Command::from_args(std::env::args().skip(1), &cfg)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async move {
        let work = tokio::task::spawn_blocking(move || command.run(&cfg));

        tokio::select! {
            res = work => {
                res.unwrap_or_else(|e| Err(anyhow::anyhow!("Worker thread failed: {e}")))
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    });

    // A thread blocked in accept/recv cannot be cancelled; exit without it.
    runtime.shutdown_background();
    result
}
