//! derivesubnet command - print an interface's address, gateway and subnet.

use std::time::Duration;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use nlsubnet::{Family, NetworkDevice, Resolver, ResolverConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "derivesubnet",
    version,
    about = "Derive the address, default gateway and subnet of a network interface",
    group(ArgGroup::new("family").required(true).args(["ipv4", "ipv6"]))
)]
struct Cli {
    /// IPv4: address/cidr, gateway, routing prefix/cidr.
    #[arg(short = '4')]
    ipv4: bool,

    /// IPv6: global address/cidr, link-local address, gateway, subnet/64.
    #[arg(short = '6')]
    ipv6: bool,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, requires = "json")]
    pretty: bool,

    /// Receive timeout for each kernel exchange, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    timeout: u64,

    /// Interface name.
    #[arg(value_name = "IF_NAME")]
    interface: String,
}

impl Cli {
    fn family(&self) -> Family {
        if self.ipv6 { Family::V6 } else { Family::V4 }
    }
}

fn main() {
    // RUST_LOG wins when set; otherwise only warnings and errors.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        match e.downcast_ref::<nlsubnet::Error>() {
            Some(err) if err.is_not_found() => eprintln!("{}", err),
            _ => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start runtime")?;

    let config = ResolverConfig::default().with_recv_timeout(Duration::from_millis(cli.timeout));
    let family = cli.family();

    let device = runtime.block_on(async {
        Resolver::new(config).resolve(&cli.interface, family).await
    })?;

    if cli.json {
        let value = json_report(&device, family);
        let out = if cli.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        println!("{}", out);
    } else {
        for line in device.report(family) {
            println!("{}", line);
        }
    }

    Ok(())
}

fn json_report(device: &NetworkDevice, family: Family) -> serde_json::Value {
    let subnet = match family {
        Family::V4 => device
            .ipv4()
            .and_then(|c| c.subnet())
            .map(|s| s.to_string()),
        Family::V6 => device.ipv6_global().map(|c| c.subnet().to_string()),
    };

    serde_json::json!({
        "family": family,
        "device": device,
        "subnet": subnet,
    })
}
