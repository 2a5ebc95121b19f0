use std::net::IpAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tplink_scan::{ClientConfig, ConnectionParams, Router, RouterFactory};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: tplink-scan [host] <username> <password>";

/// Default gateway of the first interface that has one
fn default_gateway() -> Option<IpAddr> {
    netdev::get_interfaces().into_iter().find_map(|interface| {
        let gateway = interface.gateway?;
        gateway
            .ipv4
            .first()
            .map(|ip| IpAddr::V4(*ip))
            .or_else(|| gateway.ipv6.first().map(|ip| IpAddr::V6(*ip)))
    })
}

fn params(args: Vec<String>) -> Result<ConnectionParams> {
    match args.as_slice() {
        [host, username, password] => Ok(ConnectionParams::new(host, username, password)),
        [username, password] => {
            let gateway = default_gateway()
                .ok_or(anyhow!("no default gateway found, pass the router host"))?;
            Ok(ConnectionParams::for_address(gateway, username, password))
        }
        _ => Err(anyhow!(USAGE)),
    }
}

fn config() -> Result<ClientConfig> {
    let config = ClientConfig::default();
    match std::env::var("TPLINK_TIMEOUT_SECS") {
        Ok(secs) => {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid TPLINK_TIMEOUT_SECS {:?}", secs))?;
            Ok(config.with_timeout(Duration::from_secs(secs)))
        }
        Err(_) => Ok(config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let params = params(std::env::args().skip(1).collect())?;
    let host = params.host.clone();
    let factory = RouterFactory::with_config(params, config()?);
    let mut router = factory
        .get_router()
        .await
        .with_context(|| format!("detecting router at {}", host))?;
    eprintln!("Detected {}", router.descriptor());
    let devices = router
        .scan_devices()
        .await
        .with_context(|| format!("scanning devices on {}", host))?;
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}
