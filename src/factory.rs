//! Firmware detection

use tracing::{debug, info};

use crate::config::{ClientConfig, ConnectionParams};
use crate::error::{Error, Result};
use crate::http::{TcpTransport, Transport};
use crate::routers::{Router, TpLinkRouter, Variant};

/// Detects which firmware a router runs and hands out a matching [`Router`]
pub struct RouterFactory<T = TcpTransport> {
    params: ConnectionParams,
    transport: T,
}

impl RouterFactory<TcpTransport> {
    pub fn new(params: ConnectionParams) -> Self {
        Self::with_config(params, ClientConfig::default())
    }

    pub fn with_config(params: ConnectionParams, config: ClientConfig) -> Self {
        Self::with_transport(params, TcpTransport::new(config))
    }
}

impl<T: Transport + Clone> RouterFactory<T> {
    pub fn with_transport(params: ConnectionParams, transport: T) -> Self {
        Self { params, transport }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Probes every known variant in priority order and returns the first
    /// that answers. Never falls back to a guess.
    pub async fn get_router(&self) -> Result<TpLinkRouter<T>> {
        let mut attempts = Vec::new();
        for variant in Variant::ALL {
            let mut router = variant.connect(self.params.clone(), self.transport.clone());
            debug!("Probing {} as {}", self.params.host, router.descriptor());
            match router.probe().await {
                Ok(()) => {
                    info!("Detected {} at {}", router.descriptor(), self.params.host);
                    return Ok(router);
                }
                Err(err) => {
                    debug!("{} rejected: {}", variant, err);
                    attempts.push((variant, err.to_string()));
                }
            }
        }
        Err(Error::Detection {
            host: self.params.host.clone(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::testing::{params, FixtureTransport};

    const TABLE: &str = "[1,0,0,0,0,0]0\r\nIPAddress=192.168.0.100\r\nMACAddress=AA:BB:CC:DD:EE:FF\r\nhostName=laptop\r\n[error]0\r\n";

    #[tokio::test]
    async fn nothing_answering_is_detection_error() {
        let factory = RouterFactory::with_transport(params(), FixtureTransport::new());
        match factory.get_router().await {
            Err(Error::Detection { host, attempts }) => {
                assert_eq!(host, "192.168.0.1");
                let tried: Vec<Variant> = attempts.iter().map(|(variant, _)| *variant).collect();
                assert_eq!(tried, Variant::ALL);
            }
            other => panic!("expected detection error, got {:?}", other.map(|r| r.variant())),
        }
    }

    #[tokio::test]
    async fn ambiguous_responses_match_nothing() {
        let mut transport = FixtureTransport::new();
        for path in [
            "/",
            "/data/monitor.client.client.json",
            "/userRpm/LoginRpm.htm",
            "/cgi-bin/luci/;stok=/login",
            "/cgi",
            "/data/map_access_wireless_client_grid.json",
            "/userRpm/WlanStationRpm.htm",
        ] {
            transport = transport
                .get(path, Response::new(200, "OK"))
                .post(path, Response::new(200, "OK"));
        }
        let factory = RouterFactory::with_transport(params(), transport);
        assert!(matches!(
            factory.get_router().await,
            Err(Error::Detection { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_detection_error() {
        let factory = RouterFactory::with_transport(params(), FixtureTransport::offline());
        let err = factory.get_router().await.err().unwrap();
        assert!(err.to_string().contains("connection refused"));
        assert!(matches!(err, Error::Detection { .. }));
    }

    #[tokio::test]
    async fn first_matching_variant_wins() {
        // Both the C20 host table and the legacy station page answer
        let transport = FixtureTransport::new()
            .post("/cgi", Response::new(200, TABLE))
            .get(
                "/userRpm/WlanStationRpm.htm",
                Response::new(200, "<script>var hostList = new Array(0,0 );</script>"),
            );
        let factory = RouterFactory::with_transport(params(), transport);
        let mut router = factory.get_router().await.unwrap();
        assert_eq!(router.variant(), Variant::ArcherC20);
        let devices = router.scan_devices().await.unwrap();
        assert_eq!(devices[0].name.as_deref(), Some("laptop"));
    }

    #[tokio::test]
    async fn falls_through_to_legacy() {
        let transport = FixtureTransport::new().get(
            "/userRpm/WlanStationRpm.htm",
            Response::new(
                200,
                "<script>var hostList = new Array(\"AA-BB-CC-DD-EE-FF\", 5, 1, 1, 0,0 );</script>",
            ),
        );
        let factory = RouterFactory::with_transport(params(), transport.clone());
        let router = factory.get_router().await.unwrap();
        assert_eq!(router.variant(), Variant::Legacy);
    }
}
