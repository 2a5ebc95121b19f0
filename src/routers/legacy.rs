//! Oldest firmware: the wireless station page behind HTTP basic auth

use tracing::info;

use super::{page, referer, Router};
use crate::config::ConnectionParams;
use crate::device::Device;
use crate::error::Result;
use crate::http::{basic_credentials, Request, Transport};

const STATION_PAGE: &str = "/userRpm/WlanStationRpm.htm";

pub struct Legacy<T> {
    params: ConnectionParams,
    transport: T,
}

impl<T: Transport> Legacy<T> {
    pub fn new(params: ConnectionParams, transport: T) -> Self {
        Self { params, transport }
    }
}

impl<T: Transport> Router for Legacy<T> {
    fn descriptor(&self) -> &'static str {
        "TP-Link router (legacy firmware)"
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        info!("Loading wireless clients...");
        let host = &self.params.host;
        let request = Request::get(STATION_PAGE)
            .header(
                "Authorization",
                basic_credentials(&self.params.username, &self.params.password),
            )
            .header("Referer", referer(host));
        let response = self
            .transport
            .send(host, &request)
            .await?
            .error_for_status(STATION_PAGE)?;
        let macs = page::station_macs(&response.body)?;
        Ok(macs.into_iter().map(Device::new).collect())
    }
}
