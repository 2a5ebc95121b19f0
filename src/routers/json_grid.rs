//! Firmware serving the wireless client grid as JSON (v2)

use tracing::info;

use super::{data_array, json_body, mac_field, referer, str_field, Router};
use crate::config::ConnectionParams;
use crate::device::Device;
use crate::error::Result;
use crate::http::{authorization_cookie, Request, Transport};

const CLIENT_GRID: &str = "/data/map_access_wireless_client_grid.json";

pub struct JsonGrid<T> {
    params: ConnectionParams,
    transport: T,
}

impl<T: Transport> JsonGrid<T> {
    pub fn new(params: ConnectionParams, transport: T) -> Self {
        Self { params, transport }
    }
}

impl<T: Transport> Router for JsonGrid<T> {
    fn descriptor(&self) -> &'static str {
        "TP-Link router (v2 firmware)"
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        info!("Loading wireless clients...");
        let host = &self.params.host;
        let request = Request::post(CLIENT_GRID)
            .header("Referer", referer(host))
            .header(
                "Cookie",
                authorization_cookie(&self.params.username, &self.params.password),
            );
        let response = self
            .transport
            .send(host, &request)
            .await?
            .error_for_status(CLIENT_GRID)?;
        let json = json_body(&response)?;
        data_array(&json)?
            .iter()
            .map(|entry| -> Result<Device> {
                let mac = mac_field(entry, "mac_addr")?;
                Ok(Device::new(mac).with_name(str_field(entry, "name").unwrap_or_default()))
            })
            .collect()
    }
}
