//! EAP-series access points (v5): cookie session plus MD5 form login

use std::time::{SystemTime, UNIX_EPOCH};

use cookie::Cookie;
use serde_json::Value;
use tracing::info;

use super::{data_array, json_body, mac_field, str_field, Router};
use crate::config::ConnectionParams;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::http::{target, Request, Response, Transport};

const CLIENT_LIST: &str = "/data/monitor.client.client.json";

pub struct Eap<T> {
    params: ConnectionParams,
    transport: T,
    cookies: Vec<Cookie<'static>>,
}

impl<T: Transport> Eap<T> {
    pub fn new(params: ConnectionParams, transport: T) -> Self {
        Self {
            params,
            transport,
            cookies: Vec::new(),
        }
    }

    /// The web UI only answers requests that look like its own XHR calls
    fn request(&self, request: Request) -> Request {
        let request = request
            .header(
                "User-Agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.12; rv:53.0) Gecko/20100101 Firefox/53.0",
            )
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", format!("http://{}/", self.params.host))
            .header("Pragma", "no-cache")
            .header("Cache-Control", "no-cache");
        if self.cookies.is_empty() {
            return request;
        }
        let cookies = self
            .cookies
            .iter()
            .map(|cookie| cookie.encoded().stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        request.header("Cookie", cookies)
    }

    async fn send(&mut self, request: Request) -> Result<Response> {
        let request = self.request(request);
        let response = self
            .transport
            .send(&self.params.host, &request)
            .await?
            .error_for_status(request.path())?;
        for cookie in response.cookies() {
            self.cookies.retain(|kept| kept.name() != cookie.name());
            self.cookies.push(cookie);
        }
        Ok(response)
    }
}

/// Rejected logins and expired sessions answer with `success:false`
fn check_session(json: &Value) -> Result<()> {
    if json.get("timeout").and_then(Value::as_bool) == Some(true) {
        return Err(Error::Authentication("session timed out".into()));
    }
    if json.get("success").and_then(Value::as_bool) != Some(true) {
        let code = json.get("error").map(Value::to_string).unwrap_or_default();
        return Err(Error::Authentication(format!("login rejected {}", code)));
    }
    Ok(())
}

impl<T: Transport> Router for Eap<T> {
    fn descriptor(&self) -> &'static str {
        "TP-Link EAP access point (v5)"
    }

    async fn login(&mut self) -> Result<()> {
        self.cookies.clear();
        // The landing page hands out the session cookie
        self.send(Request::get("/")).await?;
        let password = format!("{:X}", md5::compute(self.params.password.as_bytes()));
        let form = Request::post("/").form(&[
            ("username", self.params.username.as_str()),
            ("password", password.as_str()),
        ]);
        let response = self.send(form).await?;
        check_session(&json_body(&response)?)?;
        info!("Logged in");
        Ok(())
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        info!("Loading wireless clients...");
        self.login().await?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default()
            .to_string();
        let target = target(
            &self.params.host,
            CLIENT_LIST,
            &[("operation", "load"), ("_", timestamp.as_str())],
        )?;
        let response = self.send(Request::get(target)).await?;
        let json = json_body(&response)?;
        check_session(&json)?;
        data_array(&json)?
            .iter()
            .map(|entry| -> Result<Device> {
                let mac = mac_field(entry, "MAC")?;
                Ok(Device::new(mac)
                    .with_name(str_field(entry, "DeviceName").unwrap_or_default())
                    .with_ip(str_field(entry, "IP").and_then(|ip| ip.parse().ok())))
            })
            .collect()
    }
}
