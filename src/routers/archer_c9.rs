//! Archer C9, firmware 150811 and later: LuCI `stok` sessions

use serde_json::Value;
use tracing::{info, warn};

use super::{data_array, json_body, mac_field, Router};
use crate::config::ConnectionParams;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::http::{target, Request, Transport};

struct Session {
    stok: String,
    sysauth: String,
}

pub struct ArcherC9<T> {
    params: ConnectionParams,
    transport: T,
    session: Option<Session>,
}

impl<T: Transport> ArcherC9<T> {
    pub fn new(params: ConnectionParams, transport: T) -> Self {
        Self {
            params,
            transport,
            session: None,
        }
    }

    fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::Authentication("must already be logged in".into()))
    }

    /// POSTs to a LuCI endpoint of the current session
    async fn call(&self, path: &str, form: &str, operation: &str) -> Result<Value> {
        let host = &self.params.host;
        let session = self.session()?;
        let target = target(
            host,
            &format!("/cgi-bin/luci/;stok={}{}", session.stok, path),
            &[("form", form), ("operation", operation)],
        )?;
        let request = Request::post(target)
            .header("Referer", format!("http://{}/webpages/index.html", host))
            .header("Cookie", format!("sysauth={}", session.sysauth));
        let response = self
            .transport
            .send(host, &request)
            .await?
            .error_for_status(request.path())?;
        json_body(&response)
    }

    async fn load_statistics(&mut self) -> Result<Vec<Device>> {
        info!("Loading wireless clients...");
        let json = self.call("/admin/wireless", "statistics", "load").await?;
        if json.get("success").and_then(Value::as_bool) != Some(true) {
            return match json.get("errorcode").and_then(Value::as_str) {
                Some("timeout") => {
                    info!("Token timed out. Relogging on next scan");
                    self.session = None;
                    Err(Error::Authentication("session timed out".into()))
                }
                code => Err(Error::Parse(format!(
                    "router reported an error while loading clients: {}",
                    code.unwrap_or("unknown")
                ))),
            };
        }
        data_array(&json)?
            .iter()
            .map(|entry| -> Result<Device> { Ok(Device::new(mac_field(entry, "mac")?)) })
            .collect()
    }

    async fn logout(&mut self) {
        info!("Logging out of router admin interface...");
        if let Err(err) = self.call("/admin/system", "logout", "write").await {
            warn!("Logout failed: {}", err);
        }
        self.session = None;
    }
}

impl<T: Transport> Router for ArcherC9<T> {
    fn descriptor(&self) -> &'static str {
        "TP-Link Archer C9 (v3)"
    }

    async fn login(&mut self) -> Result<()> {
        info!("Retrieving auth tokens...");
        let host = &self.params.host;
        let target = target(
            host,
            "/cgi-bin/luci/;stok=/login",
            &[
                ("form", "login"),
                ("operation", "login"),
                ("username", self.params.username.as_str()),
                ("password", self.params.password.as_str()),
            ],
        )?;
        let request = Request::post(target)
            .header("Referer", format!("http://{}/webpages/login.html", host));
        let response = self
            .transport
            .send(host, &request)
            .await?
            .error_for_status(request.path())?;
        let json = json_body(&response)?;
        if json.get("success").and_then(Value::as_bool) != Some(true) {
            let code = json
                .get("errorcode")
                .and_then(Value::as_str)
                .unwrap_or("login failed");
            return Err(Error::Authentication(format!("login rejected: {}", code)));
        }
        let stok = json
            .get("data")
            .and_then(|data| data.get("stok"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Authentication("login response without stok".into()))?;
        let sysauth = response
            .cookies()
            .into_iter()
            .find(|cookie| cookie.name() == "sysauth")
            .ok_or_else(|| Error::Authentication("login response without sysauth cookie".into()))?;
        self.session = Some(Session {
            stok: stok.to_string(),
            sysauth: sysauth.value().to_string(),
        });
        info!("Logged in");
        Ok(())
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        if self.session.is_none() {
            self.login().await?;
        }
        let result = self.load_statistics().await;
        if self.session.is_some() {
            self.logout().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::testing::{params, FixtureTransport};

    const LOGIN: &str = "/cgi-bin/luci/;stok=/login";
    const STATISTICS: &str = "/cgi-bin/luci/;stok=0123abcd/admin/wireless";
    const LOGOUT: &str = "/cgi-bin/luci/;stok=0123abcd/admin/system";

    fn logged_in() -> FixtureTransport {
        FixtureTransport::new()
            .post(
                LOGIN,
                Response::new(200, r#"{"success":true,"data":{"stok":"0123abcd"}}"#)
                    .with_header("Set-Cookie", "sysauth=f00dcafe; path=/cgi-bin/luci"),
            )
            .post(LOGOUT, Response::new(200, r#"{"success":true}"#))
    }

    #[tokio::test]
    async fn scans_and_logs_out() {
        let body = r#"{"success":true,"data":[
            {"mac":"AA-BB-CC-DD-EE-FF","type":"2.4GHz","rxpkts":10,"txpkts":20},
            {"mac":"11-22-33-44-55-66","type":"5GHz","rxpkts":30,"txpkts":40}
        ]}"#;
        let transport = logged_in().post(STATISTICS, Response::new(200, body));
        let mut router = ArcherC9::new(params(), transport.clone());
        let devices = router.scan_devices().await.unwrap();
        let macs: Vec<String> = devices.iter().map(|d| d.mac.to_string()).collect();
        assert_eq!(macs, ["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]);
        assert!(router.session.is_none());

        let requests = transport.requests();
        assert_eq!(transport.paths(), [LOGIN, STATISTICS, LOGOUT]);
        assert_eq!(
            requests[0].target,
            "/cgi-bin/luci/;stok=/login?form=login&operation=login&username=admin&password=admin"
        );
        assert_eq!(requests[1].header_value("Cookie"), Some("sysauth=f00dcafe"));
        assert_eq!(
            requests[2].target,
            "/cgi-bin/luci/;stok=0123abcd/admin/system?form=logout&operation=write"
        );
    }

    #[tokio::test]
    async fn rejected_login() {
        let transport = FixtureTransport::new().post(
            LOGIN,
            Response::new(200, r#"{"success":false,"errorcode":"login failed"}"#),
        );
        let mut router = ArcherC9::new(params(), transport.clone());
        assert!(matches!(
            router.scan_devices().await,
            Err(Error::Authentication(_))
        ));
        assert_eq!(transport.paths(), [LOGIN]);
    }

    #[tokio::test]
    async fn login_without_session_token() {
        let transport = FixtureTransport::new().post(
            LOGIN,
            Response::new(200, r#"{"success":true,"data":{}}"#)
                .with_header("Set-Cookie", "sysauth=f00dcafe; path=/cgi-bin/luci"),
        );
        let mut router = ArcherC9::new(params(), transport.clone());
        assert!(matches!(
            router.scan_devices().await,
            Err(Error::Authentication(_))
        ));
        assert!(router.session.is_none());
        assert_eq!(transport.paths(), [LOGIN]);
    }

    #[tokio::test]
    async fn login_without_sysauth_cookie() {
        let transport = FixtureTransport::new().post(
            LOGIN,
            Response::new(200, r#"{"success":true,"data":{"stok":"0123abcd"}}"#),
        );
        let mut router = ArcherC9::new(params(), transport);
        assert!(matches!(
            router.scan_devices().await,
            Err(Error::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn expired_token_clears_session() {
        let transport = logged_in().post(
            STATISTICS,
            Response::new(200, r#"{"success":false,"errorcode":"timeout"}"#),
        );
        let mut router = ArcherC9::new(params(), transport.clone());
        assert!(matches!(
            router.scan_devices().await,
            Err(Error::Authentication(_))
        ));
        assert!(router.session.is_none());
        assert_eq!(transport.paths(), [LOGIN, STATISTICS]);
    }

    #[tokio::test]
    async fn malformed_statistics_still_logs_out() {
        let transport =
            logged_in().post(STATISTICS, Response::new(200, r#"{"success":true,"data":[{"m"#));
        let mut router = ArcherC9::new(params(), transport.clone());
        assert!(matches!(router.scan_devices().await, Err(Error::Parse(_))));
        assert_eq!(transport.paths(), [LOGIN, STATISTICS, LOGOUT]);
    }
}
