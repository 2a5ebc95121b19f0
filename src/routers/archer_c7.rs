//! Archer C7, firmware 150427: session token embedded in the URL path

use base64::prelude::*;
use tracing::{debug, info};

use super::{page, referer, Router};
use crate::config::ConnectionParams;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::http::{Request, Transport};

const LOGIN_PAGE: &str = "/userRpm/LoginRpm.htm?Save=Save";
const STATION_PAGES: [&str; 2] = ["WlanStationRpm.htm", "WlanStationRpm_5g.htm"];
const LEASE_PAGE: &str = "AssignedIpAddrListRpm.htm";

/// The firmware only hashes the first 15 bytes of the password
const PASSWORD_LIMIT: usize = 15;

struct Session {
    cookie: String,
    token: String,
}

pub struct ArcherC7<T> {
    params: ConnectionParams,
    transport: T,
    session: Option<Session>,
}

impl<T: Transport> ArcherC7<T> {
    pub fn new(params: ConnectionParams, transport: T) -> Self {
        Self {
            params,
            transport,
            session: None,
        }
    }

    fn auth_cookie(&self) -> String {
        let password = self.params.password.as_bytes();
        let hashed = md5::compute(&password[..password.len().min(PASSWORD_LIMIT)]);
        let credentials = format!("{}:{:x}", self.params.username, hashed);
        format!("Authorization=Basic {}", BASE64_STANDARD.encode(credentials))
    }

    async fn fetch(&self, page_name: &str) -> Result<Option<String>> {
        let host = &self.params.host;
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::Authentication("must already be logged in".into()))?;
        let path = format!("/{}/userRpm/{}", session.token, page_name);
        let request = Request::get(path.as_str())
            .header("Cookie", session.cookie.as_str())
            .header("Referer", referer(host));
        let response = self.transport.send(host, &request).await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(response.error_for_status(&path)?.body))
    }

    async fn load_clients(&self) -> Result<Vec<Device>> {
        info!("Loading wireless clients...");
        let mut macs = Vec::new();
        for (index, page_name) in STATION_PAGES.into_iter().enumerate() {
            match self.fetch(page_name).await? {
                Some(body) => macs.extend(page::station_macs(&body)?),
                // Single band models have no 5 GHz page
                None if index > 0 => debug!("{} not present", page_name),
                None => {
                    return Err(Error::UnexpectedStatus {
                        status: 404,
                        path: page_name.to_string(),
                    })
                }
            }
        }

        let leases = match self.fetch(LEASE_PAGE).await? {
            Some(body) => page::dhcp_leases(&body)?,
            None => {
                return Err(Error::UnexpectedStatus {
                    status: 404,
                    path: LEASE_PAGE.to_string(),
                })
            }
        };
        Ok(macs
            .into_iter()
            .map(|mac| match leases.get(&mac) {
                Some((name, ip)) => Device::new(mac).with_name(name.as_str()).with_ip(*ip),
                None => Device::new(mac),
            })
            .collect())
    }
}

impl<T: Transport> Router for ArcherC7<T> {
    fn descriptor(&self) -> &'static str {
        "TP-Link Archer C7 (v4)"
    }

    async fn login(&mut self) -> Result<()> {
        info!("Retrieving auth tokens...");
        let host = &self.params.host;
        let cookie = self.auth_cookie();
        let request = Request::get(LOGIN_PAGE)
            .header("Cookie", cookie.as_str())
            .header("Referer", referer(host));
        let response = self
            .transport
            .send(host, &request)
            .await?
            .error_for_status(request.path())?;
        let token = page::login_token(&response.body)?
            .ok_or_else(|| Error::Authentication("login page did not hand out a token".into()))?;
        self.session = Some(Session { cookie, token });
        info!("Logged in");
        Ok(())
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        if self.session.is_none() {
            self.login().await?;
        }
        let result = self.load_clients().await;
        if result.is_err() {
            self.session = None;
        }
        result
    }
}
