//! Text format of the `/cgi?N` endpoints
//!
//! ```text
//! [1,0,0,0,0,0]0
//! IPAddress=192.168.0.100
//! MACAddress=AA:BB:CC:DD:EE:FF
//! [error]0
//! ```
//!
//! Each `[stack]index` header opens a section of `key=value` lines and the
//! body must end with an `[error]<code>` trailer.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: String,
    pub fields: Vec<(String, String)>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

pub fn parse(body: &str) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();
    for line in body.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(code) = line.strip_prefix("[error]") {
            let code: i64 = code
                .trim()
                .parse()
                .map_err(|_| Error::Parse(format!("bad error trailer {:?}", line)))?;
            if code != 0 {
                return Err(Error::Authentication(format!(
                    "router returned error code {}",
                    code
                )));
            }
            return Ok(sections);
        }
        if line.starts_with('[') && line.contains(']') {
            sections.push(Section {
                header: line.to_string(),
                fields: Vec::new(),
            });
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| Error::Parse(format!("unexpected line {:?}", line)))?;
        let section = sections
            .last_mut()
            .ok_or_else(|| Error::Parse(format!("field {:?} outside of a section", key)))?;
        section.fields.push((key.to_string(), value.to_string()));
    }
    Err(Error::Parse("response is missing the [error] trailer".into()))
}
