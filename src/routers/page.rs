//! Data embedded in the script blocks of the `userRpm` HTML pages

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::device::MacAddress;
use crate::error::{Error, Result};

/// A quoted string, a bare value, or the `)` closing the array
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""((?:[^"\\]|\\.)*)"|([^,\s"()]+)|(\))"#).expect("valid regex")
});

static MAC_HYPHENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(-[0-9A-Fa-f]{2}){5}$").expect("valid regex")
});

static INDEX_REDIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"window\.parent\.location\.href\s*=\s*"https?://[^/"]+/([^/"]+)/userRpm/Index\.htm""#)
        .expect("valid regex")
});

/// Text of every `<script>` element in the page
pub fn script_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("script").map_err(|err| Error::Parse(format!("{:?}", err)))?;
    Ok(document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Elements of `var <name> = new Array(...);`, quotes stripped
pub fn js_array(scripts: &str, name: &str) -> Option<Vec<String>> {
    let pattern = format!(r"\b{}\s*=\s*new\s+Array\s*\(", regex::escape(name));
    let opening = Regex::new(&pattern).ok()?.find(scripts)?;
    let mut elements = Vec::new();
    for token in TOKEN.captures_iter(&scripts[opening.end()..]) {
        if token.get(3).is_some() {
            return Some(elements);
        }
        if let Some(element) = token.get(1).or_else(|| token.get(2)) {
            elements.push(element.as_str().to_string());
        }
    }
    // No closing parenthesis: the page was cut off
    None
}

/// Client MACs listed in a wireless station page's `hostList`
pub fn station_macs(html: &str) -> Result<Vec<MacAddress>> {
    let scripts = script_text(html)?;
    let host_list = js_array(&scripts, "hostList")
        .ok_or_else(|| Error::Parse("station page without a hostList array".into()))?;
    host_list
        .iter()
        .filter(|token| MAC_HYPHENS.is_match(token))
        .map(|token| token.parse())
        .collect()
}

/// Session token from the redirect script served after a successful login
pub fn login_token(html: &str) -> Result<Option<String>> {
    let scripts = script_text(html)?;
    Ok(INDEX_REDIRECT
        .captures(&scripts)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string()))
}

/// DHCP lease table: MAC to (hostname, IP)
pub fn dhcp_leases(html: &str) -> Result<HashMap<MacAddress, (String, Option<IpAddr>)>> {
    let scripts = script_text(html)?;
    let leases = js_array(&scripts, "DHCPDynList")
        .ok_or_else(|| Error::Parse("lease page without a DHCPDynList array".into()))?;
    let mut table = HashMap::new();
    // name, MAC, IP, lease time; the array ends with a "0,0" terminator
    for lease in leases.chunks_exact(4) {
        let mac: MacAddress = lease[1].parse()?;
        table.insert(mac, (lease[0].clone(), lease[2].parse().ok()));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATION_PAGE: &str = r#"<html><head>
<script type="text/javascript">
var wlanHostPara = new Array(
0, 2, 8, 5, 1,
0,0 );
</script>
<script type="text/javascript">
var hostList = new Array(
"AA-BB-CC-DD-EE-FF", 5, 1024, 2048,
"11-22-33-44-55-66", 5, 10, 20,
0,0 );
</script></head><body></body></html>"#;

    #[test]
    fn reads_station_macs() {
        let macs = station_macs(STATION_PAGE).unwrap();
        let expected: Vec<MacAddress> = ["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]
            .iter()
            .map(|mac| mac.parse().unwrap())
            .collect();
        assert_eq!(macs, expected);
    }

    #[test]
    fn page_without_host_list_is_parse_error() {
        let result = station_macs("<html><body>Please log in</body></html>");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn extracts_login_token() {
        let page = r#"<html><script language="javaScript">window.parent.location.href = "http://192.168.0.1/ABCDEFGHIJKLMNOP/userRpm/Index.htm";</script></html>"#;
        assert_eq!(
            login_token(page).unwrap().as_deref(),
            Some("ABCDEFGHIJKLMNOP")
        );
        assert_eq!(login_token("<html></html>").unwrap(), None);
    }

    #[test]
    fn reads_dhcp_leases() {
        let page = r#"<script>
var DHCPDynList = new Array(
"laptop", "AA-BB-CC-DD-EE-FF", "192.168.0.100", "01:52:10",
"", "11-22-33-44-55-66", "192.168.0.101", "Permanent",
0,0 );
</script>"#;
        let leases = dhcp_leases(page).unwrap();
        let laptop: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(
            leases.get(&laptop),
            Some(&("laptop".to_string(), Some("192.168.0.100".parse().unwrap())))
        );
        assert_eq!(leases.len(), 2);
    }

    #[test]
    fn hostname_with_closing_paren() {
        let page = r#"<script>
var DHCPDynList = new Array(
"x);", "AA-BB-CC-DD-EE-FF", "192.168.0.100", "01:52:10",
"phone", "11-22-33-44-55-66", "192.168.0.101", "Permanent",
0,0 );
</script>"#;
        let leases = dhcp_leases(page).unwrap();
        let laptop: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let phone: MacAddress = "11:22:33:44:55:66".parse().unwrap();
        assert_eq!(leases[&laptop].0, "x);");
        assert_eq!(leases[&phone].0, "phone");
    }

    #[test]
    fn unterminated_array() {
        assert_eq!(js_array("var hostList = new Array(\"AA-BB-CC-DD-EE-FF\", 5", "hostList"), None);
    }
}
