//! Join links: `http://host:port`, `tcp://host:port` or bare `host:port`.

use crate::error::NetError;

/// Splits a join link into host and port.
pub fn parse_link(link: &str) -> Result<(String, u16), NetError> {
    let invalid = || NetError::InvalidLink(link.to_string());
    let trimmed = link.trim();
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("tcp://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    let (host, port) = rest.rsplit_once(':').ok_or_else(invalid)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() || host.contains('/') {
        return Err(invalid());
    }
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if port == 0 {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}

/// Link a host shows to the player who should join.
pub fn advertised_link(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("http://[{host}]:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}
