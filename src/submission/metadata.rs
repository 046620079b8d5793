use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;
use serde::Serialize;

/// Where a submission came from. Stored alongside the inquiry row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestMetadata {
    pub ip: String,
    pub user_agent: String,
    pub referer: String,
}

impl RequestMetadata {
    pub fn from_request(
        headers: &HeaderMap,
        peer_addr: Option<IpAddr>,
        trusted_proxies: &[IpNet],
    ) -> Self {
        Self {
            ip: client_ip(headers, peer_addr, trusted_proxies),
            user_agent: header_str(headers, "user-agent"),
            referer: header_str(headers, "referer"),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn client_ip(headers: &HeaderMap, peer_addr: Option<IpAddr>, trusted_proxies: &[IpNet]) -> String {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    // X-Forwarded-For only counts when the hop itself is a trusted proxy
    if trusted_proxies.iter().any(|net| net.contains(&peer)) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            let client = xff
                .split(',')
                .filter_map(|s| s.trim().parse::<IpAddr>().ok())
                .find(|ip| !trusted_proxies.iter().any(|net| net.contains(ip)));
            if let Some(ip) = client {
                return ip.to_string();
            }
        }
    }

    peer.to_string()
}
