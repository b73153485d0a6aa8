//! Classify HTTP status and curl errors into fetch errors.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use super::FetchError;

/// OS-level reasons that mean there is no network path at all.
const NO_PATH_REASONS: &[&str] = &["network is unreachable", "no route to host"];

/// Non-2xx statuses are failures; anything in 200..300 is accepted.
pub fn classify_http_status(code: u32) -> Result<(), FetchError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(FetchError::Http(code))
    }
}

/// Classify a connect failure by its OS description.
pub fn classify_connect_failure(description: Option<&str>) -> FetchError {
    let reason = description.unwrap_or("could not connect");
    let lower = reason.to_ascii_lowercase();
    if NO_PATH_REASONS.iter().any(|r| lower.contains(r)) {
        FetchError::Disconnected(reason.to_string())
    } else {
        FetchError::Network(reason.to_string())
    }
}

/// Classify a failed name lookup. With no route off the host the resolver
/// was never reachable, so the failure says nothing about the server.
pub fn classify_resolve_failure(reason: &str, has_route: bool) -> FetchError {
    if has_route {
        FetchError::Network(reason.to_string())
    } else {
        FetchError::Disconnected(reason.to_string())
    }
}

/// Whether the OS has a route towards any public address. A UDP `connect`
/// only performs the route lookup; nothing is sent.
fn has_network_route() -> bool {
    let targets = [
        SocketAddr::from((Ipv4Addr::new(192, 0, 2, 1), 53)),
        SocketAddr::from((Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1), 53)),
    ];
    targets.iter().any(|target| {
        let local = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        UdpSocket::bind(local)
            .and_then(|socket| socket.connect(target))
            .is_ok()
    })
}

/// Classify a curl error. Blocking: a failed name lookup checks the
/// routing table.
pub fn classify_curl_error(e: &curl::Error) -> FetchError {
    if e.is_operation_timedout() {
        return FetchError::Timeout;
    }
    if e.is_aborted_by_callback() {
        return FetchError::Aborted;
    }
    if e.is_couldnt_connect() {
        return classify_connect_failure(e.extra_description());
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return classify_resolve_failure(&e.to_string(), has_network_route());
    }
    FetchError::Network(e.to_string())
}
