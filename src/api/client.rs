use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};

use super::AppState;
use crate::auth::BoundAddress;

/// Source address of the request as the session binder sees it.
///
/// `X-Forwarded-For` is only believed when the socket peer is one of the
/// configured trusted proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub BoundAddress);

impl FromRequestParts<Arc<AppState>> for ClientAddr {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() else {
            tracing::error!("Request without peer address; serve with connect info");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "client address unavailable"));
        };

        let trusted = state.config().read().await.security.trusted_proxy_ips.clone();
        Ok(Self(BoundAddress::from_ip(client_ip(
            peer.ip(),
            &parts.headers,
            &trusted,
        ))))
    }
}

fn is_trusted(ip: IpAddr, trusted: &[String]) -> bool {
    let ip = ip.to_canonical();
    trusted
        .iter()
        .filter_map(|t| t.parse::<IpAddr>().ok())
        .any(|t| t.to_canonical() == ip)
}

/// Walks `X-Forwarded-For` from the right and returns the first hop that is
/// not a trusted proxy.
fn client_ip(peer: IpAddr, headers: &HeaderMap, trusted: &[String]) -> IpAddr {
    if !is_trusted(peer, trusted) {
        return peer;
    }

    let hops: Vec<IpAddr> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse().ok())
        .collect();

    hops.into_iter()
        .rev()
        .find(|hop| !is_trusted(*hop, trusted))
        .unwrap_or(peer)
}
