//! Races every catalogued proxy scheme concurrently and returns the
//! first positive result, under a single wall-clock cap.

use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::rpc::EvmRpc;
use crate::schemes::{
    self, ProxyDetection,
};

const RACE_TIMEOUT: Duration = Duration::from_secs(10);

struct Scheme {
    name: &'static str,
}

const SCHEMES: &[Scheme] = &[
    Scheme { name: "eip1167_minimal" },
    Scheme { name: "eip1967_direct" },
    Scheme { name: "eip1967_beacon" },
    Scheme { name: "oz_legacy" },
    Scheme { name: "eip1822_uups" },
    Scheme { name: "eip897" },
    Scheme { name: "safe_proxy" },
    Scheme { name: "comptroller" },
    Scheme { name: "balancer_batch_relayer" },
    Scheme { name: "address_manager" },
    Scheme { name: "eip2535_diamond" },
];

async fn run_scheme(name: &'static str, rpc: &dyn EvmRpc, address: &str) -> (&'static str, Option<ProxyDetection>) {
    let result = match name {
        "eip1167_minimal" => schemes::detect_eip1167_minimal(rpc, address).await,
        "eip1967_direct" => schemes::detect_eip1967_direct(rpc, address).await,
        "eip1967_beacon" => schemes::detect_eip1967_beacon(rpc, address).await,
        "oz_legacy" => schemes::detect_oz_legacy(rpc, address).await,
        "eip1822_uups" => schemes::detect_eip1822_uups(rpc, address).await,
        "eip897" => schemes::detect_eip897(rpc, address).await,
        "safe_proxy" => schemes::detect_safe_proxy(rpc, address).await,
        "comptroller" => schemes::detect_comptroller(rpc, address).await,
        "balancer_batch_relayer" => schemes::detect_balancer_batch_relayer(rpc, address).await,
        "address_manager" => schemes::detect_address_manager(rpc, address).await,
        "eip2535_diamond" => schemes::detect_eip2535_diamond(rpc, address).await,
        _ => unreachable!("scheme table and dispatch must stay in sync"),
    };
    (name, result)
}

/// Resolves `address`'s proxy pattern, if any, by racing every scheme
/// concurrently with a single 10-second wall-clock cap. Returns the
/// first positive result; returns `None` if every scheme comes back
/// negative or the cap elapses before any positive result arrives.
pub struct ProxyResolver;

impl ProxyResolver {
    pub async fn resolve(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
        let deadline = tokio::time::Instant::now() + RACE_TIMEOUT;
        let mut pending: FuturesUnordered<_> = SCHEMES.iter().map(|s| run_scheme(s.name, rpc, address)).collect();
        let mut finished = std::collections::HashSet::new();

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, pending.next()).await {
                Ok(Some((name, Some(detection)))) => {
                    finished.insert(name);
                    return Some(detection);
                }
                Ok(Some((name, None))) => {
                    finished.insert(name);
                }
                Ok(None) => break,
                Err(_) => break,
            }
        }

        for scheme in SCHEMES {
            if !finished.contains(scheme.name) {
                tracing::warn!(scheme = scheme.name, address, "proxy scheme timed out");
            }
        }
        None
    }
}
