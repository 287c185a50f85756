//! Host discovery: probe a /24 subnet for an open remote-login port.
//!
//! Thin collaborator for first-time setup. The default subnet is the one
//! Parallels Desktop hands out to guests; .2 is almost always the host
//! side, so it is probed first.

use futures::future::join_all;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

const SSH_PORT: u16 = 22;
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Default subnet to scan when none is given.
pub const DEFAULT_SUBNET: &str = "10.211.55";

fn candidates(subnet: &str) -> Vec<String> {
	let mut list = vec![
		format!("{}.2", subnet),
		format!("{}.1", subnet),
		format!("{}.3", subnet),
	];
	for i in 4..20 {
		list.push(format!("{}.{}", subnet, i));
	}
	list
}

async fn probe(addr: String) -> Option<String> {
	let target = format!("{}:{}", addr, SSH_PORT);
	match timeout(PROBE_TIMEOUT, TcpStream::connect(&target)).await {
		Ok(Ok(_)) => Some(addr),
		_ => None,
	}
}

/// Scan the subnet; returns the first candidate (in probe-priority order)
/// with an open port 22, or None.
pub async fn scan_for_ssh_host(subnet: &str) -> Option<String> {
	let results = join_all(candidates(subnet).into_iter().map(probe)).await;
	results.into_iter().flatten().next()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn candidate_order_prefers_host_side_addresses() {
		let list = candidates("10.211.55");
		assert_eq!(list[0], "10.211.55.2");
		assert_eq!(list[1], "10.211.55.1");
		assert_eq!(list[2], "10.211.55.3");
		assert_eq!(list[3], "10.211.55.4");
		assert_eq!(list.len(), 19);
	}

	#[tokio::test]
	async fn unroutable_subnet_yields_none() {
		// TEST-NET-1 is reserved and never routable
		assert_eq!(scan_for_ssh_host("192.0.2").await, None);
	}
}

// vim: ts=4
