use anyhow::{Result, bail, ensure};
use derive_deref::Deref;
use serde::Deserialize;
use slog::{Logger, error, info};
use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;

/// Where the data of one branch of a subscriber's data path is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrafficEndpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl std::fmt::Display for TrafficEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

/// One configured branch: the UPFs it traverses, head first, and its endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoutingPath {
    pub upfs: Vec<String>,
    pub destination_ip: IpAddr,
    pub destination_port: u16,
}

impl RoutingPath {
    pub fn new(upfs: &[&str], destination_ip: IpAddr, destination_port: u16) -> Self {
        RoutingPath {
            upfs: upfs.iter().map(|s| s.to_string()).collect(),
            destination_ip,
            destination_port,
        }
    }

    pub fn endpoint(&self) -> TrafficEndpoint {
        TrafficEndpoint {
            ip: self.destination_ip,
            port: self.destination_port,
        }
    }
}

/// Routing paths of every preconfigured subscriber, keyed by SUPI.
#[derive(Debug, Default, Deref)]
pub struct RoutingTable(HashMap<String, Vec<RoutingPath>>);

impl RoutingTable {
    pub fn insert(&mut self, supi: &str, paths: Vec<RoutingPath>) {
        self.0.insert(supi.to_string(), paths);
    }
}

/// Load the per-subscriber routing paths from file into memory.
pub fn load_routing_file(filename: &str, logger: &Logger) -> Result<RoutingTable> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load routing file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    parse_routing(&contents, filename, logger)
}

pub(crate) fn parse_routing(contents: &str, filename: &str, logger: &Logger) -> Result<RoutingTable> {
    let table: HashMap<String, Vec<RoutingPath>> = toml::from_str(contents)?;
    for (supi, paths) in table.iter() {
        if !supi.starts_with("imsi-") {
            bail!("Key {} in {filename} does not start with 'imsi-'", supi);
        }
        for path in paths {
            ensure!(
                !path.upfs.is_empty(),
                "Empty routing path for {supi} in {filename}"
            );
        }
        info!(
            logger,
            "Loaded {} routing paths for {supi} from {filename}",
            paths.len()
        );
    }
    Ok(RoutingTable(table))
}
