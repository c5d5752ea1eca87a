use anyhow::{Result, bail};
use derive_deref::Deref;
use serde::Deserialize;
use slog::{Logger, error, info};
use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::sync::Arc;

/// Identifier of a UPF, resolved from its node address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deref)]
pub struct UpfId(pub String);

impl std::fmt::Display for UpfId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UpfDescriptor {
    pub name: String,
    pub node_ip: IpAddr,
}

impl UpfDescriptor {
    pub fn node_ip(&self) -> IpAddr {
        self.node_ip
    }
}

/// Catalog of user plane nodes consulted when building data paths.
pub trait NodeDirectory {
    fn lookup_node(&self, name: &str) -> Option<&Arc<UpfDescriptor>>;
    fn resolve_id(&self, ip: &IpAddr) -> Option<&UpfId>;
}

/// UPF inventory plus the address to identifier table.
///
/// The two tables are kept separately.  Every UPF loaded from file is entered in
/// both, but a node can be known by name without its address being resolvable.
#[derive(Debug, Default)]
pub struct UserPlaneInformation {
    upfs: HashMap<String, Arc<UpfDescriptor>>,
    ids_by_ip: HashMap<IpAddr, UpfId>,
}

impl UserPlaneInformation {
    /// Add a UPF to the inventory and register its address.  A UPF that reuses
    /// an address already registered gets the existing identifier.
    pub fn add_upf(&mut self, name: &str, node_ip: IpAddr, id: Option<UpfId>) -> UpfId {
        self.insert_node(name, node_ip);
        self.ids_by_ip
            .entry(node_ip)
            .or_insert_with(|| id.unwrap_or_else(|| UpfId(name.to_string())))
            .clone()
    }

    /// Add a UPF to the inventory only.
    pub fn insert_node(&mut self, name: &str, node_ip: IpAddr) {
        self.upfs.insert(
            name.to_string(),
            Arc::new(UpfDescriptor {
                name: name.to_string(),
                node_ip,
            }),
        );
    }

    pub fn register_address(&mut self, node_ip: IpAddr, id: UpfId) {
        self.ids_by_ip.insert(node_ip, id);
    }

    pub fn len(&self) -> usize {
        self.upfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upfs.is_empty()
    }
}

impl NodeDirectory for UserPlaneInformation {
    fn lookup_node(&self, name: &str) -> Option<&Arc<UpfDescriptor>> {
        self.upfs.get(name)
    }

    fn resolve_id(&self, ip: &IpAddr) -> Option<&UpfId> {
        self.ids_by_ip.get(ip)
    }
}

#[derive(Deserialize, Debug)]
struct UpfEntry {
    node_ip: IpAddr,
    id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct UpfFile {
    upfs: HashMap<String, UpfEntry>,
}

/// Load the UPF inventory from file into memory.
pub fn load_upf_file(filename: &str, logger: &Logger) -> Result<UserPlaneInformation> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load UPF file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    parse_upfs(&contents, filename, logger)
}

pub(crate) fn parse_upfs(
    contents: &str,
    filename: &str,
    logger: &Logger,
) -> Result<UserPlaneInformation> {
    let file: UpfFile = toml::from_str(contents)?;

    // Sort so that the identifier shared by UPFs with the same address does not
    // depend on hash order.
    let mut entries: Vec<_> = file.upfs.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut upfs = UserPlaneInformation::default();
    for (name, entry) in entries {
        if name.is_empty() {
            bail!("Empty UPF name in {filename}");
        }
        let id = upfs.add_upf(name, entry.node_ip, entry.id.clone().map(UpfId));
        info!(
            logger,
            "Loaded UPF {name} at {} (id {id}) from {filename}", entry.node_ip
        );
    }
    Ok(upfs)
}
