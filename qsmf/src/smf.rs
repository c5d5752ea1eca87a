use crate::datapath::{DataPathError, UeDataPathGraph};
use crate::{Config, RoutingTable, UserPlaneInformation, routing, upf};
use anyhow::Result;
use dashmap::DashMap;
use slog::{Logger, debug, info, o, warn};
use std::sync::{Arc, PoisonError, RwLock};

struct UserPlaneConfig {
    upfs: UserPlaneInformation,
    routing: RoutingTable,
}

/// Preconfigured user plane data paths of every subscriber.
///
/// Cloning gives another handle on the same registry.  Graphs are published as
/// immutable `Arc`s and replaced wholesale when they are rebuilt.  Graphs are
/// built and registered under the configuration lock, so a build from an old
/// configuration can never be registered after a reload has completed.
#[derive(Clone)]
pub struct Smf {
    user_plane: Arc<RwLock<UserPlaneConfig>>,
    graphs: Arc<DashMap<String, Arc<UeDataPathGraph>>>,
    logger: Logger,
}

impl Smf {
    /// Load the configuration files and build the graph of every subscriber.
    pub fn start(config: &Config, logger: Logger) -> Result<Self> {
        let upfs = upf::load_upf_file(&config.upf_file, &logger)?;
        let routing = routing::load_routing_file(&config.routing_file, &logger)?;
        let smf = Self::new(upfs, routing, logger);
        let loaded = smf.load_all_graphs();
        info!(&smf.logger, "Built data path graphs for {loaded} subscribers");
        Ok(smf)
    }

    pub fn new(upfs: UserPlaneInformation, routing: RoutingTable, logger: Logger) -> Self {
        Smf {
            user_plane: Arc::new(RwLock::new(UserPlaneConfig { upfs, routing })),
            graphs: Arc::new(DashMap::new()),
            logger,
        }
    }

    /// Build, analyze and register the data path graph of one subscriber.
    ///
    /// On failure any graph previously registered for the subscriber is removed,
    /// so that nothing stale is used in its place.
    pub fn load_graph(&self, supi: &str) -> Result<Arc<UeDataPathGraph>, DataPathError> {
        let user_plane = self
            .user_plane
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        self.register(&user_plane, supi)
    }

    fn register(
        &self,
        user_plane: &UserPlaneConfig,
        supi: &str,
    ) -> Result<Arc<UeDataPathGraph>, DataPathError> {
        let logger = self.logger.new(o!("supi" => supi.to_string()));
        match build_graph(user_plane, supi, &logger) {
            Ok(graph) => {
                let graph = Arc::new(graph);
                if self
                    .graphs
                    .insert(supi.to_string(), graph.clone())
                    .is_some()
                {
                    debug!(logger, "Replaced data path graph");
                }
                Ok(graph)
            }
            Err(e) => {
                warn!(logger, "Failed to build data path graph - {e}");
                self.graphs.remove(supi);
                Err(e)
            }
        }
    }

    fn register_all(&self, user_plane: &UserPlaneConfig) -> usize {
        let mut supis: Vec<_> = user_plane.routing.keys().collect();
        supis.sort();
        supis
            .into_iter()
            .filter(|supi| self.register(user_plane, supi).is_ok())
            .count()
    }

    /// Build the graph of every subscriber in the routing table.  Returns how many
    /// were registered.
    pub fn load_all_graphs(&self) -> usize {
        let user_plane = self
            .user_plane
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        self.register_all(&user_plane)
    }

    /// Swap in new configuration and rebuild every graph.
    ///
    /// Subscribers missing from the new routing table are dropped.  The others
    /// keep their current graph until its replacement is registered.
    pub fn reload(&self, upfs: UserPlaneInformation, routing: RoutingTable) -> usize {
        let mut user_plane = self
            .user_plane
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *user_plane = UserPlaneConfig { upfs, routing };
        self.graphs
            .retain(|supi, _| user_plane.routing.contains_key(supi));
        let loaded = self.register_all(&user_plane);
        info!(
            &self.logger,
            "Reloaded configuration, built data path graphs for {loaded} subscribers"
        );
        loaded
    }

    pub fn reload_from_files(&self, config: &Config) -> Result<usize> {
        let upfs = upf::load_upf_file(&config.upf_file, &self.logger)?;
        let routing = routing::load_routing_file(&config.routing_file, &self.logger)?;
        Ok(self.reload(upfs, routing))
    }

    pub fn has_preconfigured_graph(&self, supi: &str) -> bool {
        self.graphs.contains_key(supi)
    }

    pub fn graph(&self, supi: &str) -> Option<Arc<UeDataPathGraph>> {
        self.graphs.get(supi).map(|entry| entry.value().clone())
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }
}

fn build_graph(
    user_plane: &UserPlaneConfig,
    supi: &str,
    logger: &Logger,
) -> Result<UeDataPathGraph, DataPathError> {
    let paths = user_plane
        .routing
        .get(supi)
        .filter(|paths| !paths.is_empty())
        .ok_or_else(|| DataPathError::NoRoutingPaths(supi.to_string()))?;

    let mut graph = UeDataPathGraph::build(supi, paths, &user_plane.upfs, logger)?;
    let traversal = graph.mark_branching_points();
    info!(
        logger,
        "Built data path graph with {} UPFs, {} components, {} branching points",
        graph.len(),
        traversal.components(),
        traversal.branching.iter().filter(|b| **b).count()
    );
    debug!(logger, "{graph}");
    Ok(graph)
}
