mod config;
pub mod routing;
pub mod upf;

pub use config::*;
pub use routing::{RoutingPath, RoutingTable, TrafficEndpoint};
pub use upf::{NodeDirectory, UpfDescriptor, UpfId, UserPlaneInformation};
