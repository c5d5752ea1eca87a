mod data;
mod datapath;
mod smf;

pub use data::*;
pub use datapath::*;
pub use smf::Smf;
