#[derive(Debug, Clone)]
pub struct Config {
    // TOML file listing the UPFs and their node addresses.
    pub upf_file: String,

    // TOML file holding the preconfigured routing paths of each subscriber.
    pub routing_file: String,
}
