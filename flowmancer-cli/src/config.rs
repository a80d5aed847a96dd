//! CLI configuration

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the FlowMancer server
    pub server_url: String,
}
