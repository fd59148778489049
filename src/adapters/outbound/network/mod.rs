/// Network adapters for external API calls
mod github_client;
mod osv_client;

pub use github_client::GithubClient;
pub use osv_client::OsvClient;
