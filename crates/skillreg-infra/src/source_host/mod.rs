pub mod client;

pub use client::GitHubSourceHostClient;
