pub mod http;

pub use http::HttpSearchBackend;
