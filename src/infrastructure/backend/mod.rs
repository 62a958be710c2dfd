pub mod http_backend;
pub mod in_memory;

pub use http_backend::HttpBackend;
pub use in_memory::InMemoryBackend;
