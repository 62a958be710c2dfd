pub mod backend;

pub use backend::{CountingBackend, ErrorKind, FetchError};
