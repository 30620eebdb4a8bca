pub mod accessor;
pub mod cache;
pub mod container;
pub mod context;
pub mod error;
pub mod file;
pub mod http_client;
pub mod http_wire;
pub mod index;
pub mod mime;
pub mod path;
pub mod service;
pub mod url;

pub use error::{FileServiceError, Result};
pub use file::{Directory, File, FileKind, RegularFile};
pub use path::Path;
pub use service::FileService;
