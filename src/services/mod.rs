pub mod archive_service;
pub mod import_service;
pub mod language_service;
pub mod media_service;
pub mod tag_service;
pub mod validation_service;

pub use archive_service::*;
pub use import_service::*;
pub use language_service::*;
pub use media_service::*;
pub use tag_service::*;
pub use validation_service::*;
