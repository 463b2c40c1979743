mod import;

pub use import::ImportError;
