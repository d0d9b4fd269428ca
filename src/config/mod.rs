//! Configuration and path management

pub mod paths;
pub mod settings;

pub use paths::TallyPaths;
pub use settings::Settings;
