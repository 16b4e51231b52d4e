pub mod global_variables;
pub mod nominatim;
pub mod platform;
pub mod settings;
