pub mod schema;
pub mod store;

pub use schema::PluginState;
pub use store::{default_settings_path, load_state, save_state, ConfigStore, SETTINGS_FILE_NAME};
