pub mod settings;

pub use settings::{OperationOverride, Settings, APP_DIR_NAME};
