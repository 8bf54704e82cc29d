// src/utils/env.rs

use log::{debug, warn};
use std::path::Path;

const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first `.env` file found in the usual locations. Variables that
/// are already set in the process environment win.
pub fn load_env() {
    for path in ENV_PATHS.iter() {
        if !Path::new(path).exists() {
            continue;
        }
        match dotenv::from_path(path) {
            Ok(()) => {
                debug!("Loaded environment overrides from {}", path);
                return;
            }
            Err(e) => warn!("Failed to load environment file {}: {}", path, e),
        }
    }
    debug!("No .env file found, using process environment only");
}
