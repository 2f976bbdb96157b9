use std::path::PathBuf;

use directories::ProjectDirs;

/// Base data directory for the cache, cool-down markers and log files.
///
/// Respects the `PIPEDECK_DATA_DIR` environment variable for custom
/// locations; otherwise the platform data dir is used.
pub fn data_dir() -> PathBuf {
    let path = if let Ok(custom) = std::env::var("PIPEDECK_DATA_DIR") {
        PathBuf::from(custom)
    } else {
        ProjectDirs::from("io", "pipedeck", "pipedeck")
            .expect("OS didn't give us a home directory")
            .data_dir()
            .to_path_buf()
    };

    // Ensure the directory exists
    if !path.exists() {
        std::fs::create_dir_all(&path).expect("Failed to create data directory");
    }

    path
}

/// Directory the tracing subscriber writes its rotating log files to.
///
/// Default: `{data_dir}/logs`
pub fn log_dir() -> PathBuf {
    if let Ok(path) = std::env::var("PIPEDECK_LOG_DIR") {
        return PathBuf::from(path);
    }
    data_dir().join("logs")
}
