// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory and default config location.

use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// Return the application data directory.  Not created here.
pub fn data_dir() -> PathBuf {
    dirs_fallback().join("spoolwerk")
}

/// Where the configuration lives when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from("/tmp")
}
