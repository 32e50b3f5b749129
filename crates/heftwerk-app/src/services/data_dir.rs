// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration directory resolution.

use std::path::PathBuf;

const APP_DIR: &str = "heftwerk";

/// Return the application config directory (not created here).
pub fn config_dir() -> PathBuf {
    resolve(
        std::env::var("XDG_CONFIG_HOME").ok(),
        std::env::var("HOME").ok(),
    )
}

fn resolve(xdg_config_home: Option<String>, home: Option<String>) -> PathBuf {
    // XDG first, then ~/.config
    let base = match (xdg_config_home, home) {
        (Some(xdg), _) if !xdg.is_empty() => PathBuf::from(xdg),
        (_, Some(home)) if !home.is_empty() => PathBuf::from(home).join(".config"),
        // Last resort
        _ => std::env::temp_dir(),
    };
    base.join(APP_DIR)
}
