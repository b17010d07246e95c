// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the ATS semantic service

/// Human-readable service name reported by `GET /`
pub const SERVICE_NAME: &str = "ATS Semantic Analysis Service";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} v{}", SERVICE_NAME, VERSION_NUMBER)
}
