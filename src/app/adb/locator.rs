use std::path::{Path, PathBuf};

pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|candidate| candidate.strip_suffix('"'))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|candidate| candidate.strip_suffix('\''))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

/// Well-known install locations checked when adb is not on `PATH`.
pub fn fallback_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/opt/homebrew/bin/adb"),
        PathBuf::from("/usr/local/bin/adb"),
        PathBuf::from("/usr/bin/adb"),
        PathBuf::from("/bin/adb"),
    ];
    if cfg!(windows) {
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            candidates.push(
                PathBuf::from(local)
                    .join("Android")
                    .join("Sdk")
                    .join("platform-tools")
                    .join("adb.exe"),
            );
        }
        if let Some(program_files) = std::env::var_os("ProgramFiles") {
            candidates.push(
                PathBuf::from(program_files)
                    .join("Android")
                    .join("platform-tools")
                    .join("adb.exe"),
            );
        }
    }
    candidates
}

/// Resolves the adb executable; `None` when nothing usable is found.
pub fn resolve_adb_program(config_command_path: &str) -> Option<String> {
    let normalized = normalize_command_path(config_command_path);
    if !normalized.is_empty() {
        return validate_adb_program(&normalized).ok().map(|_| normalized);
    }
    if let Ok(path) = which::which("adb") {
        return Some(path.to_string_lossy().to_string());
    }
    fallback_candidates()
        .into_iter()
        .find(|candidate| candidate.is_file())
        .map(|candidate| candidate.to_string_lossy().to_string())
}

pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err("ADB command is empty".to_string());
    }
    if program == "adb" {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err("ADB path must point to an executable file".to_string());
    }
    if !path.exists() {
        return Err("ADB executable not found at the configured path".to_string());
    }
    Ok(())
}
