use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use crate::app::error::AppError;
use crate::app::models::{
    AdbInfo, CommandResponse, Device, ExportDocument, FavoriteEntry, ImportSummary,
    LaunchOutcome, StoreData,
};
use crate::app::state::AppState;

pub fn resolve_trace_id(input: Option<String>) -> String {
    input
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn ensure_non_empty(value: &str, field: &str, trace_id: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required"), trace_id));
    }
    Ok(())
}

fn normalize_serial(serial: Option<String>) -> Option<String> {
    serial
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn check_adb(state: &AppState, trace_id: Option<String>) -> CommandResponse<AdbInfo> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "check_adb");
    let data = state.adb.check(&trace_id);
    if let Some(error) = &data.error {
        warn!(trace_id = %trace_id, error = %error, "adb check failed");
    }
    CommandResponse { trace_id, data }
}

pub fn list_devices(state: &AppState, trace_id: Option<String>) -> CommandResponse<Vec<Device>> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "list_devices");
    let data = state.adb.list_devices(&trace_id);
    CommandResponse { trace_id, data }
}

/// Dispatches the VIEW intent and records the link only after adb reports success.
pub fn launch_deeplink(
    state: &mut AppState,
    serial: Option<String>,
    deeplink: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<LaunchOutcome>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let deeplink = deeplink.trim().to_string();
    ensure_non_empty(&deeplink, "deeplink", &trace_id)?;
    let serial = normalize_serial(serial);
    info!(trace_id = %trace_id, serial = ?serial, deeplink = %deeplink, "launch_deeplink");

    let output = state
        .adb
        .start_view_intent(serial.as_deref(), &deeplink, &trace_id)
        .map_err(|err| {
            warn!(trace_id = %trace_id, error = %err.error, "launch failed");
            err
        })?;
    let recorded = state
        .store
        .record_launch(&deeplink)
        .map_err(|err| err.with_trace_id(&trace_id))?;

    Ok(CommandResponse {
        trace_id,
        data: LaunchOutcome {
            serial,
            deeplink,
            recorded,
            stdout: output.stdout.trim().to_string(),
        },
    })
}

pub fn launch_history_entry(
    state: &mut AppState,
    serial: Option<String>,
    index: usize,
    trace_id: Option<String>,
) -> Result<CommandResponse<LaunchOutcome>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let deeplink = state
        .store
        .history()
        .get(index)
        .cloned()
        .ok_or_else(|| AppError::validation(format!("No history entry #{index}"), &trace_id))?;
    launch_deeplink(state, serial, deeplink, Some(trace_id))
}

pub fn launch_favorite(
    state: &mut AppState,
    serial: Option<String>,
    index: usize,
    trace_id: Option<String>,
) -> Result<CommandResponse<LaunchOutcome>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let deeplink = state
        .store
        .favorites()
        .get(index)
        .map(|favorite| favorite.deeplink.clone())
        .ok_or_else(|| AppError::validation(format!("No favorite #{index}"), &trace_id))?;
    launch_deeplink(state, serial, deeplink, Some(trace_id))
}

pub fn get_links(state: &AppState, trace_id: Option<String>) -> CommandResponse<StoreData> {
    CommandResponse {
        trace_id: resolve_trace_id(trace_id),
        data: state.store.data().clone(),
    }
}

pub fn add_favorite(
    state: &mut AppState,
    name: String,
    deeplink: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<Vec<FavoriteEntry>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let deeplink = deeplink.trim().to_string();
    ensure_non_empty(&deeplink, "deeplink", &trace_id)?;
    ensure_non_empty(&name, "name", &trace_id)?;
    info!(trace_id = %trace_id, name = %name, "add_favorite");

    state
        .store
        .add_favorite(&name, &deeplink)
        .map_err(|err| err.with_trace_id(&trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: state.store.favorites().to_vec(),
    })
}

/// `data` is `false` when nothing changed (unknown index or empty name).
pub fn rename_favorite(
    state: &mut AppState,
    index: usize,
    new_name: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<bool>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, index, "rename_favorite");
    let renamed = state
        .store
        .rename_favorite(index, &new_name)
        .map_err(|err| err.with_trace_id(&trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: renamed,
    })
}

pub fn delete_favorite(
    state: &mut AppState,
    index: usize,
    trace_id: Option<String>,
) -> Result<CommandResponse<Option<FavoriteEntry>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, index, "delete_favorite");
    let removed = state
        .store
        .delete_favorite(index)
        .map_err(|err| err.with_trace_id(&trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: removed,
    })
}

pub fn clear_favorites(
    state: &mut AppState,
    trace_id: Option<String>,
) -> Result<CommandResponse<usize>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "clear_favorites");
    let removed = state
        .store
        .clear_favorites()
        .map_err(|err| err.with_trace_id(&trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: removed,
    })
}

pub fn clear_history(
    state: &mut AppState,
    trace_id: Option<String>,
) -> Result<CommandResponse<usize>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "clear_history");
    let removed = state
        .store
        .clear_history()
        .map_err(|err| err.with_trace_id(&trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: removed,
    })
}

pub fn export_links(
    state: &AppState,
    path: &Path,
    trace_id: Option<String>,
) -> Result<CommandResponse<ExportDocument>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, path = %path.display(), "export_links");
    state
        .store
        .export_to_path(path)
        .map_err(|err| err.with_trace_id(&trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: state.store.export_document(),
    })
}

pub fn import_links(
    state: &mut AppState,
    path: &Path,
    trace_id: Option<String>,
) -> Result<CommandResponse<ImportSummary>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, path = %path.display(), "import_links");
    let summary = state
        .store
        .import_from_path(path)
        .map_err(|err| {
            warn!(trace_id = %trace_id, error = %err.error, "import rejected");
            err.with_trace_id(&trace_id)
        })?;
    Ok(CommandResponse {
        trace_id,
        data: summary,
    })
}

#[cfg(test)]
mod tests;
