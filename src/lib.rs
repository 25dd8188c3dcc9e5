//! Reading core for remote PDF magazines.
//!
//! A host-side [`session::ReadingController`] drives a sandboxed third-party
//! viewer through the JSON [`bridge`], and the [`shell`] view is re-derived
//! from the session after every update.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod host;
pub mod http;
pub mod session;
pub mod shell;
pub mod theme;
pub mod viewer;

use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

/// Write TypeScript definitions for every type that crosses into the webview.
pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<bridge::BridgeMessage>(out_dir)?;
    export_single_type::<bridge::BridgeError>(out_dir)?;
    export_single_type::<viewer::ViewerSignal>(out_dir)?;
    export_single_type::<viewer::SurfaceCommand>(out_dir)?;
    export_single_type::<theme::Palette>(out_dir)?;
    export_single_type::<config::ThemeMode>(out_dir)?;
    export_single_type::<session::SessionStatus>(out_dir)?;
    export_single_type::<session::ReadingSnapshot>(out_dir)?;
    export_single_type::<shell::ShellView>(out_dir)?;

    let index_content = r#"export type { BridgeMessage } from "./BridgeMessage";
export type { BridgeError } from "./BridgeError";
export type { ViewerSignal } from "./ViewerSignal";
export type { SurfaceCommand } from "./SurfaceCommand";
export type { Palette } from "./Palette";
export type { ThemeMode } from "./ThemeMode";
export type { SessionStatus } from "./SessionStatus";
export type { ReadingSnapshot } from "./ReadingSnapshot";
export type { ShellView } from "./ShellView";
"#;

    fs::write(out_dir.join("index.ts"), index_content).map_err(|err| {
        format!(
            "Failed to write {}: {err}",
            out_dir.join("index.ts").display()
        )
    })?;

    Ok(())
}
