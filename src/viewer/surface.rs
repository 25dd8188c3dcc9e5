use crate::bridge::{BridgeError, FrameSink, LineSink, bridge_error};
use crate::theme::Palette;
use serde::Serialize;
use std::io::Write;
use ts_rs::TS;

/// Instructions the adapter applies to the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "action", rename_all = "camelCase")]
#[ts(export)]
pub enum SurfaceCommand {
    Open {
        #[serde(rename = "viewerUrl")]
        viewer_url: String,
        #[serde(rename = "documentUrl")]
        document_url: String,
        palette: Palette,
        scale: f32,
    },
    Navigate {
        page: u32,
    },
    Zoom {
        scale: f32,
    },
    Theme {
        palette: Palette,
    },
    Close,
}

/// Rendering surface hosting the third-party viewer.
pub trait ViewerSurface {
    fn apply(&mut self, command: SurfaceCommand) -> Result<(), BridgeError>;
}

/// Surface living in another process, driven by JSON lines.
pub struct StdioSurface<W: Write> {
    sink: LineSink<W>,
}

impl<W: Write> StdioSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            sink: LineSink::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl<W: Write> ViewerSurface for StdioSurface<W> {
    fn apply(&mut self, command: SurfaceCommand) -> Result<(), BridgeError> {
        let frame = serde_json::to_string(&command)
            .map_err(|err| bridge_error("encode_failed", err.to_string()))?;
        self.sink.send_frame(&frame)
    }
}
