use crate::config::ThemeMode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Normalized envelope exchanged between the host and the embedded document.
///
/// Events (`PageChanged`, `DocumentLoaded`, `LoadFailed`) travel from the
/// document to the host; the remaining variants are host commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export)]
pub enum BridgeMessage {
    #[serde(rename = "pageChange")]
    PageChanged {
        page: u32,
        #[serde(rename = "totalPages")]
        total_pages: u32,
    },
    #[serde(rename = "pdfLoaded")]
    DocumentLoaded {
        #[serde(rename = "totalPages")]
        total_pages: u32,
    },
    #[serde(rename = "loadError")]
    LoadFailed { message: String },
    #[serde(rename = "goToPage")]
    GoToPage { page: u32 },
    #[serde(rename = "changeFontSize")]
    ChangeFontSize { delta: i32 },
    /// Without a target theme the document cycles to the next one.
    #[serde(rename = "changeTheme")]
    ChangeTheme {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        theme: Option<ThemeMode>,
    },
    #[serde(rename = "reload")]
    Reload,
}

impl BridgeMessage {
    /// Every `type` tag understood on the wire.
    pub const TAGS: [&'static str; 7] = [
        "pageChange",
        "pdfLoaded",
        "loadError",
        "goToPage",
        "changeFontSize",
        "changeTheme",
        "reload",
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::PageChanged { .. } => "pageChange",
            Self::DocumentLoaded { .. } => "pdfLoaded",
            Self::LoadFailed { .. } => "loadError",
            Self::GoToPage { .. } => "goToPage",
            Self::ChangeFontSize { .. } => "changeFontSize",
            Self::ChangeTheme { .. } => "changeTheme",
            Self::Reload => "reload",
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Self::GoToPage { .. }
                | Self::ChangeFontSize { .. }
                | Self::ChangeTheme { .. }
                | Self::Reload
        )
    }

    pub fn is_event(&self) -> bool {
        !self.is_command()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_serialized_type_field() {
        let samples = [
            BridgeMessage::PageChanged {
                page: 1,
                total_pages: 2,
            },
            BridgeMessage::DocumentLoaded { total_pages: 2 },
            BridgeMessage::LoadFailed {
                message: "x".to_string(),
            },
            BridgeMessage::GoToPage { page: 1 },
            BridgeMessage::ChangeFontSize { delta: -2 },
            BridgeMessage::ChangeTheme { theme: None },
            BridgeMessage::Reload,
        ];
        for message in samples {
            let value = serde_json::to_value(&message).expect("serialize");
            assert_eq!(value["type"], message.tag());
            assert!(BridgeMessage::TAGS.contains(&message.tag()));
        }
    }

    #[test]
    fn page_change_uses_camel_case_total() {
        let json = serde_json::to_string(&BridgeMessage::PageChanged {
            page: 3,
            total_pages: 40,
        })
        .expect("serialize");
        assert_eq!(json, r#"{"type":"pageChange","page":3,"totalPages":40}"#);
    }

    #[test]
    fn change_theme_omits_missing_target() {
        let json =
            serde_json::to_string(&BridgeMessage::ChangeTheme { theme: None }).expect("serialize");
        assert_eq!(json, r#"{"type":"changeTheme"}"#);
    }

    #[test]
    fn classifies_direction() {
        assert!(BridgeMessage::Reload.is_command());
        assert!(BridgeMessage::DocumentLoaded { total_pages: 3 }.is_event());
    }
}
