//! Host page loaded by the webview around the third-party viewer.
//!
//! The page frames the remote viewer, forwards the viewer's own events as
//! structured [`ViewerSignal`](super::ViewerSignal) lines, and exposes
//! `window.__magreader.apply(command)` for [`SurfaceCommand`]s.

use super::surface::SurfaceCommand;
use anyhow::{Context, Result};
use reqwest::Url;

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; frame-src {{FRAME_ORIGIN}}; script-src 'unsafe-inline'; style-src 'unsafe-inline'">
<title>{{TITLE}}</title>
<style>
html, body { margin: 0; height: 100%; overflow: hidden; }
#viewer { border: 0; width: 100%; height: 100%; display: block; }
</style>
</head>
<body>
<iframe id="viewer" title="{{TITLE}}" sandbox="allow-scripts allow-same-origin"></iframe>
<script>
(function () {
  "use strict";
  var boot = {{BOOT}};
  var frame = document.getElementById("viewer");
  var app = null;
  var indicatorObserver = null;

  function post(signal) {
    var payload = JSON.stringify(signal);
    if (window.ipc && window.ipc.postMessage) {
      window.ipc.postMessage(payload);
    } else if (window.ReactNativeWebView) {
      window.ReactNativeWebView.postMessage(payload);
    } else if (window.parent !== window) {
      window.parent.postMessage(payload, "*");
    }
  }

  function applyPalette(palette) {
    document.body.style.background = palette.background;
    document.body.style.color = palette.foreground;
    var doc = frame.contentDocument;
    if (doc && doc.getElementById("viewerContainer")) {
      doc.getElementById("viewerContainer").style.filter = palette.pageFilter;
    }
  }

  function watchIndicator(doc) {
    var input = doc.getElementById("pageNumber");
    var count = doc.getElementById("numPages");
    if (!input || !count) {
      return;
    }
    var report = function () {
      post({ event: "pageindicator", text: input.value + " " + count.textContent });
    };
    indicatorObserver = new MutationObserver(report);
    indicatorObserver.observe(count, { childList: true, characterData: true, subtree: true });
    input.addEventListener("change", report);
  }

  function attach(command) {
    var win = frame.contentWindow;
    app = win && win.PDFViewerApplication;
    if (!app) {
      if (frame.contentDocument) {
        watchIndicator(frame.contentDocument);
      }
      return;
    }
    app.initializedPromise.then(function () {
      app.eventBus.on("pagesloaded", function (evt) {
        post({ event: "pagesloaded", pagesCount: evt.pagesCount });
        app.pdfViewer.currentScale = command.scale;
        applyPalette(command.palette);
      });
      app.eventBus.on("pagechanging", function (evt) {
        post({ event: "pagechanging", pageNumber: evt.pageNumber, pagesCount: app.pagesCount });
      });
      return app.open({ url: command.documentUrl });
    }).catch(function (err) {
      post({ event: "documentloaderror", message: String((err && err.message) || err) });
    });
  }

  function apply(command) {
    switch (command.action) {
      case "open":
        if (indicatorObserver) {
          indicatorObserver.disconnect();
          indicatorObserver = null;
        }
        app = null;
        frame.onload = function () { attach(command); };
        frame.onerror = function () {
          post({ event: "documentloaderror", message: "The viewer could not be loaded" });
        };
        frame.src = command.viewerUrl + "#disableHistory=true";
        break;
      case "navigate":
        if (app) { app.page = command.page; }
        break;
      case "zoom":
        if (app) { app.pdfViewer.currentScale = command.scale; }
        break;
      case "theme":
        applyPalette(command.palette);
        break;
      case "close":
        if (app) { app.close(); }
        frame.removeAttribute("src");
        break;
    }
  }

  window.__magreader = { apply: apply };
  if (boot) {
    apply(boot);
  }
})();
</script>
</body>
</html>
"##;

pub struct HostPage<'a> {
    pub title: &'a str,
    pub viewer_url: &'a str,
    /// Executed as soon as the page boots; normally an `open` command.
    pub boot: Option<&'a SurfaceCommand>,
}

pub fn render_host_page(page: &HostPage<'_>) -> Result<String> {
    let viewer = Url::parse(page.viewer_url)
        .with_context(|| format!("invalid viewer URL {}", page.viewer_url))?;
    let frame_origin = viewer.origin().ascii_serialization();
    let boot = match page.boot {
        Some(command) => serde_json::to_string(command).context("serializing boot command")?,
        None => "null".to_string(),
    };

    let title = escape_html(page.title);
    let boot = escape_script(&boot);
    Ok(fill_placeholders(TEMPLATE, |name| match name {
        "FRAME_ORIGIN" => Some(frame_origin.as_str()),
        "TITLE" => Some(title.as_str()),
        "BOOT" => Some(boot.as_str()),
        _ => None,
    }))
}

/// Single pass over `{{NAME}}` markers; substituted text is never rescanned.
fn fill_placeholders<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}").and_then(|end| lookup(&after[..end]).map(|value| (end, value))) {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// JSON is valid JS, but `</script>` and U+2028/U+2029 inside it are not safe
/// in an inline script block.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
