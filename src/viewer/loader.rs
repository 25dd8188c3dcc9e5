use crate::http::ApiClient;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, HeaderName, RANGE};
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

const PDF_SIGNATURE: &[u8] = b"%PDF-";
const SNIFF_BYTES: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailureKind {
    Network,
    Timeout,
    /// Blocked by the host allow-list, scheme policy, size cap or HTTP status.
    Rejected,
    /// The payload is not a PDF document.
    Format,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: LoadFailureKind,
    pub message: String,
}

impl LoadFailure {
    pub fn new(kind: LoadFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LoadFailure {}

/// What the preflight learned about a document before the viewer opens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub url: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Cancellation handle for one load attempt.
#[derive(Debug, Clone)]
pub struct LoadToken {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl LoadToken {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<(), LoadFailure> {
        if self.is_cancelled() {
            return Err(LoadFailure::new(
                LoadFailureKind::Cancelled,
                format!("load cancelled at stage={stage}"),
            ));
        }
        Ok(())
    }
}

/// Verifies a document can be shown before the surface is asked to open it.
pub trait DocumentLoader: Send + Sync {
    fn preflight(&self, document_url: &str, token: &LoadToken) -> Result<DocumentInfo, LoadFailure>;
}

/// Preflight over HTTP: policy checks, status, content type and PDF signature.
pub struct HttpDocumentLoader {
    client: ApiClient,
    allowed_hosts: Vec<String>,
    allow_insecure_http: bool,
    max_bytes: u64,
}

impl HttpDocumentLoader {
    pub fn new(
        client: ApiClient,
        allowed_hosts: Vec<String>,
        allow_insecure_http: bool,
        max_bytes: u64,
    ) -> Self {
        Self {
            client,
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|host| host.trim().to_ascii_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
            allow_insecure_http,
            max_bytes,
        }
    }

    fn host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        let host = host.to_ascii_lowercase();
        self.allowed_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
    }

    fn check_policy(&self, url: &reqwest::Url) -> Result<(), LoadFailure> {
        match url.scheme() {
            "https" => {}
            "http" if self.allow_insecure_http => {}
            scheme => {
                return Err(LoadFailure::new(
                    LoadFailureKind::Rejected,
                    format!("Refusing to load a document over {scheme}://"),
                ));
            }
        }
        let host = url.host_str().unwrap_or_default();
        if !self.host_allowed(host) {
            return Err(LoadFailure::new(
                LoadFailureKind::Rejected,
                format!("Documents from {host} are not allowed"),
            ));
        }
        Ok(())
    }
}

impl DocumentLoader for HttpDocumentLoader {
    fn preflight(&self, document_url: &str, token: &LoadToken) -> Result<DocumentInfo, LoadFailure> {
        let url = self.client.resolve(document_url).map_err(|err| {
            LoadFailure::new(LoadFailureKind::Rejected, format!("{err:#}"))
        })?;
        self.check_policy(&url)?;
        token.check_cancelled("policy")?;

        debug!(url = %url, generation = token.generation(), "Preflighting document");
        let response = self
            .client
            .get(url.clone())
            .header(RANGE, format!("bytes=0-{}", SNIFF_BYTES - 1))
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    LoadFailure::new(LoadFailureKind::Timeout, "The document took too long to respond")
                } else {
                    LoadFailure::new(
                        LoadFailureKind::Network,
                        format!("Could not reach the document host: {err}"),
                    )
                }
            })?;
        token.check_cancelled("response")?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadFailure::new(
                LoadFailureKind::Rejected,
                format!("The document host answered {status}"),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase());
        if let Some(kind) = content_type.as_deref() {
            let accepted = kind.starts_with("application/pdf")
                || kind.starts_with("application/octet-stream")
                || kind.starts_with("binary/octet-stream");
            if !accepted {
                return Err(LoadFailure::new(
                    LoadFailureKind::Format,
                    format!("Expected a PDF document but received {kind}"),
                ));
            }
        }

        // A ranged answer only describes the slice; the full size is in Content-Range.
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
        };
        let content_length = if status == reqwest::StatusCode::PARTIAL_CONTENT {
            header(CONTENT_RANGE).and_then(total_from_content_range)
        } else {
            header(CONTENT_LENGTH).and_then(|value| value.trim().parse::<u64>().ok())
        };
        if let Some(length) = content_length.filter(|length| *length > self.max_bytes) {
            return Err(LoadFailure::new(
                LoadFailureKind::Rejected,
                format!("The document is too large ({length} bytes)"),
            ));
        }

        let mut head = Vec::with_capacity(SNIFF_BYTES as usize);
        response
            .take(SNIFF_BYTES)
            .read_to_end(&mut head)
            .map_err(|err| {
                LoadFailure::new(
                    LoadFailureKind::Network,
                    format!("Reading the document failed: {err}"),
                )
            })?;
        token.check_cancelled("sniff")?;
        check_signature(&head)?;

        info!(url = %url, ?content_length, "Document preflight passed");
        Ok(DocumentInfo {
            url: url.to_string(),
            content_type,
            content_length,
        })
    }
}

/// Complete length from `bytes <first>-<last>/<total>`; `None` when the total is `*`.
fn total_from_content_range(value: &str) -> Option<u64> {
    let (unit, range) = value.trim().split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (_, total) = range.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Leading bytes must carry the PDF header, allowing for a short preamble.
pub(crate) fn check_signature(head: &[u8]) -> Result<(), LoadFailure> {
    let window = &head[..head.len().min(SNIFF_BYTES as usize)];
    if window
        .windows(PDF_SIGNATURE.len())
        .any(|candidate| candidate == PDF_SIGNATURE)
    {
        Ok(())
    } else {
        Err(LoadFailure::new(
            LoadFailureKind::Format,
            "The file is not a readable PDF document",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::AuthContext;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn loader(allowed: &[&str], insecure: bool) -> HttpDocumentLoader {
        let client = ApiClient::new(AuthContext::new(), None, Duration::from_secs(1))
            .expect("client builds");
        HttpDocumentLoader::new(
            client,
            allowed.iter().map(|host| host.to_string()).collect(),
            insecure,
            1024,
        )
    }

    /// Answers a single request on a loopback port with a canned response.
    fn serve_once(status: &str, headers: &[(&str, &str)], body: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let mut response = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        if !headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        {
            response.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        response.push_str("\r\n");
        let mut response = response.into_bytes();
        response.extend_from_slice(body);

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(&response);
            }
        });
        format!("http://{addr}/issue.pdf")
    }

    fn preflight_local(url: &str) -> Result<DocumentInfo, LoadFailure> {
        loader(&[], true).preflight(url, &LoadToken::new(1))
    }

    #[test]
    fn content_range_total_is_parsed() {
        assert_eq!(total_from_content_range("bytes 0-1023/5000000"), Some(5_000_000));
        assert_eq!(total_from_content_range("bytes 0-1023/*"), None);
        assert_eq!(total_from_content_range("items 0-3/10"), None);
        assert_eq!(total_from_content_range("garbage"), None);
    }

    #[test]
    fn oversized_ranged_response_is_rejected() {
        let url = serve_once(
            "206 Partial Content",
            &[
                ("Content-Type", "application/pdf"),
                ("Content-Range", "bytes 0-8/5000000000"),
            ],
            b"%PDF-1.7\n",
        );
        let err = preflight_local(&url).expect_err("over the size cap");
        assert_eq!(err.kind, LoadFailureKind::Rejected);
        assert!(err.message.contains("5000000000"));
    }

    #[test]
    fn ranged_response_within_cap_passes() {
        let url = serve_once(
            "206 Partial Content",
            &[
                ("Content-Type", "application/pdf"),
                ("Content-Range", "bytes 0-8/900"),
            ],
            b"%PDF-1.7\n",
        );
        let info = preflight_local(&url).expect("preflight passes");
        assert_eq!(info.content_length, Some(900));
        assert_eq!(info.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn oversized_full_response_is_rejected() {
        let url = serve_once(
            "200 OK",
            &[("Content-Type", "application/pdf"), ("Content-Length", "4096")],
            b"%PDF-1.7\n",
        );
        let err = preflight_local(&url).expect_err("over the size cap");
        assert_eq!(err.kind, LoadFailureKind::Rejected);
    }

    #[test]
    fn error_status_is_rejected() {
        let url = serve_once("404 Not Found", &[("Content-Type", "text/plain")], b"missing");
        let err = preflight_local(&url).expect_err("not found");
        assert_eq!(err.kind, LoadFailureKind::Rejected);
        assert!(err.message.contains("404"));
    }

    #[test]
    fn html_content_type_is_a_format_error() {
        let url = serve_once("200 OK", &[("Content-Type", "text/html")], b"<html></html>");
        let err = preflight_local(&url).expect_err("html refused");
        assert_eq!(err.kind, LoadFailureKind::Format);
    }

    #[test]
    fn body_without_pdf_header_is_a_format_error() {
        let url = serve_once(
            "200 OK",
            &[("Content-Type", "application/octet-stream")],
            b"PK\x03\x04 not a pdf",
        );
        let err = preflight_local(&url).expect_err("zip refused");
        assert_eq!(err.kind, LoadFailureKind::Format);
    }

    #[test]
    fn signature_check_accepts_pdf_header() {
        assert!(check_signature(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").is_ok());
        assert!(check_signature(b"\xef\xbb\xbf%PDF-1.4").is_ok());
        let err = check_signature(b"<!DOCTYPE html>").expect_err("html is not pdf");
        assert_eq!(err.kind, LoadFailureKind::Format);
    }

    #[test]
    fn plain_http_is_rejected_unless_allowed() {
        let token = LoadToken::new(1);
        let err = loader(&[], false)
            .preflight("http://cdn.example.com/a.pdf", &token)
            .expect_err("http refused");
        assert_eq!(err.kind, LoadFailureKind::Rejected);
    }

    #[test]
    fn hosts_outside_allow_list_are_rejected() {
        let token = LoadToken::new(1);
        let err = loader(&["cdn.example.com"], false)
            .preflight("https://evil.example.net/a.pdf", &token)
            .expect_err("host refused");
        assert_eq!(err.kind, LoadFailureKind::Rejected);
        assert!(err.message.contains("evil.example.net"));
    }

    #[test]
    fn allow_list_matches_subdomains() {
        let loader = loader(&["Example.com"], false);
        assert!(loader.host_allowed("cdn.example.com"));
        assert!(loader.host_allowed("example.com"));
        assert!(!loader.host_allowed("badexample.com"));
    }

    #[test]
    fn cancelled_token_stops_before_network() {
        let token = LoadToken::new(3);
        token.cancel();
        let err = loader(&[], false)
            .preflight("https://cdn.example.com/a.pdf", &token)
            .expect_err("cancelled");
        assert_eq!(err.kind, LoadFailureKind::Cancelled);
    }
}
