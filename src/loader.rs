//! One-shot asynchronous font loading.
//!
//! The loading side runs elsewhere (a worker thread natively, a `fetch`
//! future in the browser) and sends exactly one result through a oneshot
//! channel. The render loop polls [`FontLoad`] every tick without blocking.

use std::time::Duration;

use futures::channel::oneshot;

use crate::typeface::{FontError, Typeface};

pub type FontResult = Result<Typeface, FontError>;

/// Sending half handed to whatever produces the font.
pub type FontSender = oneshot::Sender<FontResult>;

#[derive(Debug)]
pub enum FontPoll {
    Pending,
    Ready(Typeface),
    Failed(FontError),
}

pub struct FontLoad {
    source: String,
    receiver: oneshot::Receiver<FontResult>,
    started_ms: f64,
    timeout: Option<Duration>,
}

impl FontLoad {
    /// Creates a pending load and the sender that completes it.
    pub fn channel(
        source: impl Into<String>,
        started_ms: f64,
        timeout: Option<Duration>,
    ) -> (FontSender, Self) {
        let (sender, receiver) = oneshot::channel();
        let load = Self {
            source: source.into(),
            receiver,
            started_ms,
            timeout,
        };
        (sender, load)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Checks for a result. Once this returns anything but `Pending` the load
    /// is finished and should be dropped.
    pub fn poll(&mut self, now_ms: f64) -> FontPoll {
        match self.receiver.try_recv() {
            Ok(Some(Ok(typeface))) => FontPoll::Ready(typeface),
            Ok(Some(Err(err))) => FontPoll::Failed(err),
            Ok(None) => match self.timeout {
                Some(timeout) if now_ms - self.started_ms >= timeout.as_secs_f64() * 1000.0 => {
                    self.receiver.close();
                    FontPoll::Failed(FontError::TimedOut(timeout.as_secs_f64()))
                }
                _ => FontPoll::Pending,
            },
            Err(oneshot::Canceled) => FontPoll::Failed(FontError::Fetch(format!(
                "loader for {} stopped without a result",
                self.source
            ))),
        }
    }

    /// Reads and parses a typeface file on a worker thread.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn_file(path: impl Into<std::path::PathBuf>, timeout: Option<Duration>) -> Self {
        let path = path.into();
        let (sender, load) = Self::channel(path.display().to_string(), now_ms(), timeout);
        let spawned = std::thread::Builder::new()
            .name("font-loader".into())
            .spawn(move || {
                let result = std::fs::read_to_string(&path)
                    .map_err(FontError::from)
                    .and_then(|json| Typeface::from_json(&json));
                // The receiver may have timed out already.
                let _ = sender.send(result);
            });
        if let Err(err) = spawned {
            log::error!("failed to start font loader thread: {err}");
        }
        load
    }

    /// Fetches and parses a typeface over HTTP on the page's event loop.
    #[cfg(target_arch = "wasm32")]
    pub fn fetch(url: &str, timeout: Option<Duration>) -> Self {
        let (sender, load) = Self::channel(url, now_ms(), timeout);
        let url = url.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = sender.send(fetch_typeface(&url).await);
        });
        load
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_typeface(url: &str) -> FontResult {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    fn js_error(value: wasm_bindgen::JsValue) -> FontError {
        FontError::Fetch(format!("{value:?}"))
    }

    let window = web_sys::window().ok_or_else(|| FontError::Fetch("window not available".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_error)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(FontError::Fetch(format!(
            "{url} answered HTTP {}",
            response.status()
        )));
    }
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    let text = text
        .as_string()
        .ok_or_else(|| FontError::Fetch("response body is not text".into()))?;
    Typeface::from_json(&text)
}

/// Milliseconds on a monotonic clock.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Milliseconds since the page loaded.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or(0.0)
}
