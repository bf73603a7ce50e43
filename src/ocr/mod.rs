//! Text extraction used to double-check a classification.
//!
//! Two interchangeable backends implement [`OcrBackend`]; which one a
//! pipeline uses is decided by configuration through [`backend_factory`].
//! Construction is deferred to first use and its outcome, success or
//! failure, is cached by [`LazyOcr`].

pub mod ocrs_backend;
pub mod tesseract;

use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::OcrConfig;

pub use ocrs_backend::OcrsBackend;
pub use tesseract::TesseractBackend;

/// Something that can read text off an image.
pub trait OcrBackend: Send + Sync {
    /// Raw text found in `image`, or `None` if nothing was recognized.
    fn extract_text(&self, image: &DynamicImage) -> anyhow::Result<Option<String>>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// Pure-Rust engine running `.rten` models
    #[default]
    Ocrs,
    /// External `tesseract` executable
    Tesseract,
}

/// Deferred backend constructor.
pub type BackendFactory = Box<dyn Fn() -> anyhow::Result<Arc<dyn OcrBackend>> + Send + Sync>;

/// Build the constructor for the backend selected in `config`.
pub fn backend_factory(config: &OcrConfig) -> BackendFactory {
    let config = config.clone();
    match config.engine {
        OcrEngineKind::Ocrs => Box::new(move || -> anyhow::Result<Arc<dyn OcrBackend>> {
            let backend = OcrsBackend::new(config.model_dir.as_deref())?;
            Ok(Arc::new(backend) as Arc<dyn OcrBackend>)
        }),
        OcrEngineKind::Tesseract => Box::new(move || -> anyhow::Result<Arc<dyn OcrBackend>> {
            let backend = TesseractBackend::new(&config.tesseract_binary, &config.languages)?;
            Ok(Arc::new(backend) as Arc<dyn OcrBackend>)
        }),
    }
}

enum BackendState {
    Pending,
    Ready(Arc<dyn OcrBackend>),
    Unavailable,
}

/// Construct-once holder for an OCR backend.
///
/// The first caller runs the factory while holding the lock, so concurrent
/// first uses wait for a single construction. A failed or panicking
/// construction is remembered and never retried by this holder.
pub struct LazyOcr {
    factory: BackendFactory,
    state: Mutex<BackendState>,
}

impl std::fmt::Debug for LazyOcr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock() {
            BackendState::Pending => "pending",
            BackendState::Ready(_) => "ready",
            BackendState::Unavailable => "unavailable",
        };
        f.debug_struct("LazyOcr").field("state", &state).finish()
    }
}

impl LazyOcr {
    pub fn new(factory: BackendFactory) -> Self {
        Self {
            factory,
            state: Mutex::new(BackendState::Pending),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The backend, constructing it on first call.
    ///
    /// Returns `None` when construction failed, now or on an earlier call.
    pub fn get(&self) -> Option<Arc<dyn OcrBackend>> {
        // Clone the Arc so the lock is released before the backend is used
        let mut state = self.lock();
        match &*state {
            BackendState::Ready(backend) => return Some(backend.clone()),
            BackendState::Unavailable => return None,
            BackendState::Pending => {}
        }

        // Marked before the attempt so a panicking factory is not rerun
        // once the poisoned lock is recovered.
        *state = BackendState::Unavailable;
        match (self.factory)() {
            Ok(backend) => {
                info!(backend = backend.name(), "OCR backend initialized");
                *state = BackendState::Ready(backend.clone());
                Some(backend)
            }
            Err(e) => {
                warn!(error = %e, "OCR backend unavailable, verification disabled");
                None
            }
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(*self.lock(), BackendState::Unavailable)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.lock(), BackendState::Ready(_))
    }
}
