//! The remote inpainting collaborator and the best-effort result upload.

mod http;
mod upload;

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::event::Alert;
use crate::state::{RefinerType, ResolutionMode};

pub use http::HttpInpaintService;
pub use upload::{ResultUpload, ResultUploader};

/// HTTP status the service uses for rate limiting
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Error)]
pub enum InpaintError {
    #[error("inpainting service answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("inpainting service returned an empty body")]
    EmptyResponse,

    #[error("could not decode the rendered image: {0}")]
    Decode(String),

    #[error("service is not configured: {0}")]
    Config(#[from] ConfigError),
}

impl InpaintError {
    pub fn status(&self) -> Option<u16> {
        match self {
            InpaintError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(STATUS_TOO_MANY_REQUESTS)
    }

    /// The message category the user gets to see
    pub fn alert(&self) -> Alert {
        if self.is_rate_limited() {
            Alert::RateLimited
        } else {
            Alert::Generic
        }
    }
}

impl From<reqwest::Error> for InpaintError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => InpaintError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => InpaintError::Transport(err.to_string()),
        }
    }
}

/// Everything one render submits
#[derive(Clone)]
pub struct InpaintRequest {
    /// Encoded working image
    pub image: Arc<Vec<u8>>,
    pub image_name: String,
    pub image_mime: &'static str,
    /// PNG mask, white where content is to be removed
    pub mask_png: Vec<u8>,
    pub mode: ResolutionMode,
    pub refiner: RefinerType,
}

impl std::fmt::Debug for InpaintRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InpaintRequest")
            .field("image_name", &self.image_name)
            .field("image_bytes", &self.image.len())
            .field("mask_bytes", &self.mask_png.len())
            .field("mode", &self.mode)
            .field("refiner", &self.refiner)
            .finish()
    }
}

/// Remote inpainting model: takes the working image and mask, returns the encoded result.
///
/// Implementations must not block the caller; the returned future is awaited by the
/// render orchestration.
pub trait InpaintService: Send + Sync {
    fn inpaint(&self, request: InpaintRequest) -> BoxFuture<'static, Result<Vec<u8>, InpaintError>>;
}

/// Stand-in used when no endpoint is configured: every render fails with the config error
#[derive(Debug, Clone)]
pub struct UnconfiguredService {
    error: ConfigError,
}

impl UnconfiguredService {
    pub fn new(error: ConfigError) -> Self {
        Self { error }
    }
}

impl InpaintService for UnconfiguredService {
    fn inpaint(
        &self,
        _request: InpaintRequest,
    ) -> BoxFuture<'static, Result<Vec<u8>, InpaintError>> {
        futures::future::ready(Err(InpaintError::Config(self.error.clone()))).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_maps_to_its_own_alert() {
        let limited = InpaintError::Status { status: 429, message: String::new() };
        assert!(limited.is_rate_limited());
        assert_eq!(limited.alert(), Alert::RateLimited);

        let server = InpaintError::Status { status: 503, message: String::new() };
        assert_eq!(server.alert(), Alert::Generic);
        assert_eq!(InpaintError::EmptyResponse.alert(), Alert::Generic);
    }

    #[test]
    fn test_unconfigured_service_fails_every_render() {
        let service = UnconfiguredService::new(ConfigError::Missing("INPAINT_ENDPOINT"));
        let request = InpaintRequest {
            image: Arc::new(vec![1, 2, 3]),
            image_name: "a.png".into(),
            image_mime: "image/png",
            mask_png: Vec::new(),
            mode: ResolutionMode::Standard,
            refiner: RefinerType::Medium,
        };
        let result = futures::executor::block_on(service.inpaint(request));
        assert!(matches!(result, Err(InpaintError::Config(_))));
    }
}
