use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;

use super::{InpaintError, InpaintRequest, InpaintService};
use crate::config::ServiceConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Inpainting over HTTP: a multipart POST answered with the encoded result image.
///
/// Each call runs the blocking request on its own thread and hands the outcome back
/// through a oneshot channel, so the future can be polled from any executor.
#[derive(Debug, Clone)]
pub struct HttpInpaintService {
    client: Client,
    config: Arc<ServiceConfig>,
}

impl HttpInpaintService {
    pub fn new(config: ServiceConfig) -> Result<Self, InpaintError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("eframe_inpaint/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn send(
        client: &Client,
        config: &ServiceConfig,
        request: InpaintRequest,
    ) -> Result<Vec<u8>, InpaintError> {
        let image = Part::bytes(request.image.to_vec())
            .file_name(request.image_name.clone())
            .mime_str(request.image_mime)?;
        let mask = Part::bytes(request.mask_png)
            .file_name("mask.png")
            .mime_str("image/png")?;
        let hd = request.mode.is_hd().to_string();

        let form = Form::new()
            .part("image_file", image)
            .part("mask_file", mask)
            .text("refiner", request.refiner.as_str())
            .text("hd", hd.clone());

        let mut builder = client
            .post(&config.endpoint)
            .header("X-HD", hd)
            .header("X-REFINER", request.refiner.as_str());
        if let Some(token) = &config.auth_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(token) = &config.app_check_token {
            builder = builder.header("X-Firebase-AppCheck", token);
        }
        if let Some(client_id) = &config.pro_client {
            builder = builder.header("x-clipdrop-pro-client", client_id);
        }

        let response = builder.multipart(form).send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(InpaintError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes()?;
        if body.is_empty() {
            return Err(InpaintError::EmptyResponse);
        }
        Ok(body.to_vec())
    }
}

impl InpaintService for HttpInpaintService {
    fn inpaint(
        &self,
        request: InpaintRequest,
    ) -> BoxFuture<'static, Result<Vec<u8>, InpaintError>> {
        let (sender, receiver) = oneshot::channel();
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        log::debug!("Submitting {request:?} to {}", config.endpoint);
        let spawned = thread::Builder::new()
            .name("inpaint-request".into())
            .spawn(move || {
                let result = Self::send(&client, &config, request);
                // The receiver is gone only if the caller stopped waiting
                let _ = sender.send(result);
            });

        if let Err(err) = spawned {
            return futures::future::ready(Err(InpaintError::Transport(err.to_string()))).boxed();
        }

        receiver
            .map(|outcome| {
                outcome.unwrap_or_else(|_| {
                    Err(InpaintError::Transport(
                        "request thread ended without a reply".into(),
                    ))
                })
            })
            .boxed()
    }
}
