use std::thread;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;

use super::InpaintError;
use crate::config::ServiceConfig;

/// Images sent to the result store after an export, each already capped in size
#[derive(Debug, Clone)]
pub struct ResultUpload {
    pub input_image: Vec<u8>,
    pub input_mime: &'static str,
    pub input_mask: Vec<u8>,
    pub result_image: Vec<u8>,
    pub result_mime: &'static str,
}

/// Fire-and-forget upload of export results. Failures are logged and never surfaced.
#[derive(Debug, Clone)]
pub struct ResultUploader {
    client: Client,
    config: ServiceConfig,
}

impl ResultUploader {
    /// `None` when no results endpoint is configured
    pub fn new(config: &ServiceConfig) -> Option<Self> {
        config.results_endpoint.as_ref()?;
        match Client::builder().build() {
            Ok(client) => Some(Self {
                client,
                config: config.clone(),
            }),
            Err(err) => {
                log::warn!("Result upload disabled: {err}");
                None
            }
        }
    }

    /// Start the upload in the background and return immediately
    pub fn spawn(&self, upload: ResultUpload) {
        let uploader = self.clone();
        let spawned = thread::Builder::new()
            .name("result-upload".into())
            .spawn(move || match uploader.send(upload) {
                Ok(()) => log::debug!("Result upload finished"),
                Err(err) => log::warn!("Result upload failed: {err}"),
            });
        if let Err(err) = spawned {
            log::warn!("Could not start result upload: {err}");
        }
    }

    fn send(&self, upload: ResultUpload) -> Result<(), InpaintError> {
        let Some(endpoint) = &self.config.results_endpoint else {
            return Ok(());
        };

        let form = Form::new()
            .part(
                "input_image",
                Part::bytes(upload.input_image).file_name("input").mime_str(upload.input_mime)?,
            )
            .part(
                "input_mask",
                Part::bytes(upload.input_mask).file_name("mask.png").mime_str("image/png")?,
            )
            .part(
                "result_image",
                Part::bytes(upload.result_image).file_name("result").mime_str(upload.result_mime)?,
            );

        let mut builder = self.client.post(endpoint);
        if let Some(token) = &self.config.auth_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(token) = &self.config.app_check_token {
            builder = builder.header("X-Firebase-AppCheck", token);
        }
        if let Some(client_id) = &self.config.pro_client {
            builder = builder.header("x-clipdrop-pro-client", client_id);
        }

        let response = builder.multipart(form).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(InpaintError::Status {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploader_needs_results_endpoint() {
        let config = ServiceConfig::new("https://inpaint.example");
        assert!(ResultUploader::new(&config).is_none());
    }
}
