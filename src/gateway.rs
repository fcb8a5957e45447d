// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Client for the external model service.
//!
//! Classification is best effort: every failure collapses into
//! [`OTHER_CATEGORY`]. Forecast, chat and receipt OCR are pass-through calls
//! whose failures are reported to the caller.

use reqwest::blocking::{Client, multipart};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{MonthPoint, OTHER_CATEGORY};
use crate::utils::http_client;

pub trait Classifier {
    /// Category label for a free-text description. Never empty.
    fn classify(&self, description: &str) -> String;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    description: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    category: String,
}

#[derive(Serialize)]
struct ForecastRequest<'a> {
    history: &'a [MonthPoint],
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    context: &'a [MonthPoint],
    user_id: i64,
}

/// Upload limit for receipt images.
pub const MAX_RECEIPT_BYTES: usize = 10 << 20;

/// The transaction the OCR service proposes for a scanned receipt. Every
/// field may be missing when recognition failed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReceiptDraft {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ReceiptDraft {
    /// Extracts `draft_transaction` from an OCR response.
    pub fn from_scan(scan: &Value) -> Result<Self> {
        let draft = scan
            .get("draft_transaction")
            .cloned()
            .ok_or_else(|| Error::Gateway("OCR response has no draft_transaction".into()))?;
        serde_json::from_value(draft)
            .map_err(|e| Error::Gateway(format!("malformed receipt draft: {}", e)))
    }
}

fn gateway_err(e: reqwest::Error) -> Error {
    Error::Gateway(e.to_string())
}

#[derive(Debug, Clone)]
pub struct MlClient {
    base_url: String,
    client: Client,
}

impl MlClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = http_client(timeout).map_err(gateway_err)?;
        Ok(MlClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::blocking::Response> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, "calling model service");
        self.client
            .post(&url)
            .json(body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(gateway_err)
    }

    pub fn try_classify(&self, description: &str) -> Result<String> {
        let resp = self.post("classify", &ClassifyRequest { description })?;
        let body: ClassifyResponse = resp.json().map_err(gateway_err)?;
        Ok(body.category.trim().to_string())
    }

    pub fn forecast(&self, history: &[MonthPoint]) -> Result<Value> {
        let resp = self.post("forecast", &ForecastRequest { history })?;
        resp.json().map_err(gateway_err)
    }

    pub fn chat(&self, user_id: i64, message: &str, context: &[MonthPoint]) -> Result<Value> {
        let resp = self.post(
            "chat",
            &ChatRequest {
                message,
                context,
                user_id,
            },
        )?;
        resp.json().map_err(gateway_err)
    }
}

impl MlClient {
    /// Sends a receipt image as the `file` field of a multipart upload.
    pub fn ocr(&self, bytes: Vec<u8>, filename: &str) -> Result<Value> {
        if bytes.is_empty() {
            return Err(Error::validation("receipt file is empty"));
        }
        if bytes.len() > MAX_RECEIPT_BYTES {
            return Err(Error::validation(format!(
                "receipt is {} bytes, limit is {}",
                bytes.len(),
                MAX_RECEIPT_BYTES
            )));
        }
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
            .map_err(gateway_err)?;
        let form = multipart::Form::new().part("file", part);
        let url = format!("{}/ocr", self.base_url);
        tracing::debug!(%url, filename, "uploading receipt");
        self.client
            .post(&url)
            .multipart(form)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(gateway_err)
    }
}

impl Classifier for MlClient {
    fn classify(&self, description: &str) -> String {
        match self.try_classify(description) {
            Ok(category) if !category.is_empty() => category,
            Ok(_) => OTHER_CATEGORY.to_string(),
            Err(err) => {
                tracing::warn!("classification fell back to '{}': {}", OTHER_CATEGORY, err);
                OTHER_CATEGORY.to_string()
            }
        }
    }
}
