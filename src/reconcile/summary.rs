//! Recent-order handoff storage
//!
//! The one durable record the core touches: written once when a payment
//! succeeds, read once by the downstream terminal screen, cleared when that
//! screen is left.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

/// What the terminal screen needs to render a confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_code: String,
    pub final_amount: Money,
}

pub trait RecentOrderStore: Send + Sync {
    fn save(&self, summary: &OrderSummary) -> Result<()>;
    fn load(&self) -> Result<Option<OrderSummary>>;
    fn clear(&self) -> Result<()>;
}

/// In-memory store for tests and embedded callers.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    slot: Mutex<Option<OrderSummary>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<OrderSummary>>> {
        self.slot
            .lock()
            .map_err(|_| StorefrontError::Storage("summary slot poisoned".into()))
    }
}

impl RecentOrderStore for MemoryOrderStore {
    fn save(&self, summary: &OrderSummary) -> Result<()> {
        *self.slot()? = Some(summary.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<OrderSummary>> {
        Ok(self.slot()?.clone())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}

/// File-backed store (client-side durable storage).
#[derive(Clone, Debug)]
pub struct JsonFileOrderStore {
    path: PathBuf,
}

impl JsonFileOrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecentOrderStore for JsonFileOrderStore {
    fn save(&self, summary: &OrderSummary) -> Result<()> {
        let bytes = serde_json::to_vec(summary)
            .map_err(|e| StorefrontError::Storage(e.to_string()))?;
        fs::write(&self.path, bytes).map_err(|e| StorefrontError::Storage(e.to_string()))
    }

    fn load(&self) -> Result<Option<OrderSummary>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorefrontError::Storage(e.to_string())),
        };
        match serde_json::from_slice(&bytes) {
            Ok(summary) => Ok(Some(summary)),
            Err(e) => {
                // A corrupted handoff record should not break the terminal
                // screen; treat it as absent.
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable order summary");
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorefrontError::Storage(e.to_string())),
        }
    }
}
