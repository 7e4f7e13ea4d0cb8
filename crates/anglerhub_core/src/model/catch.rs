//! Catch and lake domain model.
//!
//! # Responsibility
//! - Define lakes an angler can log a catch against.
//! - Define the catch draft submitted from the upload form and the stored record.
//!
//! # Invariants
//! - A draft is only accepted with a lake, a fish type, a positive finite
//!   weight and a photo.
//! - A stored catch always points at an uploaded photo locator.

use crate::model::identity::IdentityId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LakeId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lake {
    pub id: LakeId,
    pub name: String,
}

impl Lake {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive substring match on the lake name.
    ///
    /// A blank query matches every lake.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Photo attached to a catch draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchPhoto {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Catch as entered in the upload form, before the photo is stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatchDraft {
    pub lake_id: String,
    pub fish_type: String,
    pub weight_kg: f64,
    pub description: String,
    pub photo: Option<CatchPhoto>,
}

impl CatchDraft {
    /// Checks the required form fields in display order.
    pub fn validate(&self) -> Result<(), CatchValidationError> {
        if self.lake_id.trim().is_empty() {
            return Err(CatchValidationError::MissingLake);
        }
        if self.fish_type.trim().is_empty() {
            return Err(CatchValidationError::MissingFishType);
        }
        if !valid_weight(self.weight_kg) {
            return Err(CatchValidationError::InvalidWeight);
        }
        if self.photo.is_none() {
            return Err(CatchValidationError::MissingPhoto);
        }
        Ok(())
    }
}

/// Recorded catch row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catch {
    pub id: String,
    pub angler_id: IdentityId,
    pub lake_id: LakeId,
    pub description: String,
    pub fish_type: String,
    pub weight_kg: f64,
    /// Retrievable locator of the uploaded photo.
    pub image_url: String,
}

impl Catch {
    /// Validates record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), CatchValidationError> {
        if self.id.trim().is_empty() || self.angler_id.trim().is_empty() {
            return Err(CatchValidationError::MissingOwner);
        }
        if self.lake_id.trim().is_empty() {
            return Err(CatchValidationError::MissingLake);
        }
        if self.fish_type.trim().is_empty() {
            return Err(CatchValidationError::MissingFishType);
        }
        if !valid_weight(self.weight_kg) {
            return Err(CatchValidationError::InvalidWeight);
        }
        if self.image_url.trim().is_empty() {
            return Err(CatchValidationError::MissingPhoto);
        }
        Ok(())
    }
}

fn valid_weight(weight_kg: f64) -> bool {
    weight_kg.is_finite() && weight_kg > 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchValidationError {
    MissingOwner,
    MissingLake,
    MissingFishType,
    InvalidWeight,
    MissingPhoto,
}

impl Display for CatchValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOwner => write!(f, "catch must have an id and an angler"),
            Self::MissingLake => write!(f, "please select a lake"),
            Self::MissingFishType => write!(f, "please enter the fish type"),
            Self::InvalidWeight => write!(f, "weight must be a positive number"),
            Self::MissingPhoto => write!(f, "please attach a photo of the catch"),
        }
    }
}

impl Error for CatchValidationError {}
