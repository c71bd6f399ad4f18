//! Error types surfaced to the presentation layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::images::ImageError;
use crate::truetype::FontError;

/// Bad or missing user input. The operation that raised it changed
/// nothing, so the user can correct the field and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Item name is empty or only whitespace.
    #[error("item name must not be empty")]
    EmptyItemName,

    /// Unit price is not a number, or is negative.
    #[error("unit price must be a number zero or greater, got {0:?}")]
    InvalidUnitPrice(String),

    /// Quantity is not a whole number of at least one.
    #[error("quantity must be a whole number of at least 1, got {0:?}")]
    InvalidQuantity(String),

    /// Price times quantity, or the totals it feeds, exceed what a
    /// `Decimal` can hold.
    #[error("amount too large: {0}")]
    AmountTooLarge(String),

    /// Configured tax rate is negative.
    #[error("tax rate must be zero or greater, got {0}")]
    InvalidTaxRate(String),

    /// Export attempted without a company name.
    #[error("company name is required")]
    MissingCompanyName,

    /// Export attempted with no line items.
    #[error("invoice has no line items")]
    NoLineItems,
}

/// Everything that can go wrong in a session operation.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Logo file could not be read.
    #[error("cannot read logo {}: {source}", path.display())]
    LogoRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Logo file was read but is not a usable PNG or JPEG.
    #[error("cannot decode logo {}: {source}", path.display())]
    Logo {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    /// Configured font could not be read.
    #[error("cannot read font {}: {source}", path.display())]
    FontRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configured font is not a usable TrueType file.
    #[error("cannot load font {}: {source}", path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: FontError,
    },

    /// The document could not be written to its destination.
    #[error("cannot write invoice to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InvoiceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, InvoiceError::Validation(_))
    }

    /// File system or decode failure (the IOError class).
    pub fn is_io(&self) -> bool {
        !self.is_validation()
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            InvoiceError::Validation(v) => Some(v),
            _ => None,
        }
    }
}
