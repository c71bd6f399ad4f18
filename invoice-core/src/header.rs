use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The non-tabular fields of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    /// Required for export.
    pub company_name: String,
    #[serde(default)]
    pub customer_name: String,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// PNG or JPEG file, read at export time.
    #[serde(default)]
    pub logo: Option<PathBuf>,
}

impl InvoiceHeader {
    /// Empty header for the given date; the caller fills in the rest.
    pub fn new(issue_date: NaiveDate) -> Self {
        InvoiceHeader {
            company_name: String::new(),
            customer_name: String::new(),
            issue_date,
            invoice_number: None,
            notes: None,
            logo: None,
        }
    }

    pub fn with_company(mut self, name: impl Into<String>) -> Self {
        self.company_name = name.into();
        self
    }

    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = name.into();
        self
    }

    pub fn with_invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_logo(mut self, path: impl AsRef<Path>) -> Self {
        self.logo = Some(path.as_ref().to_path_buf());
        self
    }

    /// Fields the export needs.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.company_name.trim().is_empty() {
            return Err(ValidationError::MissingCompanyName);
        }
        Ok(())
    }

    /// Optional text fields that hold something besides whitespace.
    pub(crate) fn invoice_number_text(&self) -> Option<&str> {
        non_blank(self.invoice_number.as_deref())
    }

    pub(crate) fn notes_text(&self) -> Option<&str> {
        non_blank(self.notes.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
