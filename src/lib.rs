//! # ledger-forge – payslip & bank-statement PDF rendering
//!
//! This crate turns payroll and bank-ledger records into paginated PDF
//! documents. Each render is a pure function of its input record and an
//! injected timestamp. The pipeline stages are:
//!
//! 1. **Resolve** – parse amounts and dates up front ([`model`])
//! 2. **Compute** – running balances and payslip totals ([`ledger`])
//! 3. **Layout** – fixed blocks and repeating tables ([`layout`])
//! 4. **Paginate** – flow regions onto pages ([`pagination`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! Amounts and dates are stringified by [`format`] at draw time; logos go
//! through [`logo`].

#![deny(rustdoc::broken_intra_doc_links)]

pub mod documents;
pub mod error;
pub mod fonts;
pub mod format;
pub mod layout;
pub mod layout_config;
pub mod ledger;
pub mod logo;
pub mod model;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod style;

// Re-exports for convenience
pub use error::{RenderError, Result};
pub use model::{PayslipInput, StatementInput};
pub use pipeline::{
    attachment_filename, render_payslip, render_statement, DocumentKind, RenderOptions,
    RenderedDocument, CONTENT_TYPE_PDF,
};
