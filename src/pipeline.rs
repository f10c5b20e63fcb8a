//! Pipeline – ties together input resolution, ledger computation, layout,
//! pagination and rendering into a single function call per document kind.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::documents::{Payslip, Statement};
use crate::error::Result;
use crate::layout::LayoutEngine;
use crate::layout_config::DocumentPlan;
use crate::model::{PayslipInput, StatementInput, DEFAULT_CURRENCY};
use crate::pagination::paginate;
use crate::render::render_pdf;
use crate::style::{DocumentStyle, Palette};

/// MIME type the HTTP layer should send rendered documents with.
pub const CONTENT_TYPE_PDF: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Payslip,
    BankStatement,
}

impl DocumentKind {
    fn file_prefix(self) -> &'static str {
        match self {
            DocumentKind::Payslip => "payslip",
            DocumentKind::BankStatement => "bank_statement",
        }
    }
}

/// Configuration for one render call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Timestamp printed in the footer. Fixing it makes renders repeatable.
    pub generated_at: NaiveDateTime,
    /// Currency label used when the record carries none.
    pub default_currency: String,
    /// Colour overrides for payslips (default: blue scheme).
    pub payslip_palette: Option<Palette>,
    /// Colour overrides for statements (default: teal scheme).
    pub statement_palette: Option<Palette>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            generated_at: chrono::Local::now().naive_local(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            payslip_palette: None,
            statement_palette: None,
        }
    }
}

impl RenderOptions {
    /// Options with a fixed footer timestamp.
    pub fn at(generated_at: NaiveDateTime) -> Self {
        Self {
            generated_at,
            ..Self::default()
        }
    }

    fn payslip_style(&self) -> DocumentStyle {
        let mut style = DocumentStyle::payslip();
        if let Some(palette) = self.payslip_palette {
            style.palette = palette;
        }
        style
    }

    fn statement_style(&self) -> DocumentStyle {
        let mut style = DocumentStyle::statement();
        if let Some(palette) = self.statement_palette {
            style.palette = palette;
        }
        style
    }
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub plan: DocumentPlan,
    /// Suggested attachment filename.
    pub filename: String,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.plan.pages.len()
    }
}

/// Lay out a payslip without rendering it. All input errors surface here.
pub fn plan_payslip(input: &PayslipInput, options: &RenderOptions) -> Result<DocumentPlan> {
    let slip = Payslip::resolve(input, &options.default_currency)?;
    let style = options.payslip_style();
    let engine = LayoutEngine::new(style, &slip.currency);
    let title = format!("Payslip {} {}", slip.employee_id, slip.header.period.start);
    paginate(&engine, &title, &slip.regions(&style), options.generated_at)
}

/// Lay out a bank statement without rendering it.
pub fn plan_statement(input: &StatementInput, options: &RenderOptions) -> Result<DocumentPlan> {
    let statement = Statement::resolve(input, &options.default_currency)?;
    let style = options.statement_style();
    let engine = LayoutEngine::new(style, &statement.currency);
    let title = format!(
        "Statement {} {}",
        statement.account_number, statement.header.period.start
    );
    paginate(&engine, &title, &statement.regions(&style), options.generated_at)
}

/// Full pipeline: payslip record → PDF bytes.
pub fn render_payslip(input: &PayslipInput, options: &RenderOptions) -> Result<RenderedDocument> {
    let plan = plan_payslip(input, options)?;
    let bytes = render_pdf(&plan)?;
    let filename = attachment_filename(
        DocumentKind::Payslip,
        &input.employee.id,
        options.generated_at.date(),
    );
    log::info!(
        "rendered payslip for '{}': {} page(s), {} bytes",
        input.employee.id,
        plan.pages.len(),
        bytes.len()
    );
    Ok(RenderedDocument {
        bytes,
        plan,
        filename,
    })
}

/// Full pipeline: statement record → PDF bytes.
pub fn render_statement(
    input: &StatementInput,
    options: &RenderOptions,
) -> Result<RenderedDocument> {
    let plan = plan_statement(input, options)?;
    let bytes = render_pdf(&plan)?;
    let filename = attachment_filename(
        DocumentKind::BankStatement,
        &input.account_number,
        options.generated_at.date(),
    );
    log::info!(
        "rendered statement for '{}': {} page(s), {} bytes",
        input.account_number,
        plan.pages.len(),
        bytes.len()
    );
    Ok(RenderedDocument {
        bytes,
        plan,
        filename,
    })
}

/// `payslip_<id>_<YYYYMMDD>.pdf`, with the identifier reduced to
/// filename-safe characters.
pub fn attachment_filename(kind: DocumentKind, identifier: &str, date: NaiveDate) -> String {
    let safe: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stamp = date.format("%Y%m%d");
    if safe.is_empty() {
        format!("{}_{stamp}.pdf", kind.file_prefix())
    } else {
        format!("{}_{safe}_{stamp}.pdf", kind.file_prefix())
    }
}
