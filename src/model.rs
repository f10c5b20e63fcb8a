//! Input records and the resolved values the layout works with.
//!
//! `*Input` types mirror what the record store / HTTP layer hands over and
//! are deliberately loose (amounts may be strings or numbers, most fields
//! are optional). They are resolved into strongly typed values before any
//! layout work starts, so every parse failure surfaces up front.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Currency label used when a record does not carry one.
pub const DEFAULT_CURRENCY: &str = "KES";

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// An amount as it arrives on the wire: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(serde_json::Number),
    Text(String),
}

impl AmountField {
    /// Parse into a decimal. Blank strings count as zero.
    pub fn to_decimal(&self) -> std::result::Result<Decimal, String> {
        let raw = match self {
            AmountField::Number(n) => n.to_string(),
            AmountField::Text(s) => s.trim().replace(',', ""),
        };
        if raw.is_empty() {
            return Ok(Decimal::ZERO);
        }
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|_| format!("`{raw}` is not a number"))
    }
}

impl From<Decimal> for AmountField {
    fn from(d: Decimal) -> Self {
        AmountField::Text(d.to_string())
    }
}

impl From<&str> for AmountField {
    fn from(s: &str) -> Self {
        AmountField::Text(s.to_string())
    }
}

impl From<i64> for AmountField {
    fn from(n: i64) -> Self {
        AmountField::Number(n.into())
    }
}

/// Company or bank issuing the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuerInput {
    #[serde(default, alias = "company_name", alias = "bank_name")]
    pub name: String,
    #[serde(default, alias = "company_address")]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    /// Base64 image payload, optionally `data:` prefixed.
    #[serde(default, alias = "company_logo", alias = "bank_logo")]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Earning,
    Deduction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub label: String,
    pub amount: AmountField,
    pub category: Category,
}

/// An allowance or deduction as the payroll web form sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedAmountInput {
    #[serde(alias = "label")]
    pub name: String,
    pub amount: AmountField,
}

/// `allowances` / `deductions`: either itemised or a single total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedAmounts {
    Items(Vec<NamedAmountInput>),
    Total(AmountField),
}

impl Default for NamedAmounts {
    fn default() -> Self {
        NamedAmounts::Items(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeInput {
    #[serde(alias = "employeeName")]
    pub name: String,
    #[serde(alias = "employeeId")]
    pub id: String,
    #[serde(default, alias = "designation")]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub station: Option<String>,
    #[serde(default, alias = "taxPin")]
    pub tax_pin: Option<String>,
    #[serde(default, alias = "bankDetails")]
    pub bank_details: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayslipInput {
    #[serde(default)]
    pub issuer: IssuerInput,
    #[serde(default)]
    pub employee: EmployeeInput,
    #[serde(default, alias = "fromDate")]
    pub period_start: String,
    #[serde(default, alias = "toDate")]
    pub period_end: String,
    /// Pay month (`January-2024` or `2024-01`), used when no explicit
    /// start/end dates are given.
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, alias = "basicSalary")]
    pub basic_salary: Option<AmountField>,
    #[serde(default, alias = "lineItems")]
    pub line_items: Vec<LineItemInput>,
    #[serde(default)]
    pub allowances: NamedAmounts,
    #[serde(default)]
    pub deductions: NamedAmounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    #[serde(alias = "transaction_id")]
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "moneyIn", alias = "money_in")]
    pub amount_in: Option<AmountField>,
    #[serde(default, alias = "moneyOut", alias = "money_out")]
    pub amount_out: Option<AmountField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementInput {
    #[serde(default)]
    pub issuer: IssuerInput,
    #[serde(alias = "accountName", alias = "account_holder")]
    pub account_name: String,
    #[serde(alias = "accountNumber")]
    pub account_number: String,
    #[serde(alias = "fromDate", alias = "periodFrom")]
    pub period_start: String,
    #[serde(alias = "toDate", alias = "periodTo")]
    pub period_end: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, alias = "initialBalance")]
    pub opening_balance: Option<AmountField>,
    #[serde(default)]
    pub transactions: Vec<TransactionInput>,
}

/// Top-level keys of the flat web-form payload and where they belong.
const FORM_EMPLOYEE_KEYS: [(&str, &str); 7] = [
    ("employee_name", "name"),
    ("employee_id", "id"),
    ("designation", "position"),
    ("department", "department"),
    ("station", "station"),
    ("tax_pin", "tax_pin"),
    ("bank_details", "bank_details"),
];
const FORM_ISSUER_KEYS: [(&str, &str); 3] = [
    ("companyName", "name"),
    ("companyAddress", "address"),
    ("companyLogo", "logo"),
];

impl PayslipInput {
    /// Parse a payslip record. Both the nested shape and the flat payload
    /// of the payroll web form (`employee_name`, `companyName`, ...) are
    /// accepted.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| RenderError::malformed("payslip", e.to_string()))?;
        if let Some(obj) = value.as_object_mut() {
            nest_form_fields(obj, "employee", &FORM_EMPLOYEE_KEYS);
            nest_form_fields(obj, "issuer", &FORM_ISSUER_KEYS);
        }
        serde_json::from_value(value).map_err(|e| RenderError::malformed("payslip", e.to_string()))
    }

    /// Every earning and deduction on the record, in input order:
    /// `line_items`, then `allowances`, then `deductions`.
    pub fn resolve_line_items(&self) -> Result<Vec<LineItem>> {
        let mut items = self
            .line_items
            .iter()
            .enumerate()
            .map(|(i, item)| LineItem::resolve(item, i))
            .collect::<Result<Vec<_>>>()?;
        items.extend(self.allowances.resolve("allowances", "Allowances", Category::Earning)?);
        items.extend(self.deductions.resolve("deductions", "Deductions", Category::Deduction)?);
        Ok(items)
    }

    /// Explicit start/end dates win; otherwise the whole `period` month.
    pub fn resolve_period(&self) -> Result<Period> {
        let explicit = !self.period_start.trim().is_empty() || !self.period_end.trim().is_empty();
        match self.period.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(month) if !explicit => Period::month(month),
            _ => Period::parse(&self.period_start, &self.period_end),
        }
    }
}

/// Move flat `keys` of `obj` into the nested object `target`, unless the
/// nested object already carries them.
fn nest_form_fields(
    obj: &mut serde_json::Map<String, serde_json::Value>,
    target: &str,
    keys: &[(&str, &str)],
) {
    let mut moved = serde_json::Map::new();
    for (flat, nested) in keys {
        if let Some(v) = obj.remove(*flat) {
            moved.insert((*nested).to_string(), v);
        }
    }
    if moved.is_empty() {
        return;
    }
    let entry = obj
        .entry(target.to_string())
        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    if let Some(nested) = entry.as_object_mut() {
        for (k, v) in moved {
            nested.entry(k).or_insert(v);
        }
    }
}

impl NamedAmounts {
    fn resolve(&self, field: &str, total_label: &str, category: Category) -> Result<Vec<LineItem>> {
        match self {
            NamedAmounts::Items(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    LineItem::parse(
                        &item.name,
                        &item.amount,
                        category,
                        &format!("{field}[{i}].amount"),
                    )
                })
                .collect(),
            NamedAmounts::Total(amount) => {
                let item = LineItem::parse(total_label, amount, category, field)?;
                Ok(if item.amount.is_zero() { Vec::new() } else { vec![item] })
            }
        }
    }
}

impl StatementInput {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RenderError::malformed("statement", e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Resolved values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_date("period_start", start)?;
        let end = parse_date("period_end", end)?;
        if end < start {
            return Err(RenderError::malformed(
                "period_end",
                format!("{end} is before {start}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// First to last day of a month given as `January-2024`, `Jan-2024`
    /// or `2024-01`.
    pub fn month(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let start = ["%d-%B-%Y", "%d-%b-%Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&format!("01-{raw}"), fmt).ok())
            .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok())
            .ok_or_else(|| {
                RenderError::malformed("period", format!("`{raw}` is not a month like January-2024"))
            })?;
        let (year, month) = if start.month() == 12 {
            (start.year() + 1, 1)
        } else {
            (start.year(), start.month() + 1)
        };
        let end = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| RenderError::malformed("period", format!("`{raw}` is out of range")))?;
        Ok(Self { start, end })
    }
}

/// Everything drawn above the first table. Immutable once layout starts.
#[derive(Debug, Clone)]
pub struct DocumentHeader {
    pub issuer_name: String,
    pub issuer_lines: Vec<String>,
    pub logo: Option<String>,
    pub title: String,
    pub period: Period,
}

impl DocumentHeader {
    pub fn new(issuer: &IssuerInput, fallback_name: &str, title: &str, period: Period) -> Self {
        let issuer_name = if issuer.name.trim().is_empty() {
            fallback_name.to_string()
        } else {
            issuer.name.trim().to_string()
        };
        let issuer_lines = [&issuer.address, &issuer.contact]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            issuer_name,
            issuer_lines,
            logo: issuer.logo.clone().filter(|l| !l.trim().is_empty()),
            title: title.to_string(),
            period,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub label: String,
    pub amount: Decimal,
    pub category: Category,
}

impl LineItem {
    pub fn resolve(input: &LineItemInput, index: usize) -> Result<Self> {
        Self::parse(
            &input.label,
            &input.amount,
            input.category,
            &format!("line_items[{index}].amount"),
        )
    }

    fn parse(label: &str, amount: &AmountField, category: Category, field: &str) -> Result<Self> {
        let amount = amount
            .to_decimal()
            .map_err(|reason| RenderError::malformed(field, reason))?;
        Ok(Self {
            label: label.to_string(),
            amount,
            category,
        })
    }
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| RenderError::malformed(field, format!("`{raw}` is not YYYY-MM-DD ({e})")))
}

/// Parse an optional amount, treating a missing field as zero.
pub fn parse_optional_amount(field: &str, raw: Option<&AmountField>) -> Result<Decimal> {
    match raw {
        None => Ok(Decimal::ZERO),
        Some(a) => a.to_decimal().map_err(|reason| RenderError::malformed(field, reason)),
    }
}

pub fn currency_or_default(currency: Option<&str>, fallback: &str) -> String {
    currency
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_numbers_and_strings() {
        let n: AmountField = serde_json::from_str("1500.25").unwrap();
        assert_eq!(n.to_decimal().unwrap(), Decimal::new(150025, 2));
        let s: AmountField = serde_json::from_str("\"12,000.50\"").unwrap();
        assert_eq!(s.to_decimal().unwrap(), Decimal::new(1200050, 2));
        let blank: AmountField = serde_json::from_str("\"  \"").unwrap();
        assert_eq!(blank.to_decimal().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let a = AmountField::from("ten");
        assert!(a.to_decimal().is_err());
    }

    #[test]
    fn statement_accepts_legacy_camel_case_keys() {
        let json = r#"{
            "accountName": "Jane Doe",
            "accountNumber": "0012",
            "fromDate": "2024-01-01",
            "toDate": "2024-01-31",
            "initialBalance": "1000",
            "transactions": [
                {"id": "T1", "date": "2024-01-02", "description": "Salary", "moneyIn": 500, "moneyOut": 0}
            ]
        }"#;
        let st = StatementInput::from_json(json).unwrap();
        assert_eq!(st.account_name, "Jane Doe");
        assert_eq!(st.transactions.len(), 1);
        assert_eq!(
            st.transactions[0].amount_in.as_ref().unwrap().to_decimal().unwrap(),
            Decimal::new(500, 0)
        );
    }

    #[test]
    fn period_must_be_ordered_iso_dates() {
        assert!(Period::parse("2024-01-01", "2024-01-31").is_ok());
        assert!(Period::parse("01/01/2024", "2024-01-31").is_err());
        let err = Period::parse("2024-02-01", "2024-01-31").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn header_falls_back_to_default_issuer_name() {
        let period = Period::parse("2024-01-01", "2024-01-31").unwrap();
        let issuer = IssuerInput {
            address: Some("1 Main St".into()),
            contact: Some("  ".into()),
            ..IssuerInput::default()
        };
        let header = DocumentHeader::new(&issuer, "Company Name", "PAYSLIP", period);
        assert_eq!(header.issuer_name, "Company Name");
        assert_eq!(header.issuer_lines, vec!["1 Main St".to_string()]);
        assert!(header.logo.is_none());
    }

    #[test]
    fn web_form_payload_is_nested_and_itemised() {
        let json = r#"{
            "employee_name": "Jane Doe",
            "employee_id": "E7",
            "designation": "Clerk",
            "station": "Mombasa",
            "tax_pin": "A123",
            "bank_details": "KCB 0099",
            "basic_salary": "1000",
            "allowances": [{"name": "Housing", "amount": 200}],
            "deductions": [{"name": "Tax", "amount": 300}],
            "period": "January-2024",
            "companyName": "Acme Ltd",
            "currency": "KES"
        }"#;
        let slip = PayslipInput::from_json(json).unwrap();
        assert_eq!(slip.employee.name, "Jane Doe");
        assert_eq!(slip.employee.position.as_deref(), Some("Clerk"));
        assert_eq!(slip.employee.tax_pin.as_deref(), Some("A123"));
        assert_eq!(slip.issuer.name, "Acme Ltd");

        let items = slip.resolve_line_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].category, Category::Earning);
        assert_eq!(items[1].label, "Tax");
        assert_eq!(items[1].category, Category::Deduction);

        let period = slip.resolve_period().unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn scalar_allowance_totals_become_single_items() {
        let json = r#"{"employee": {"name": "J", "id": "1"}, "period": "2024-02",
                       "allowances": 150.5, "deductions": "0"}"#;
        let slip = PayslipInput::from_json(json).unwrap();
        let items = slip.resolve_line_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Allowances");
        assert_eq!(items[0].amount, Decimal::new(1505, 1));
        assert_eq!(slip.resolve_period().unwrap().end.day(), 29);
    }

    #[test]
    fn month_period_rejects_garbage_and_handles_december() {
        assert!(Period::month("Smarch-2024").unwrap_err().is_client_error());
        let dec = Period::month("Dec-2023").unwrap();
        assert_eq!(dec.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }
}
