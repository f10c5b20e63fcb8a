//! Payslip and bank-statement layouts expressed as region lists.
//!
//! Both documents go through the same engine; the only differences are the
//! header fields, the table columns and the closing summary.

use rust_decimal::Decimal;

use crate::error::Result;
use crate::format::format_period;
use crate::layout::{Align, Block, Cell, CellValue, Column, Region, SummaryLine, Table, Tone};
use crate::ledger::{Ledger, PayslipTotals};
use crate::logo::decode_logo;
use crate::model::{
    currency_or_default, parse_optional_amount, Category, DocumentHeader, LineItem, PayslipInput,
    Period, StatementInput,
};
use crate::style::{DocumentStyle, INCH};

/// A fully parsed payslip. Building one performs every fallible step.
#[derive(Debug, Clone)]
pub struct Payslip {
    pub header: DocumentHeader,
    pub employee: Vec<(String, String)>,
    pub employee_id: String,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub totals: PayslipTotals,
}

impl Payslip {
    pub fn resolve(input: &PayslipInput, default_currency: &str) -> Result<Self> {
        let period = input.resolve_period()?;
        let basic_salary = parse_optional_amount("basic_salary", input.basic_salary.as_ref())?;
        let items = input.resolve_line_items()?;
        let totals = PayslipTotals::compute(basic_salary, &items)?;

        let emp = &input.employee;
        let mut employee = vec![
            ("Employee Name:".to_string(), emp.name.clone()),
            ("Employee ID:".to_string(), emp.id.clone()),
        ];
        let optional = [
            ("Position:", &emp.position),
            ("Department:", &emp.department),
            ("Station:", &emp.station),
            ("Tax PIN:", &emp.tax_pin),
            ("Bank Details:", &emp.bank_details),
        ];
        for (label, value) in optional {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                employee.push((label.to_string(), value.to_string()));
            }
        }

        Ok(Self {
            header: DocumentHeader::new(&input.issuer, "Company Name", "PAYSLIP", period),
            employee,
            employee_id: emp.id.clone(),
            currency: currency_or_default(input.currency.as_deref(), default_currency),
            items,
            totals,
        })
    }

    pub fn regions(&self, style: &DocumentStyle) -> Vec<Region> {
        let mut regions = header_regions(&self.header, style);
        regions.push(Region::Fixed(Block::Subtitle(format!(
            "Pay Period: {}",
            format_period(self.header.period.start, self.header.period.end)
        ))));
        regions.push(Region::Fixed(Block::Spacer(12.0)));
        regions.push(Region::Fixed(Block::KeyValues(self.employee.clone())));
        regions.push(Region::Fixed(Block::Spacer(12.0)));

        regions.push(Region::Fixed(Block::Section("Earnings".into())));
        let mut earnings = vec![amount_row("Basic Salary", self.totals.basic_salary, Tone::Credit)];
        earnings.extend(self.rows_for(Category::Earning, Tone::Credit));
        regions.push(Region::Table(line_item_table(earnings)));
        regions.push(Region::Fixed(Block::Summary(vec![SummaryLine {
            label: "Total Earnings:".into(),
            value: self.totals.total_earnings,
            tone: Tone::Credit,
            strong: false,
        }])));
        regions.push(Region::Fixed(Block::Spacer(8.0)));

        regions.push(Region::Fixed(Block::Section("Deductions".into())));
        let deductions = self.rows_for(Category::Deduction, Tone::Debit);
        if deductions.is_empty() {
            regions.push(Region::Fixed(Block::Note("No deductions this period.".into())));
        } else {
            regions.push(Region::Table(line_item_table(deductions)));
        }
        regions.push(Region::Fixed(Block::Summary(vec![SummaryLine {
            label: "Total Deductions:".into(),
            value: self.totals.total_deductions,
            tone: Tone::Debit,
            strong: false,
        }])));
        regions.push(Region::Fixed(Block::Spacer(12.0)));

        regions.push(Region::Fixed(Block::Summary(vec![SummaryLine {
            label: "Net Pay:".into(),
            value: self.totals.net_pay,
            tone: Tone::Emphasis,
            strong: true,
        }])));
        regions
    }

    fn rows_for(&self, category: Category, tone: Tone) -> Vec<Vec<Cell>> {
        self.items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| amount_row(&i.label, i.amount, tone))
            .collect()
    }
}

fn amount_row(label: &str, amount: Decimal, tone: Tone) -> Vec<Cell> {
    vec![
        Cell::new(CellValue::Text(label.to_string())),
        Cell::toned(CellValue::Amount(amount), tone),
    ]
}

fn line_item_table(rows: Vec<Vec<Cell>>) -> Table {
    Table {
        columns: vec![
            Column::new("Description", 0.0, 4.0 * INCH, Align::Left),
            Column::new("Amount", 4.0 * INCH, 2.0 * INCH, Align::Right),
        ],
        rows,
    }
}

/// A fully parsed bank statement with its running balances.
#[derive(Debug, Clone)]
pub struct Statement {
    pub header: DocumentHeader,
    pub account_name: String,
    pub account_number: String,
    pub currency: String,
    pub ledger: Ledger,
}

impl Statement {
    pub fn resolve(input: &StatementInput, default_currency: &str) -> Result<Self> {
        let period = Period::parse(&input.period_start, &input.period_end)?;
        let opening = parse_optional_amount("opening_balance", input.opening_balance.as_ref())?;
        let ledger = Ledger::compute(opening, &input.transactions)?;
        Ok(Self {
            header: DocumentHeader::new(&input.issuer, "Bank Name", "ACCOUNT STATEMENT", period),
            account_name: input.account_name.clone(),
            account_number: input.account_number.clone(),
            currency: currency_or_default(input.currency.as_deref(), default_currency),
            ledger,
        })
    }

    pub fn regions(&self, style: &DocumentStyle) -> Vec<Region> {
        let mut regions = header_regions(&self.header, style);
        regions.push(Region::Fixed(Block::Subtitle(format!(
            "Statement Period: {}",
            format_period(self.header.period.start, self.header.period.end)
        ))));
        regions.push(Region::Fixed(Block::Spacer(12.0)));
        regions.push(Region::Fixed(Block::KeyValues(vec![
            ("Account Name:".into(), self.account_name.clone()),
            ("Account Number:".into(), self.account_number.clone()),
            ("Currency:".into(), self.currency.clone()),
        ])));
        regions.push(Region::Fixed(Block::Summary(vec![SummaryLine {
            label: "Opening Balance:".into(),
            value: self.ledger.opening_balance,
            tone: Tone::Emphasis,
            strong: false,
        }])));
        regions.push(Region::Fixed(Block::Spacer(12.0)));

        if self.ledger.transactions.is_empty() {
            regions.push(Region::Fixed(Block::Note(
                "No transactions in this period.".into(),
            )));
        } else {
            regions.push(Region::Table(self.transaction_table()));
        }

        regions.push(Region::Fixed(Block::Spacer(12.0)));
        regions.push(Region::Fixed(Block::Summary(vec![
            SummaryLine {
                label: "Total Money In:".into(),
                value: self.ledger.total_in(),
                tone: Tone::Credit,
                strong: false,
            },
            SummaryLine {
                label: "Total Money Out:".into(),
                value: self.ledger.total_out(),
                tone: Tone::Debit,
                strong: false,
            },
            SummaryLine {
                label: "Closing Balance:".into(),
                value: self.ledger.closing_balance(),
                tone: Tone::Emphasis,
                strong: true,
            },
        ])));
        regions
    }

    fn transaction_table(&self) -> Table {
        let columns = vec![
            Column::new("No.", 0.0, 0.5 * INCH, Align::Center),
            Column::new("Date", 0.5 * INCH, INCH, Align::Left),
            Column::new("Transaction ID", 1.5 * INCH, 1.5 * INCH, Align::Left),
            Column::new("Description", 3.0 * INCH, 3.0 * INCH, Align::Left),
            Column::new("Money In", 6.0 * INCH, 1.5 * INCH, Align::Right),
            Column::new("Money Out", 7.5 * INCH, 1.5 * INCH, Align::Right),
            Column::new("Balance", 9.0 * INCH, 1.5 * INCH, Align::Right),
        ];
        let rows = self
            .ledger
            .transactions
            .iter()
            .enumerate()
            .map(|(i, t)| {
                vec![
                    Cell::new(CellValue::Index(i + 1)),
                    Cell::new(CellValue::Date(t.date)),
                    Cell::new(CellValue::Clipped(t.id.clone())),
                    Cell::new(CellValue::Clipped(t.description.clone())),
                    Cell::toned(CellValue::NonZeroAmount(t.amount_in), Tone::Credit),
                    Cell::toned(CellValue::NonZeroAmount(t.amount_out), Tone::Debit),
                    Cell::toned(CellValue::Amount(t.balance), Tone::Emphasis),
                ]
            })
            .collect();
        Table { columns, rows }
    }
}

/// Logo, issuer name, issuer contact lines and the document title.
fn header_regions(header: &DocumentHeader, style: &DocumentStyle) -> Vec<Region> {
    let mut regions = Vec::new();
    let (w, h) = style.logo_size;
    if let Some(logo) = header.logo.as_deref().and_then(|p| decode_logo(p, w, h)) {
        regions.push(Region::Fixed(Block::Logo(logo)));
    }
    regions.push(Region::Fixed(Block::Title(header.issuer_name.clone())));
    for line in &header.issuer_lines {
        regions.push(Region::Fixed(Block::Subtitle(line.clone())));
    }
    regions.push(Region::Fixed(Block::Title(header.title.clone())));
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AmountField, EmployeeInput, IssuerInput, LineItemInput, TransactionInput};

    fn payslip_input() -> PayslipInput {
        PayslipInput {
            issuer: IssuerInput {
                name: "Acme Ltd".into(),
                address: Some("P.O. Box 1, Nairobi".into()),
                ..IssuerInput::default()
            },
            employee: EmployeeInput {
                name: "Jane Doe".into(),
                id: "E-001".into(),
                position: Some("Engineer".into()),
                tax_pin: Some("A001".into()),
                ..EmployeeInput::default()
            },
            period_start: "2024-01-01".into(),
            period_end: "2024-01-31".into(),
            currency: None,
            basic_salary: Some(AmountField::from(50000)),
            line_items: vec![
                LineItemInput {
                    label: "Housing".into(),
                    amount: AmountField::from(10000),
                    category: Category::Earning,
                },
                LineItemInput {
                    label: "Tax".into(),
                    amount: AmountField::from(5000),
                    category: Category::Deduction,
                },
            ],
            ..PayslipInput::default()
        }
    }

    #[test]
    fn payslip_resolves_totals_and_default_currency() {
        let slip = Payslip::resolve(&payslip_input(), "KES").unwrap();
        assert_eq!(slip.currency, "KES");
        assert_eq!(slip.totals.net_pay, Decimal::new(55000, 0));
        assert_eq!(slip.employee.len(), 4);
        assert_eq!(slip.employee[3], ("Tax PIN:".to_string(), "A001".to_string()));
    }

    #[test]
    fn payslip_regions_contain_both_tables() {
        let slip = Payslip::resolve(&payslip_input(), "KES").unwrap();
        let regions = slip.regions(&DocumentStyle::payslip());
        let tables: Vec<&Table> = regions
            .iter()
            .filter_map(|r| match r {
                Region::Table(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 2); // basic salary + housing
        assert_eq!(tables[1].rows.len(), 1);
    }

    #[test]
    fn form_deductions_reduce_net_pay() {
        let json = r#"{"employee_name": "Jane", "employee_id": "E1", "period": "March-2024",
                       "basic_salary": "1000",
                       "allowances": [{"name": "Housing", "amount": 200}],
                       "deductions": [{"name": "Tax", "amount": 300}]}"#;
        let input = PayslipInput::from_json(json).unwrap();
        let slip = Payslip::resolve(&input, "KES").unwrap();
        assert_eq!(slip.totals.total_earnings, Decimal::new(1200, 0));
        assert_eq!(slip.totals.net_pay, Decimal::new(900, 0));
    }

    #[test]
    fn bad_line_item_amount_fails_before_layout() {
        let mut input = payslip_input();
        input.line_items[0].amount = AmountField::from("lots");
        assert!(Payslip::resolve(&input, "KES").unwrap_err().is_client_error());
    }

    #[test]
    fn statement_without_transactions_has_no_table() {
        let input = StatementInput {
            issuer: IssuerInput::default(),
            account_name: "Jane".into(),
            account_number: "001".into(),
            period_start: "2024-01-01".into(),
            period_end: "2024-01-31".into(),
            currency: Some("USD".into()),
            opening_balance: Some(AmountField::from("250.00")),
            transactions: Vec::new(),
        };
        let st = Statement::resolve(&input, "KES").unwrap();
        assert_eq!(st.header.issuer_name, "Bank Name");
        assert_eq!(st.ledger.closing_balance(), Decimal::new(250, 0));
        let regions = st.regions(&DocumentStyle::statement());
        assert!(regions.iter().all(|r| !matches!(r, Region::Table(_))));
    }

    #[test]
    fn statement_rows_follow_ledger_order() {
        let input = StatementInput {
            issuer: IssuerInput::default(),
            account_name: "Jane".into(),
            account_number: "001".into(),
            period_start: "2024-01-01".into(),
            period_end: "2024-01-31".into(),
            currency: None,
            opening_balance: None,
            transactions: vec![
                TransactionInput {
                    id: "B".into(),
                    date: "2024-01-09".into(),
                    description: "second".into(),
                    amount_in: Some(AmountField::from(5)),
                    amount_out: None,
                },
                TransactionInput {
                    id: "A".into(),
                    date: "2024-01-02".into(),
                    description: "first".into(),
                    amount_in: None,
                    amount_out: Some(AmountField::from(2)),
                },
            ],
        };
        let st = Statement::resolve(&input, "KES").unwrap();
        let table = st.transaction_table();
        assert_eq!(table.rows[0][2].value, CellValue::Clipped("B".into()));
        assert_eq!(table.rows[1][6].value, CellValue::Amount(Decimal::new(3, 0)));
    }
}
