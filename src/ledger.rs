//! Ledger Calculator – running balances for statements and derived totals
//! for payslips.
//!
//! Both calculations run before layout, so any bad amount aborts the render
//! without a single page being drawn.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{RenderError, Result};
use crate::model::{parse_date, AmountField, Category, LineItem, TransactionInput};

/// A transaction with parsed amounts and its running balance.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub opening_balance: Decimal,
    pub transactions: Vec<Transaction>,
    total_in: Decimal,
    total_out: Decimal,
}

impl Ledger {
    /// Apply `entries` in the order given, starting from `opening_balance`.
    ///
    /// Entries are never re-sorted. A missing amount is zero; both amounts
    /// are additive, so an entry carrying money in and money out moves the
    /// balance by their difference. Amounts that push the balance or the
    /// totals out of `Decimal` range are rejected like unparseable ones.
    pub fn compute(opening_balance: Decimal, entries: &[TransactionInput]) -> Result<Self> {
        let mut balance = opening_balance;
        let mut total_in = Decimal::ZERO;
        let mut total_out = Decimal::ZERO;
        let mut transactions = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let id = if entry.id.trim().is_empty() {
                format!("#{}", index + 1)
            } else {
                entry.id.clone()
            };
            let (amount_in, amount_out) = parse_amounts(&id, entry)?;
            let date = parse_date(&format!("transactions[{index}].date"), &entry.date)?;

            balance = balance
                .checked_add(amount_in)
                .and_then(|b| b.checked_sub(amount_out))
                .ok_or_else(|| overflow(&id, "running balance"))?;
            total_in = total_in
                .checked_add(amount_in)
                .ok_or_else(|| overflow(&id, "total money in"))?;
            total_out = total_out
                .checked_add(amount_out)
                .ok_or_else(|| overflow(&id, "total money out"))?;
            transactions.push(Transaction {
                id,
                date,
                description: entry.description.clone(),
                amount_in,
                amount_out,
                balance,
            });
        }

        log::debug!(
            "ledger: {} transactions, opening {opening_balance}, closing {balance}",
            transactions.len()
        );
        Ok(Self {
            opening_balance,
            transactions,
            total_in,
            total_out,
        })
    }

    /// Balance after the last transaction, or the opening balance if none.
    pub fn closing_balance(&self) -> Decimal {
        self.transactions
            .last()
            .map(|t| t.balance)
            .unwrap_or(self.opening_balance)
    }

    pub fn total_in(&self) -> Decimal {
        self.total_in
    }

    pub fn total_out(&self) -> Decimal {
        self.total_out
    }
}

fn overflow(id: &str, what: &str) -> RenderError {
    RenderError::MalformedTransaction {
        id: id.to_string(),
        reason: format!("{what} exceeds the representable range"),
    }
}

fn parse_amounts(id: &str, entry: &TransactionInput) -> Result<(Decimal, Decimal)> {
    let amount_in = parse_side(entry.amount_in.as_ref());
    let amount_out = parse_side(entry.amount_out.as_ref());

    match (amount_in, amount_out) {
        (Ok(i), Ok(o)) => Ok((i, o)),
        (Err(a), Err(b)) => Err(RenderError::MalformedTransaction {
            id: id.to_string(),
            reason: format!("amount_in: {a}; amount_out: {b}"),
        }),
        (Err(reason), _) => Err(RenderError::MalformedTransaction {
            id: id.to_string(),
            reason: format!("amount_in: {reason}"),
        }),
        (_, Err(reason)) => Err(RenderError::MalformedTransaction {
            id: id.to_string(),
            reason: format!("amount_out: {reason}"),
        }),
    }
}

fn parse_side(raw: Option<&AmountField>) -> std::result::Result<Decimal, String> {
    let value = match raw {
        None => return Ok(Decimal::ZERO),
        Some(a) => a.to_decimal()?,
    };
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("{value} is negative"));
    }
    Ok(value)
}

/// Derived payslip figures. Never taken from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayslipTotals {
    pub basic_salary: Decimal,
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
}

impl PayslipTotals {
    pub fn compute(basic_salary: Decimal, items: &[LineItem]) -> Result<Self> {
        let total_earnings = sum_category(basic_salary, items, Category::Earning)
            .ok_or_else(|| RenderError::malformed("line_items", "total earnings out of range"))?;
        let total_deductions = sum_category(Decimal::ZERO, items, Category::Deduction)
            .ok_or_else(|| RenderError::malformed("line_items", "total deductions out of range"))?;
        let net_pay = total_earnings
            .checked_sub(total_deductions)
            .ok_or_else(|| RenderError::malformed("line_items", "net pay out of range"))?;
        Ok(Self {
            basic_salary,
            total_earnings,
            total_deductions,
            net_pay,
        })
    }
}

fn sum_category(start: Decimal, items: &[LineItem], category: Category) -> Option<Decimal> {
    items
        .iter()
        .filter(|i| i.category == category)
        .try_fold(start, |acc, i| acc.checked_add(i.amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str, amount_in: Option<AmountField>, amount_out: Option<AmountField>) -> TransactionInput {
        TransactionInput {
            id: id.to_string(),
            date: "2024-01-15".to_string(),
            description: "entry".to_string(),
            amount_in,
            amount_out,
        }
    }

    fn amt(n: i64) -> AmountField {
        AmountField::from(n)
    }

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn running_balance_example() {
        let entries = vec![
            tx("T1", Some(amt(500)), Some(amt(0))),
            tx("T2", Some(amt(0)), Some(amt(200))),
            tx("T3", Some(amt(0)), Some(amt(0))),
        ];
        let ledger = Ledger::compute(Decimal::new(100000, 2), &entries).unwrap();
        let balances: Vec<Decimal> = ledger.transactions.iter().map(|t| t.balance).collect();
        assert_eq!(balances, vec![dec(1500), dec(1300), dec(1300)]);
        assert_eq!(ledger.closing_balance(), dec(1300));
        assert_eq!(ledger.total_in(), dec(500));
        assert_eq!(ledger.total_out(), dec(200));
    }

    #[test]
    fn balance_invariant_holds_for_every_entry() {
        let entries: Vec<TransactionInput> = (0..40)
            .map(|i| {
                tx(
                    &format!("T{i}"),
                    Some(AmountField::from((i * 37 % 11) as i64)),
                    Some(AmountField::from((i * 13 % 7) as i64)),
                )
            })
            .collect();
        let opening = Decimal::new(25050, 2);
        let ledger = Ledger::compute(opening, &entries).unwrap();
        let mut previous = opening;
        for t in &ledger.transactions {
            assert_eq!(t.balance, previous + t.amount_in - t.amount_out);
            previous = t.balance;
        }
        assert_eq!(ledger.closing_balance(), previous);
    }

    #[test]
    fn empty_ledger_closes_at_opening_balance() {
        let ledger = Ledger::compute(dec(42), &[]).unwrap();
        assert_eq!(ledger.closing_balance(), dec(42));
    }

    #[test]
    fn missing_amounts_count_as_zero() {
        let ledger = Ledger::compute(dec(10), &[tx("T1", None, Some(amt(3)))]).unwrap();
        assert_eq!(ledger.closing_balance(), dec(7));
    }

    #[test]
    fn both_amounts_are_additive() {
        let ledger =
            Ledger::compute(dec(100), &[tx("T1", Some(amt(50)), Some(amt(20)))]).unwrap();
        assert_eq!(ledger.closing_balance(), dec(130));
    }

    #[test]
    fn order_is_preserved() {
        let mut late = tx("late", Some(amt(1)), None);
        late.date = "2024-02-01".into();
        let early = tx("early", Some(amt(2)), None);
        let ledger = Ledger::compute(dec(0), &[late, early]).unwrap();
        assert_eq!(ledger.transactions[0].id, "late");
        assert_eq!(ledger.transactions[0].balance, dec(1));
    }

    #[test]
    fn unparseable_amounts_are_malformed() {
        let bad = tx("T9", Some("abc".into()), Some("xyz".into()));
        match Ledger::compute(dec(0), &[bad]) {
            Err(RenderError::MalformedTransaction { id, .. }) => assert_eq!(id, "T9"),
            other => panic!("expected MalformedTransaction, got {other:?}"),
        }
    }

    #[test]
    fn negative_amount_is_malformed() {
        let bad = tx("T1", Some("-5".into()), None);
        let err = Ledger::compute(dec(0), &[bad]).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn bad_date_is_malformed_input() {
        let mut bad = tx("T1", Some(amt(1)), None);
        bad.date = "15/01/2024".into();
        assert!(matches!(
            Ledger::compute(dec(0), &[bad]),
            Err(RenderError::MalformedInput { .. })
        ));
    }

    #[test]
    fn payslip_totals_example() {
        let items = vec![
            LineItem {
                label: "Housing".into(),
                amount: dec(10000),
                category: Category::Earning,
            },
            LineItem {
                label: "Tax".into(),
                amount: dec(5000),
                category: Category::Deduction,
            },
        ];
        let totals = PayslipTotals::compute(dec(50000), &items).unwrap();
        assert_eq!(totals.total_earnings, dec(60000));
        assert_eq!(totals.total_deductions, dec(5000));
        assert_eq!(totals.net_pay, dec(55000));
    }

    #[test]
    fn payslip_without_items_nets_basic_salary() {
        let totals = PayslipTotals::compute(dec(3200), &[]).unwrap();
        assert_eq!(totals.net_pay, dec(3200));
        assert_eq!(totals.total_deductions, Decimal::ZERO);
    }

    #[test]
    fn negative_net_pay_is_not_clamped() {
        let items = vec![LineItem {
            label: "Advance recovery".into(),
            amount: dec(800),
            category: Category::Deduction,
        }];
        let totals = PayslipTotals::compute(dec(500), &items).unwrap();
        assert_eq!(totals.net_pay, dec(-300));
    }

    #[test]
    fn balance_overflow_is_rejected() {
        let entries = vec![tx("T1", Some(amt(1)), None)];
        match Ledger::compute(Decimal::MAX, &entries) {
            Err(RenderError::MalformedTransaction { id, .. }) => assert_eq!(id, "T1"),
            other => panic!("expected MalformedTransaction, got {other:?}"),
        }
    }

    #[test]
    fn totals_overflow_is_rejected() {
        let entries = vec![
            tx("T1", Some(AmountField::from(Decimal::MAX)), Some(AmountField::from(Decimal::MAX))),
            tx("T2", Some(amt(1)), Some(amt(1))),
        ];
        assert!(matches!(
            Ledger::compute(Decimal::ZERO, &entries),
            Err(RenderError::MalformedTransaction { .. })
        ));
    }

    #[test]
    fn payslip_overflow_is_malformed_input() {
        let items = vec![LineItem {
            label: "Bonus".into(),
            amount: Decimal::MAX,
            category: Category::Earning,
        }];
        let err = PayslipTotals::compute(dec(1), &items).unwrap_err();
        assert!(matches!(err, RenderError::MalformedInput { .. }));
    }
}
