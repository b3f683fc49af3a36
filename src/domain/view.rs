use serde::Serialize;

use super::{
    format_cents, format_date, Cents, FilterMode, PaymentTiming, Transaction, TransactionId,
    TransactionSummaryDerived, TransactionType,
};

/// Which variant of the transaction screen a user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Resident,
    Administrator,
}

impl ViewMode {
    /// Only the literal `resident` role gets the resident view.
    pub fn from_role(role: &str) -> Self {
        if role == "resident" {
            ViewMode::Resident
        } else {
            ViewMode::Administrator
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    MyPayments,
    Income,
    Expense,
    Balance,
}

impl CardKind {
    pub fn title(&self) -> &'static str {
        match self {
            CardKind::MyPayments => "My total payments",
            CardKind::Income => "Income",
            CardKind::Expense => "Expenses",
            CardKind::Balance => "Balance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryCard {
    pub kind: CardKind,
    pub amount: Cents,
}

/// On-time / late / advance split of income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub on_time: Cents,
    pub late: Cents,
    pub late_count: i64,
    pub advance: Cents,
    pub advance_count: i64,
}

/// Tiles inside the breakdown; picking one switches the lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownTile {
    OnTime,
    Late,
    Advance,
}

impl BreakdownTile {
    pub fn mode(&self) -> FilterMode {
        match self {
            BreakdownTile::OnTime => FilterMode::Normal,
            BreakdownTile::Late => FilterMode::Late,
            BreakdownTile::Advance => FilterMode::Advance,
        }
    }
}

/// Dismissible notice shown while a non-default lens is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeBanner {
    pub mode: FilterMode,
}

impl ModeBanner {
    pub fn message(&self) -> &'static str {
        match self.mode {
            FilterMode::Late => "Showing late payments only",
            FilterMode::Advance => "Showing advance payments only",
            FilterMode::Normal => "Showing all payments",
        }
    }

    /// Lens to return to when the banner is dismissed.
    pub fn dismiss(&self) -> FilterMode {
        FilterMode::Normal
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub view_mode: ViewMode,
    pub cards: Vec<SummaryCard>,
    pub breakdown: Option<Breakdown>,
    pub banner: Option<ModeBanner>,
}

/// Pick the summary layout for a role and decide whether the breakdown and
/// the lens banner apply.
pub fn select_summary_view(
    view_mode: ViewMode,
    summary: &TransactionSummaryDerived,
    type_filter: Option<TransactionType>,
) -> SummaryView {
    let cards = match view_mode {
        ViewMode::Resident => vec![SummaryCard {
            kind: CardKind::MyPayments,
            amount: summary.total_income(),
        }],
        ViewMode::Administrator => vec![
            SummaryCard {
                kind: CardKind::Income,
                amount: summary.total_income(),
            },
            SummaryCard {
                kind: CardKind::Expense,
                amount: summary.total_expense(),
            },
            SummaryCard {
                kind: CardKind::Balance,
                amount: summary.net_balance(),
            },
        ],
    };

    let show_breakdown =
        type_filter != Some(TransactionType::Expense) && summary.mode == FilterMode::Normal;
    let breakdown = show_breakdown.then(|| Breakdown {
        on_time: summary.normal_payment_amount,
        late: summary.raw.late_payment_amount,
        late_count: summary.raw.late_payment_count,
        advance: summary.raw.advance_payment_amount,
        advance_count: summary.raw.advance_payment_count,
    });

    let banner = (!summary.mode.is_default()).then_some(ModeBanner { mode: summary.mode });

    SummaryView {
        view_mode,
        cards,
        breakdown,
        banner,
    }
}

/// One list row, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub date: String,
    pub description: String,
    pub category: String,
    pub unit: Option<String>,
    pub amount: String,
    pub badge: Option<PaymentTiming>,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        let signed = tx.signed_amount();
        let amount = if signed > 0 {
            format!("+{}", format_cents(signed))
        } else {
            format_cents(signed)
        };
        Self {
            id: tx.id,
            date: format_date(tx.transaction_date),
            description: tx.description.clone(),
            category: tx.category_name.clone(),
            unit: tx.unit_number.clone(),
            amount,
            // Only deviations are badged; on-time rows stay plain.
            badge: tx.timing().filter(|t| *t != PaymentTiming::OnTime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive, TransactionSummaryRaw};

    fn summary(mode: FilterMode) -> TransactionSummaryDerived {
        derive(
            TransactionSummaryRaw {
                total_income: 100000,
                total_expense: 40000,
                net_balance: 60000,
                late_payment_amount: 30000,
                late_payment_count: 2,
                advance_payment_amount: 20000,
                advance_payment_count: 1,
                transaction_count: 9,
            },
            mode,
        )
    }

    #[test]
    fn test_role_dispatch() {
        assert_eq!(ViewMode::from_role("resident"), ViewMode::Resident);
        assert_eq!(ViewMode::from_role("admin"), ViewMode::Administrator);
        assert_eq!(ViewMode::from_role("accountant"), ViewMode::Administrator);
        assert_eq!(ViewMode::from_role("Resident"), ViewMode::Administrator);
    }

    #[test]
    fn test_resident_single_card() {
        let view = select_summary_view(ViewMode::Resident, &summary(FilterMode::Normal), None);
        assert_eq!(view.cards.len(), 1);
        assert_eq!(view.cards[0].kind, CardKind::MyPayments);
        assert_eq!(view.cards[0].amount, 100000);
    }

    #[test]
    fn test_admin_carousel_with_breakdown() {
        let view = select_summary_view(ViewMode::Administrator, &summary(FilterMode::Normal), None);
        let kinds: Vec<CardKind> = view.cards.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CardKind::Income, CardKind::Expense, CardKind::Balance]);
        let breakdown = view.breakdown.unwrap();
        assert_eq!(breakdown.on_time, 50000);
        assert_eq!(breakdown.late_count, 2);
        assert!(view.banner.is_none());
    }

    #[test]
    fn test_breakdown_hidden_for_expense_or_lens() {
        let expense = select_summary_view(
            ViewMode::Administrator,
            &summary(FilterMode::Normal),
            Some(TransactionType::Expense),
        );
        assert!(expense.breakdown.is_none());

        let late = select_summary_view(ViewMode::Administrator, &summary(FilterMode::Late), None);
        assert!(late.breakdown.is_none());
        let banner = late.banner.unwrap();
        assert_eq!(banner.mode, FilterMode::Late);
        assert_eq!(banner.dismiss(), FilterMode::Normal);
    }

    #[test]
    fn test_tiles_map_to_modes() {
        assert_eq!(BreakdownTile::Late.mode(), FilterMode::Late);
        assert_eq!(BreakdownTile::Advance.mode(), FilterMode::Advance);
        assert_eq!(BreakdownTile::OnTime.mode(), FilterMode::Normal);
    }
}
