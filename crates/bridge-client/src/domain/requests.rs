//! Request tags recognized by the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations a host understands.
///
/// Payloads and results stay opaque JSON; the host owns their shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestTag {
    GetContext,
    CreateExpense,
    CreateIncome,
    ListMonthTransactions,
    GetRangeSummary,
    ListCategories,
    CreatePaymentPlan,
    ListPaymentPlans,
    CreateIncomePlan,
    ListIncomePlans,
    ListOverduePayments,
}

impl RequestTag {
    /// All recognized tags.
    pub const ALL: [RequestTag; 11] = [
        RequestTag::GetContext,
        RequestTag::CreateExpense,
        RequestTag::CreateIncome,
        RequestTag::ListMonthTransactions,
        RequestTag::GetRangeSummary,
        RequestTag::ListCategories,
        RequestTag::CreatePaymentPlan,
        RequestTag::ListPaymentPlans,
        RequestTag::CreateIncomePlan,
        RequestTag::ListIncomePlans,
        RequestTag::ListOverduePayments,
    ];

    /// Wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestTag::GetContext => "GET_CONTEXT",
            RequestTag::CreateExpense => "CREATE_EXPENSE",
            RequestTag::CreateIncome => "CREATE_INCOME",
            RequestTag::ListMonthTransactions => "LIST_MONTH_TRANSACTIONS",
            RequestTag::GetRangeSummary => "GET_RANGE_SUMMARY",
            RequestTag::ListCategories => "LIST_CATEGORIES",
            RequestTag::CreatePaymentPlan => "CREATE_PAYMENT_PLAN",
            RequestTag::ListPaymentPlans => "LIST_PAYMENT_PLANS",
            RequestTag::CreateIncomePlan => "CREATE_INCOME_PLAN",
            RequestTag::ListIncomePlans => "LIST_INCOME_PLANS",
            RequestTag::ListOverduePayments => "LIST_OVERDUE_PAYMENTS",
        }
    }
}

impl AsRef<str> for RequestTag {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
