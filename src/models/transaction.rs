use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage and wire format of a transaction date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[serde(alias = "Receita", alias = "receita")]
    Income,
    #[serde(alias = "Despesa", alias = "despesa")]
    Expense,
    #[serde(alias = "Investimento", alias = "investimento")]
    Investment,
}

#[derive(Debug, Error)]
#[error("unknown transaction kind: {0}")]
pub struct UnknownKind(pub String);

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Investment => "investment",
        }
    }

    /// Display label used by the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Receita",
            TransactionKind::Expense => "Despesa",
            TransactionKind::Investment => "Investimento",
        }
    }

    /// Accepts the stored form as well as the pt-BR labels, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "receita" | "receitas" => Some(TransactionKind::Income),
            "expense" | "despesa" | "despesas" => Some(TransactionKind::Expense),
            "investment" | "investimento" | "investimentos" => Some(TransactionKind::Investment),
            _ => None,
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownKind(s.to_string()))
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// Calendar date, `YYYY-MM-DD`. Kept as text so a malformed row can be
    /// skipped by the dashboard instead of failing the whole load.
    pub date: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub description: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub installments: Option<String>,
}

impl Transaction {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    pub fn is_kind(&self, kind: TransactionKind) -> bool {
        self.kind == kind
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub description: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub method: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub installments: Option<String>,
}

fn default_status() -> String {
    "Concluído".into()
}

impl NewTransaction {
    /// Checks the fields a stored transaction relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount_cents < 0 {
            return Err("Amount must not be negative".into());
        }
        if NaiveDate::parse_from_str(&self.date, DATE_FORMAT).is_err() {
            return Err(format!("Invalid date: {}", self.date));
        }
        if let Some(due) = &self.due_date {
            if NaiveDate::parse_from_str(due, DATE_FORMAT).is_err() {
                return Err(format!("Invalid due date: {}", due));
            }
        }
        if self.description.trim().is_empty() {
            return Err("Description is required".into());
        }
        Ok(())
    }

    pub fn into_transaction(self, id: i64) -> Transaction {
        Transaction {
            id,
            date: self.date,
            due_date: self.due_date,
            amount_cents: self.amount_cents,
            kind: self.kind,
            description: self.description,
            destination: self.destination,
            category: self.category,
            subcategory: self.subcategory,
            classification: self.classification,
            method: self.method,
            status: self.status,
            installments: self.installments,
        }
    }
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub amount_cents: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub classification: Option<String>,
    pub method: Option<String>,
    pub status: Option<String>,
    pub installments: Option<String>,
}

impl TransactionPatch {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.amount_cents, Some(a) if a < 0) {
            return Err("Amount must not be negative".into());
        }
        if let Some(date) = &self.date {
            if NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() {
                return Err(format!("Invalid date: {}", date));
            }
        }
        if let Some(due) = &self.due_date {
            if NaiveDate::parse_from_str(due, DATE_FORMAT).is_err() {
                return Err(format!("Invalid due date: {}", due));
            }
        }
        if matches!(&self.description, Some(d) if d.trim().is_empty()) {
            return Err("Description is required".into());
        }
        Ok(())
    }

    pub fn apply(&self, transaction: &mut Transaction) {
        if let Some(v) = &self.date {
            transaction.date = v.clone();
        }
        if let Some(v) = &self.due_date {
            transaction.due_date = Some(v.clone());
        }
        if let Some(v) = self.amount_cents {
            transaction.amount_cents = v;
        }
        if let Some(v) = self.kind {
            transaction.kind = v;
        }
        if let Some(v) = &self.description {
            transaction.description = v.clone();
        }
        if let Some(v) = &self.destination {
            transaction.destination = v.clone();
        }
        if let Some(v) = &self.category {
            transaction.category = Some(v.clone());
        }
        if let Some(v) = &self.subcategory {
            transaction.subcategory = Some(v.clone());
        }
        if let Some(v) = &self.classification {
            transaction.classification = Some(v.clone());
        }
        if let Some(v) = &self.method {
            transaction.method = v.clone();
        }
        if let Some(v) = &self.status {
            transaction.status = v.clone();
        }
        if let Some(v) = &self.installments {
            transaction.installments = Some(v.clone());
        }
    }
}
