//! Billing vocabulary detection. The detected term set is embedded in
//! the classification prompt and drives the rule fallback.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_mrp, r"(?i)\bmrp\b");
re!(re_total, r"(?i)\btotal\b");
re!(re_subtotal, r"(?i)\bsub\s*total\b");
re!(re_discount, r"(?i)\bdiscount\b|\bsaving\b");
re!(re_tax, r"(?i)\btax\b|\bgst\b|\bcgst\b|\bsgst\b|\bigst\b|\bvat\b");
re!(re_due, r"(?i)\bdue\b|\bpayable\b");
re!(re_paid, r"(?i)\bpaid\b|\bpayment\b");
re!(re_balance, r"(?i)\bbalance\b");
re!(re_charges, r"(?i)\bcharges?\b|\bfee\b");
re!(re_registration, r"(?i)\bregistration\b");
re!(re_consultation, r"(?i)\bconsult|\bexamination\b");
re!(re_room, r"(?i)\broom\b|\bbed\b");
re!(re_service, r"(?i)\bservice\b");

/// One billing term observed in the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Term {
    Mrp,
    Total,
    Subtotal,
    Discount,
    Tax,
    Due,
    Paid,
    Balance,
    Charges,
    Registration,
    Consultation,
    Room,
    Service,
}

impl Term {
    pub const ALL: [Term; 13] = [
        Term::Mrp,
        Term::Total,
        Term::Subtotal,
        Term::Discount,
        Term::Tax,
        Term::Due,
        Term::Paid,
        Term::Balance,
        Term::Charges,
        Term::Registration,
        Term::Consultation,
        Term::Room,
        Term::Service,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Term::Mrp => "MRP",
            Term::Total => "total",
            Term::Subtotal => "subtotal",
            Term::Discount => "discount",
            Term::Tax => "tax",
            Term::Due => "due",
            Term::Paid => "paid",
            Term::Balance => "balance",
            Term::Charges => "charges",
            Term::Registration => "registration",
            Term::Consultation => "consultation",
            Term::Room => "room",
            Term::Service => "service",
        }
    }

    fn matches(self, text: &str) -> bool {
        let re = match self {
            Term::Mrp => re_mrp(),
            Term::Total => re_total(),
            Term::Subtotal => re_subtotal(),
            Term::Discount => re_discount(),
            Term::Tax => re_tax(),
            Term::Due => re_due(),
            Term::Paid => re_paid(),
            Term::Balance => re_balance(),
            Term::Charges => re_charges(),
            Term::Registration => re_registration(),
            Term::Consultation => re_consultation(),
            Term::Room => re_room(),
            Term::Service => re_service(),
        };
        re.is_match(text)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The set of billing terms present anywhere in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedTerms(BTreeSet<Term>);

impl DetectedTerms {
    pub fn detect(text: &str) -> Self {
        Self(Term::ALL.iter().copied().filter(|t| t.matches(text)).collect())
    }

    pub fn contains(&self, term: Term) -> bool {
        self.0.contains(&term)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Term> + '_ {
        self.0.iter().copied()
    }

    /// Comma-joined labels for prompt embedding.
    pub fn summary(&self) -> String {
        if self.0.is_empty() {
            return "none".to_string();
        }
        self.0
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
