use serde::{Deserialize, Serialize};

/// Semantic category of an amount found on a bill.
///
/// The set is closed: classification either produces one of these
/// variants or drops the amount for lack of textual evidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AmountKind {
    Total,
    Subtotal,
    Tax,
    Due,
    Paid,
    Balance,
    Discount,
    Mrp,
    Charges,
    OtherCharges,
}

impl AmountKind {
    pub const ALL: [AmountKind; 10] = [
        AmountKind::Total,
        AmountKind::Subtotal,
        AmountKind::Tax,
        AmountKind::Due,
        AmountKind::Paid,
        AmountKind::Balance,
        AmountKind::Discount,
        AmountKind::Mrp,
        AmountKind::Charges,
        AmountKind::OtherCharges,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountKind::Total => "total",
            AmountKind::Subtotal => "subtotal",
            AmountKind::Tax => "tax",
            AmountKind::Due => "due",
            AmountKind::Paid => "paid",
            AmountKind::Balance => "balance",
            AmountKind::Discount => "discount",
            AmountKind::Mrp => "mrp",
            AmountKind::Charges => "charges",
            AmountKind::OtherCharges => "other_charges",
        }
    }
}

impl std::fmt::Display for AmountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AmountKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(AmountKind::Total),
            "subtotal" => Ok(AmountKind::Subtotal),
            "tax" => Ok(AmountKind::Tax),
            "due" => Ok(AmountKind::Due),
            "paid" => Ok(AmountKind::Paid),
            "balance" => Ok(AmountKind::Balance),
            "discount" => Ok(AmountKind::Discount),
            "mrp" => Ok(AmountKind::Mrp),
            "charges" => Ok(AmountKind::Charges),
            "other_charges" => Ok(AmountKind::OtherCharges),
            other => Err(format!("Unknown amount kind: '{other}'")),
        }
    }
}

/// A candidate amount that has been assigned a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedAmount {
    #[serde(rename = "type")]
    pub kind: AmountKind,
    pub value: f64,
}

impl ClassifiedAmount {
    pub fn new(kind: AmountKind, value: f64) -> Self {
        Self { kind, value }
    }
}

/// A classified amount annotated with the source-text line cited as
/// evidence. This is the user-facing record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalAmount {
    #[serde(rename = "type")]
    pub kind: AmountKind,
    pub value: f64,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_roundtrips_through_string_form() {
        for kind in AmountKind::ALL {
            assert_eq!(AmountKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn kind_rejects_free_form_strings() {
        assert!(AmountKind::from_str("grand_total").is_err());
        assert!(AmountKind::from_str("Total").is_err());
        assert!(AmountKind::from_str("").is_err());
    }

    #[test]
    fn classified_amount_serializes_with_type_field() {
        let amount = ClassifiedAmount::new(AmountKind::OtherCharges, 745.0);
        let json = serde_json::to_value(&amount).unwrap();
        assert_eq!(json["type"], "other_charges");
        assert_eq!(json["value"], 745.0);
    }

    #[test]
    fn final_amount_deserializes_wire_shape() {
        let json = r#"{"type":"tax","value":157.05,"source":"TAX 9% 157.05"}"#;
        let amount: FinalAmount = serde_json::from_str(json).unwrap();
        assert_eq!(amount.kind, AmountKind::Tax);
        assert_eq!(amount.value, 157.05);
        assert_eq!(amount.source, "TAX 9% 157.05");
    }
}
