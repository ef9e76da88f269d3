//! Stage 6: trace each classified amount back to the document line it
//! came from, for the `source` field of the final output.

use tally_core::AmountKind;

/// Keywords that corroborate an amount's classification on its line.
fn keywords(kind: AmountKind) -> &'static [&'static str] {
    match kind {
        AmountKind::Total => &["total", "bill", "gross", "amount", "payable"],
        AmountKind::Subtotal => &["subtotal", "sub total"],
        AmountKind::Tax => &["tax", "gst", "cgst", "sgst", "igst", "vat"],
        AmountKind::Due => &["due", "balance", "pending", "payable"],
        AmountKind::Paid => &["paid", "payment", "received"],
        AmountKind::Balance => &["balance"],
        AmountKind::Discount => &["discount", "off", "saving"],
        AmountKind::Mrp => &["mrp"],
        AmountKind::Charges => &["charges", "charge", "fee"],
        AmountKind::OtherCharges => {
            &["service", "charge", "registration", "consult", "room"]
        }
    }
}

/// The textual renderings an amount may take on a bill.
fn renderings(value: f64) -> Vec<String> {
    let plain = value.to_string();
    let two_decimals = format!("{value:.2}");
    vec![
        two_decimals.clone(),
        plain.clone(),
        format!("₹ {plain}"),
        format!("₹{plain}"),
        format!("Rs. {plain}"),
        format!("Rs {plain}"),
        format!("$ {two_decimals}"),
        format!("${two_decimals}"),
    ]
}

/// Find the line an amount came from. Pass one wants the amount and a
/// corroborating keyword on the same line; pass two settles for the
/// amount alone; when neither hits, a synthetic label stands in.
pub fn locate(kind: AmountKind, value: f64, text: &str) -> String {
    let forms = renderings(value);
    let words = keywords(kind);

    let holds_amount =
        |line: &str| forms.iter().any(|form| line.contains(form.as_str()));

    for line in text.lines() {
        let lower = line.to_lowercase();
        if holds_amount(line) && words.iter().any(|w| lower.contains(w)) {
            return line.trim().to_string();
        }
    }
    for line in text.lines() {
        if holds_amount(line) {
            return line.trim().to_string();
        }
    }
    format!("{kind}: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str =
        "  SUB TOTAL 745.00  \nGST 157.05\nTOTAL 1902.05\nRef 1902\nAmount DUE 1745.00";

    #[test]
    fn prefers_the_line_with_a_matching_keyword() {
        assert_eq!(locate(AmountKind::Total, 1902.05, RECEIPT), "TOTAL 1902.05");
        assert_eq!(locate(AmountKind::Due, 1745.0, RECEIPT), "Amount DUE 1745.00");
        assert_eq!(locate(AmountKind::Tax, 157.05, RECEIPT), "GST 157.05");
    }

    #[test]
    fn lines_are_trimmed() {
        assert_eq!(locate(AmountKind::Subtotal, 745.0, RECEIPT), "SUB TOTAL 745.00");
    }

    #[test]
    fn falls_back_to_any_line_holding_the_amount() {
        let text = "something 450.00 here\nno keywords anywhere";
        assert_eq!(locate(AmountKind::Paid, 450.0, text), "something 450.00 here");
    }

    #[test]
    fn synthesizes_a_label_when_the_amount_is_absent() {
        assert_eq!(locate(AmountKind::Total, 99.5, "unrelated text"), "total: 99.5");
    }

    #[test]
    fn matches_symbol_prefixed_renderings() {
        let text = "Paid ₹1745 by card";
        assert_eq!(locate(AmountKind::Paid, 1745.0, text), "Paid ₹1745 by card");
    }
}
