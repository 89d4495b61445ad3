//! Outgoing amount totals for a pending transaction.

use crate::domain::{Balance, EngineError, Transaction};

/// Sum recipient amounts per token, in first-seen token order.
///
/// Non-transfer transactions and transactions without decoded calls yield an
/// empty list.
pub fn calc_sum_outgoing(transaction: &Transaction) -> Result<Vec<Balance>, EngineError> {
    let recipients = match transaction.decoded() {
        Some(decoded) => decoded.recipients(),
        None => return Ok(Vec::new()),
    };

    let mut totals: Vec<Balance> = Vec::new();
    for recipient in recipients {
        match totals
            .iter_mut()
            .find(|total| total.token.id == recipient.balance.token.id)
        {
            Some(total) => *total = total.checked_add(&recipient.balance)?,
            None => totals.push(recipient.balance.clone()),
        }
    }
    Ok(totals)
}
