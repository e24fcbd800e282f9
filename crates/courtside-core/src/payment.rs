use anyhow::bail;
use courtside_shared::PaymentUpdateDto;

use crate::booking::Booking;
use crate::format::format_inr;

/// New advance/pending pair after taking `additional` from the customer.
///
/// The payment must be non-negative and may not exceed the pending balance.
pub fn settle_payment(booking: &Booking, additional: f64) -> anyhow::Result<PaymentUpdateDto> {
    if !additional.is_finite() || additional < 0.0 {
        bail!("payment must be a non-negative amount, got {additional}");
    }

    let Some(pending) = booking.pending_amount else {
        bail!("booking {} has no pending balance recorded", booking.id);
    };

    if additional > pending {
        bail!(
            "payment of {} exceeds pending balance of {} for booking {}",
            format_inr(additional),
            format_inr(pending),
            booking.id
        );
    }

    Ok(PaymentUpdateDto {
        advance_amount: booking.advance_amount + additional,
        pending_amount: pending - additional,
    })
}
