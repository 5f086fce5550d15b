//! Pricing engine: rate × duration.

use rust_decimal::Decimal;

use crate::domain::bookings::DurationType;

/// The three stored rates of an employee profile.
#[derive(Debug, Clone, Copy)]
pub struct RateTable {
    pub hourly: Decimal,
    pub daily: Decimal,
    pub monthly: Decimal,
}

impl RateTable {
    /// Rate matching a duration type. An unrecognized duration type prices
    /// at zero instead of erroring; kept for compatibility with the
    /// existing booking contract.
    pub fn rate_for(&self, duration_type: &str) -> Decimal {
        match DurationType::parse(duration_type) {
            Some(DurationType::Hourly) => self.hourly,
            Some(DurationType::Daily) => self.daily,
            Some(DurationType::Monthly) => self.monthly,
            None => Decimal::ZERO,
        }
    }
}

/// Cost quote captured once at booking creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingQuote {
    pub rate_applied: Decimal,
    pub total_cost: Decimal,
}

/// Quote a booking: rate matching the duration type × duration value.
pub fn calculate_booking_cost(
    rates: &RateTable,
    duration_type: &str,
    duration_value: i32,
) -> BookingQuote {
    let rate_applied = rates.rate_for(duration_type);
    BookingQuote {
        rate_applied,
        total_cost: rate_applied * Decimal::from(duration_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> RateTable {
        RateTable {
            hourly: Decimal::from(20),
            daily: Decimal::from(150),
            monthly: Decimal::from(3000),
        }
    }

    #[test]
    fn hourly_rate_times_duration() {
        let quote = calculate_booking_cost(&rates(), "hourly", 3);
        assert_eq!(quote.rate_applied, Decimal::from(20));
        assert_eq!(quote.total_cost, Decimal::from(60));
    }

    #[test]
    fn each_duration_type_selects_its_rate() {
        assert_eq!(
            calculate_booking_cost(&rates(), "daily", 2).total_cost,
            Decimal::from(300)
        );
        assert_eq!(
            calculate_booking_cost(&rates(), "monthly", 1).total_cost,
            Decimal::from(3000)
        );
    }

    #[test]
    fn unknown_duration_type_degrades_to_zero() {
        let quote = calculate_booking_cost(&rates(), "yearly", 12);
        assert_eq!(quote.rate_applied, Decimal::ZERO);
        assert_eq!(quote.total_cost, Decimal::ZERO);
    }
}
