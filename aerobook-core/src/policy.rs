use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction of the fare returned to the traveller, by time left before departure.
///
/// 72h or more: 90%, 24h: 70%, 6h: 40%, under 6h: 10%, departed: nothing.
pub fn refund_fraction(departure_time: DateTime<Utc>, now: DateTime<Utc>) -> Decimal {
    if departure_time <= now {
        return Decimal::ZERO;
    }
    let hours = (departure_time - now).num_hours();
    if hours >= 72 {
        Decimal::new(90, 2)
    } else if hours >= 24 {
        Decimal::new(70, 2)
    } else if hours >= 6 {
        Decimal::new(40, 2)
    } else {
        Decimal::new(10, 2)
    }
}

/// Refund amount for a fare under the given policy fraction, rounded to
/// cents with half-up midpoints.
pub fn refund_amount(total_fare: Decimal, fraction: Decimal) -> Decimal {
    (total_fare * fraction).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn departure_in(hours: i64, minutes: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now + Duration::hours(hours) + Duration::minutes(minutes), now)
    }

    #[test]
    fn test_refund_tiers() {
        let (dep, now) = departure_in(100, 0);
        assert_eq!(refund_fraction(dep, now), dec!(0.90));

        let (dep, now) = departure_in(30, 0);
        assert_eq!(refund_fraction(dep, now), dec!(0.70));

        let (dep, now) = departure_in(10, 0);
        assert_eq!(refund_fraction(dep, now), dec!(0.40));

        let (dep, now) = departure_in(2, 0);
        assert_eq!(refund_fraction(dep, now), dec!(0.10));
    }

    #[test]
    fn test_tier_boundaries() {
        let (dep, now) = departure_in(72, 0);
        assert_eq!(refund_fraction(dep, now), dec!(0.90));

        let (dep, now) = departure_in(71, 59);
        assert_eq!(refund_fraction(dep, now), dec!(0.70));

        let (dep, now) = departure_in(24, 0);
        assert_eq!(refund_fraction(dep, now), dec!(0.70));

        let (dep, now) = departure_in(6, 0);
        assert_eq!(refund_fraction(dep, now), dec!(0.40));

        let (dep, now) = departure_in(0, 30);
        assert_eq!(refund_fraction(dep, now), dec!(0.10));
    }

    #[test]
    fn test_departed_flight_gets_nothing() {
        let now = Utc::now();
        assert_eq!(refund_fraction(now - Duration::minutes(30), now), Decimal::ZERO);
        assert_eq!(refund_fraction(now - Duration::hours(5), now), Decimal::ZERO);
        assert_eq!(refund_fraction(now, now), Decimal::ZERO);
    }

    #[test]
    fn test_refund_amount_rounding() {
        assert_eq!(refund_amount(dec!(1000.00), dec!(0.90)), dec!(900.00));
        assert_eq!(refund_amount(dec!(333.33), dec!(0.40)), dec!(133.33));
        // exact midpoint rounds up
        assert_eq!(refund_amount(dec!(101.25), dec!(0.10)), dec!(10.13));
    }
}
