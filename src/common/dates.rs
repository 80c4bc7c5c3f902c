// src/common/dates.rs

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Data civil ("hoje") no fuso da corretora.
///
/// Toda a aritmética de vencimentos trabalha com `NaiveDate`, então o fuso só
/// entra aqui, uma única vez, na conversão do instante atual.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn late_utc_evening_is_already_tomorrow_in_kolkata() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let today = today_in(chrono_tz::Asia::Kolkata, now);
        assert_eq!(today, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn utc_zone_keeps_the_date() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap();
        assert_eq!(today_in(chrono_tz::UTC, now), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
