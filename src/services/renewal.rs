// src/services/renewal.rs

//! Classificação de apólices por janela de renovação.
//!
//! Tudo aqui é aritmética de datas civis (`NaiveDate`): sem hora, sem fuso.
//! O "hoje" chega pronto de `common::dates::today_in`.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::{
    dashboard::RenewalCounts,
    notification::MessageType,
    policy::{Policy, PolicyStatus, PolicyWithCustomer, RenewalBucket, RenewalEntry},
};

pub const CRITICAL_MAX_DAYS: i64 = 7;
pub const UPCOMING_MAX_DAYS: i64 = 30;

impl AsRef<Policy> for Policy {
    fn as_ref(&self) -> &Policy {
        self
    }
}

impl AsRef<Policy> for PolicyWithCustomer {
    fn as_ref(&self) -> &Policy {
        &self.policy
    }
}

/// Dias inteiros entre hoje e o vencimento (negativo = já venceu).
pub fn days_remaining(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

pub fn bucket_for_days(days: i64) -> RenewalBucket {
    match days {
        d if d < 0 => RenewalBucket::Expired,
        0..=CRITICAL_MAX_DAYS => RenewalBucket::Critical,
        d if d <= UPCOMING_MAX_DAYS => RenewalBucket::Upcoming,
        _ => RenewalBucket::NotDue,
    }
}

/// Faixa de renovação da apólice. Apólices que não estão ATIVAS ficam de fora (`None`).
pub fn classify(policy: &Policy, today: NaiveDate) -> Option<RenewalBucket> {
    (policy.status == PolicyStatus::Active)
        .then(|| bucket_for_days(days_remaining(policy.end_date, today)))
}

/// `date + days`, saturando em `NaiveDate::MAX` (horizontes enormes não estouram).
pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn sort_by_end_date<T: AsRef<Policy>>(policies: &mut [T]) {
    policies.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        a.end_date
            .cmp(&b.end_date)
            .then_with(|| a.policy_number.cmp(&b.policy_number))
    });
}

/// Apólices ATIVAS que vencem em `[hoje, hoje + horizon_days]`, a mais urgente primeiro.
pub fn policies_within_horizon<T: AsRef<Policy>>(
    policies: impl IntoIterator<Item = T>,
    horizon_days: u32,
    today: NaiveDate,
) -> Vec<T> {
    let limit = add_days(today, u64::from(horizon_days));

    let mut selected: Vec<T> = policies
        .into_iter()
        .filter(|p| {
            let p = p.as_ref();
            p.status == PolicyStatus::Active && p.end_date >= today && p.end_date <= limit
        })
        .collect();

    sort_by_end_date(&mut selected);
    selected
}

/// Monta as linhas da tela de renovações: vencidas, críticas e próximas, ordenadas por vencimento.
pub fn renewal_entries(
    policies: impl IntoIterator<Item = PolicyWithCustomer>,
    today: NaiveDate,
) -> Vec<RenewalEntry> {
    let mut due: Vec<PolicyWithCustomer> = policies
        .into_iter()
        .filter(|p| matches!(classify(&p.policy, today), Some(b) if b != RenewalBucket::NotDue))
        .collect();

    sort_by_end_date(&mut due);
    due.into_iter().map(|p| to_entry(p, today)).collect()
}

/// Anexa `daysRemaining` e a faixa a uma apólice (usado também na consulta por horizonte).
pub fn to_entry(policy: PolicyWithCustomer, today: NaiveDate) -> RenewalEntry {
    let days = days_remaining(policy.policy.end_date, today);
    RenewalEntry { bucket: bucket_for_days(days), days_remaining: days, policy }
}

/// Contagem por faixa para o dashboard.
pub fn count_buckets<'a>(
    policies: impl IntoIterator<Item = &'a Policy>,
    today: NaiveDate,
) -> RenewalCounts {
    policies
        .into_iter()
        .filter_map(|p| classify(p, today))
        .fold(RenewalCounts::default(), |mut acc, bucket| {
            match bucket {
                RenewalBucket::Expired => acc.expired += 1,
                RenewalBucket::Critical => acc.critical += 1,
                RenewalBucket::Upcoming => acc.upcoming += 1,
                RenewalBucket::NotDue => {}
            }
            acc
        })
}

/// Datas de vencimento que disparam lembrete hoje, uma por tipo (30, 15 e 3 dias).
pub fn reminder_target_dates(today: NaiveDate) -> Vec<(MessageType, NaiveDate)> {
    MessageType::RENEWALS
        .iter()
        .filter_map(|kind| {
            kind.lookahead_days()
                .and_then(|d| u64::try_from(d).ok())
                .map(|d| (*kind, add_days(today, d)))
        })
        .collect()
}

/// Seleciona os lembretes de renovação devidos hoje.
///
/// O casamento é exato: a apólice só é elegível para RENEWAL_15 no dia em que
/// faltam exatamente 15 dias. Se o cron não rodar nesse dia, o lembrete se perde.
pub fn renewal_reminders_due<T: AsRef<Policy>>(
    policies: &[T],
    today: NaiveDate,
) -> Vec<(MessageType, &T)> {
    let targets = reminder_target_dates(today);

    let mut due = Vec::new();
    for (kind, target) in targets {
        for p in policies {
            let policy = p.as_ref();
            if policy.status == PolicyStatus::Active && policy.end_date == target {
                due.push((kind, p));
            }
        }
    }
    due
}

/// Aniversário hoje? Compara apenas (mês, dia).
pub fn is_birthday(birth_date: NaiveDate, today: NaiveDate) -> bool {
    birth_date.month() == today.month() && birth_date.day() == today.day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn policy(number: &str, end: &str, status: PolicyStatus) -> Policy {
        Policy {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            customer_id: Uuid::new_v4(),
            agent_id: None,
            policy_number: number.to_string(),
            insurer: "Star Health".into(),
            product: "Family Floater".into(),
            premium: Decimal::new(2500000, 2),
            commission_rate: Decimal::new(1500, 2),
            start_date: date("2023-01-01"),
            end_date: date(end),
            status,
            renewed_from_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn active(number: &str, end: &str) -> Policy {
        policy(number, end, PolicyStatus::Active)
    }

    #[test]
    fn bucket_boundaries() {
        let today = date("2024-01-01");
        let cases = [
            ("2023-12-31", RenewalBucket::Expired),
            ("2024-01-01", RenewalBucket::Critical),
            ("2024-01-08", RenewalBucket::Critical),
            ("2024-01-09", RenewalBucket::Upcoming),
            ("2024-01-31", RenewalBucket::Upcoming),
            ("2024-02-01", RenewalBucket::NotDue),
        ];

        for (end, expected) in cases {
            assert_eq!(classify(&active("P", end), today), Some(expected), "end {end}");
        }
    }

    #[test]
    fn inactive_policies_are_not_classified() {
        let today = date("2024-01-01");
        for status in [PolicyStatus::Cancelled, PolicyStatus::Renewed, PolicyStatus::Expired] {
            assert_eq!(classify(&policy("P", "2024-01-03", status), today), None);
        }
    }

    #[test]
    fn days_are_calendar_days_across_leap_february() {
        assert_eq!(days_remaining(date("2024-03-01"), date("2024-02-28")), 2);
    }

    #[test]
    fn horizon_query_sorts_soonest_first_and_drops_inactive() {
        let today = date("2024-01-01");
        let policies = vec![
            active("C", "2024-01-25"),
            active("A", "2024-01-05"),
            policy("X", "2024-01-02", PolicyStatus::Cancelled),
            active("B", "2024-01-05"),
            active("late", "2024-02-15"),
            active("gone", "2023-12-30"),
        ];

        let selected = policies_within_horizon(policies, 30, today);
        let numbers: Vec<_> = selected.iter().map(|p| p.policy_number.as_str()).collect();

        assert_eq!(numbers, vec!["A", "B", "C"]);
    }

    #[test]
    fn horizon_is_inclusive_on_both_ends() {
        let today = date("2024-01-01");
        let policies = vec![active("today", "2024-01-01"), active("edge", "2024-01-08")];

        assert_eq!(policies_within_horizon(policies.clone(), 7, today).len(), 2);
        assert_eq!(policies_within_horizon(policies, 0, today).len(), 1);
    }

    #[test]
    fn huge_horizon_does_not_overflow() {
        let today = date("2024-01-01");
        let selected = policies_within_horizon(vec![active("far", "2090-01-01")], u32::MAX, today);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn reminder_matches_the_exact_day_only() {
        let today = date("2024-01-01");
        let policies = vec![
            active("d14", "2024-01-15"),
            active("d15", "2024-01-16"),
            active("d16", "2024-01-17"),
        ];

        let due = renewal_reminders_due(&policies, today);
        let fifteen: Vec<_> = due
            .iter()
            .filter(|(kind, _)| *kind == MessageType::Renewal15)
            .map(|(_, p)| p.policy_number.as_str())
            .collect();

        assert_eq!(fifteen, vec!["d15"]);
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn each_lookahead_picks_its_own_policy() {
        let today = date("2024-01-01");
        let policies = vec![
            active("r3", "2024-01-04"),
            active("r30", "2024-01-31"),
            policy("cancelled", "2024-01-16", PolicyStatus::Cancelled),
        ];

        let due: Vec<_> = renewal_reminders_due(&policies, today)
            .into_iter()
            .map(|(kind, p)| (kind, p.policy_number.clone()))
            .collect();

        assert_eq!(
            due,
            vec![
                (MessageType::Renewal30, "r30".to_string()),
                (MessageType::Renewal3, "r3".to_string()),
            ]
        );
    }

    #[test]
    fn birthday_ignores_year() {
        let today = date("2024-07-14");
        assert!(is_birthday(date("1985-07-14"), today));
        assert!(!is_birthday(date("1985-07-15"), today));
    }

    #[test]
    fn leap_day_birthday_only_matches_leap_day() {
        assert!(!is_birthday(date("1992-02-29"), date("2023-02-28")));
        assert!(is_birthday(date("1992-02-29"), date("2024-02-29")));
    }

    #[test]
    fn counts_ignore_not_due_and_inactive() {
        let today = date("2024-01-01");
        let policies = [
            active("a", "2023-12-01"),
            active("b", "2024-01-02"),
            active("c", "2024-01-20"),
            active("d", "2024-06-01"),
            policy("e", "2024-01-02", PolicyStatus::Renewed),
        ];

        let counts = count_buckets(policies.iter(), today);

        assert_eq!(counts, RenewalCounts { expired: 1, critical: 1, upcoming: 1 });
    }

    fn with_customer(policy: Policy) -> PolicyWithCustomer {
        PolicyWithCustomer {
            policy,
            customer_name: "Anita".into(),
            customer_phone: Some("9000000001".into()),
        }
    }

    #[test]
    fn renewal_screen_keeps_due_active_policies_in_end_date_order() {
        let today = date("2024-01-01");
        let policies = vec![
            active("far", "2024-03-01"),
            active("upcoming", "2024-01-20"),
            active("B-critical", "2024-01-05"),
            policy("cancelled", "2024-01-03", PolicyStatus::Cancelled),
            active("overdue", "2023-12-28"),
            active("A-critical", "2024-01-05"),
            policy("renewed", "2023-12-30", PolicyStatus::Renewed),
        ]
        .into_iter()
        .map(with_customer);

        let entries = renewal_entries(policies, today);
        let rows: Vec<_> = entries
            .iter()
            .map(|e| (e.policy.policy.policy_number.as_str(), e.days_remaining, e.bucket))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("overdue", -4, RenewalBucket::Expired),
                ("A-critical", 4, RenewalBucket::Critical),
                ("B-critical", 4, RenewalBucket::Critical),
                ("upcoming", 19, RenewalBucket::Upcoming),
            ]
        );
    }

    #[test]
    fn entry_carries_days_and_bucket() {
        let today = date("2024-01-01");
        let entry = to_entry(with_customer(active("x", "2024-01-31")), today);

        assert_eq!(entry.days_remaining, 30);
        assert_eq!(entry.bucket, RenewalBucket::Upcoming);
        assert_eq!(entry.policy.customer_name, "Anita");
    }
}
