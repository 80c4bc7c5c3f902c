// src/services/pipeline.rs

//! Motor de etapas do funil de vendas.
//!
//! Não existe tabela de transições: qualquer etapa pode ir para qualquer outra
//! (um lead perdido pode ser reativado). A única regra é o carimbo de data:
//! cada etapa guarda o momento em que o lead chegou nela pela PRIMEIRA vez, e
//! esse carimbo nunca é sobrescrito nem apagado.

use chrono::{DateTime, Utc};

use crate::models::crm::{Customer, LeadStage};

/// O estado atual do funil de um lead (o que precisamos ler antes da transição).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadTimeline {
    pub stage: LeadStage,
    pub pitched_date: Option<DateTime<Utc>>,
    pub interested_date: Option<DateTime<Utc>>,
    pub converted_date: Option<DateTime<Utc>>,
    pub lost_date: Option<DateTime<Utc>>,
}

impl From<&Customer> for LeadTimeline {
    fn from(c: &Customer) -> Self {
        Self {
            stage: c.stage,
            pitched_date: c.pitched_date,
            interested_date: c.interested_date,
            converted_date: c.converted_date,
            lost_date: c.lost_date,
        }
    }
}

/// Campos a mesclar no registro. `None` significa "não mexer".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageUpdate {
    pub stage: LeadStage,
    pub pitched_date: Option<DateTime<Utc>>,
    pub interested_date: Option<DateTime<Utc>>,
    pub converted_date: Option<DateTime<Utc>>,
    pub lost_date: Option<DateTime<Utc>>,
    pub lost_reason: Option<String>,
}

impl StageUpdate {
    fn only_stage(stage: LeadStage) -> Self {
        Self {
            stage,
            pitched_date: None,
            interested_date: None,
            converted_date: None,
            lost_date: None,
            lost_reason: None,
        }
    }
}

/// Aplica a transição para `target`.
///
/// - `stage` sempre vira `target` (reenviar a mesma etapa é válido);
/// - a data da etapa alvo é carimbada com `now` apenas se ainda estiver vazia;
/// - `reason` só é usado quando `target` é `LOST` e não está em branco.
pub fn apply_stage_transition(
    lead: &LeadTimeline,
    target: LeadStage,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> StageUpdate {
    let mut update = StageUpdate::only_stage(target);

    let stamp = |current: Option<DateTime<Utc>>| current.is_none().then_some(now);

    match target {
        // LEAD não tem carimbo próprio: lead_date é gravado na criação
        LeadStage::Lead => {}
        LeadStage::Pitched => update.pitched_date = stamp(lead.pitched_date),
        LeadStage::Interested => update.interested_date = stamp(lead.interested_date),
        LeadStage::Converted => update.converted_date = stamp(lead.converted_date),
        LeadStage::Lost => {
            update.lost_date = stamp(lead.lost_date);
            update.lost_reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string);
        }
    }

    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
    }

    #[test]
    fn first_entry_stamps_the_target_date() {
        let lead = LeadTimeline::default();

        let update = apply_stage_transition(&lead, LeadStage::Pitched, None, now());

        assert_eq!(update.stage, LeadStage::Pitched);
        assert_eq!(update.pitched_date, Some(now()));
        assert_eq!(update.interested_date, None);
        assert_eq!(update.converted_date, None);
        assert_eq!(update.lost_date, None);
    }

    #[test]
    fn already_stamped_stage_is_not_overwritten() {
        let earlier = now() - Duration::days(20);
        for target in [
            LeadStage::Pitched,
            LeadStage::Interested,
            LeadStage::Converted,
            LeadStage::Lost,
        ] {
            let lead = LeadTimeline {
                stage: LeadStage::Lead,
                pitched_date: Some(earlier),
                interested_date: Some(earlier),
                converted_date: Some(earlier),
                lost_date: Some(earlier),
            };

            let update = apply_stage_transition(&lead, target, None, now());

            assert_eq!(update.stage, target);
            assert_eq!(update, StageUpdate::only_stage(target), "target {target:?}");
        }
    }

    #[test]
    fn resubmitting_the_current_stage_still_stamps_a_missing_date() {
        // Estado legado: já está em INTERESTED mas sem data gravada
        let lead = LeadTimeline { stage: LeadStage::Interested, ..Default::default() };

        let update = apply_stage_transition(&lead, LeadStage::Interested, None, now());

        assert_eq!(update.interested_date, Some(now()));
    }

    #[test]
    fn reason_is_ignored_outside_lost() {
        let lead = LeadTimeline::default();

        let update =
            apply_stage_transition(&lead, LeadStage::Interested, Some("some reason"), now());

        assert_eq!(update.lost_reason, None);
        assert_eq!(update.interested_date, Some(now()));
    }

    #[test]
    fn lost_records_reason_and_date() {
        let lead = LeadTimeline { stage: LeadStage::Pitched, ..Default::default() };

        let update =
            apply_stage_transition(&lead, LeadStage::Lost, Some("  price too high "), now());

        assert_eq!(update.stage, LeadStage::Lost);
        assert_eq!(update.lost_date, Some(now()));
        assert_eq!(update.lost_reason.as_deref(), Some("price too high"));
    }

    #[test]
    fn blank_lost_reason_leaves_existing_reason_untouched() {
        let lead = LeadTimeline::default();

        let update = apply_stage_transition(&lead, LeadStage::Lost, Some("   "), now());

        assert_eq!(update.lost_reason, None);
    }

    #[test]
    fn lost_lead_can_be_revived_without_touching_history() {
        let lost_at = now() - Duration::days(3);
        let lead = LeadTimeline {
            stage: LeadStage::Lost,
            lost_date: Some(lost_at),
            ..Default::default()
        };

        let update = apply_stage_transition(&lead, LeadStage::Pitched, None, now());

        assert_eq!(update.stage, LeadStage::Pitched);
        assert_eq!(update.pitched_date, Some(now()));
        // lost_date não é limpo: None aqui significa "não mexer"
        assert_eq!(update.lost_date, None);
    }

    #[test]
    fn skipping_straight_to_converted_is_allowed() {
        let update =
            apply_stage_transition(&LeadTimeline::default(), LeadStage::Converted, None, now());

        assert_eq!(update.stage, LeadStage::Converted);
        assert_eq!(update.converted_date, Some(now()));
        assert_eq!(update.pitched_date, None);
    }
}
