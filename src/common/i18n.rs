// src/common/i18n.rs

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens por idioma. As chaves são os códigos de `AppError::code`.
const EN: &[(&str, &str)] = &[
    ("validation_failed", "One or more fields are invalid."),
    ("email_already_exists", "This e-mail is already in use."),
    ("invalid_credentials", "Invalid e-mail or password."),
    ("invalid_token", "Missing or invalid authentication token."),
    ("user_not_found", "User not found."),
    ("missing_tenant_header", "The x-tenant-id header is required."),
    ("invalid_tenant_header", "The x-tenant-id header is not a valid UUID."),
    ("tenant_access_denied", "You are not a member of this agency."),
    ("forbidden_role", "Your role does not allow this action."),
    ("member_already_exists", "This user is already a member of the agency."),
    ("customer_not_found", "Customer not found."),
    ("policy_not_found", "Policy not found."),
    ("policy_number_exists", "This policy number is already registered."),
    ("invalid_policy_status", "Only active policies can be renewed or cancelled."),
    ("invalid_date_range", "The end date must not be before the start date."),
    ("cron_unauthorized", "Invalid cron secret."),
    ("internal_error", "An unexpected error occurred."),
];

const PT: &[(&str, &str)] = &[
    ("validation_failed", "Um ou mais campos são inválidos."),
    ("email_already_exists", "Este e-mail já está em uso."),
    ("invalid_credentials", "E-mail ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("user_not_found", "Usuário não encontrado."),
    ("missing_tenant_header", "O cabeçalho x-tenant-id é obrigatório."),
    ("invalid_tenant_header", "O cabeçalho x-tenant-id não é um UUID válido."),
    ("tenant_access_denied", "Você não é membro desta corretora."),
    ("forbidden_role", "Seu papel não permite esta ação."),
    ("member_already_exists", "Este usuário já é membro da corretora."),
    ("customer_not_found", "Cliente não encontrado."),
    ("policy_not_found", "Apólice não encontrada."),
    ("policy_number_exists", "Este número de apólice já está cadastrado."),
    ("invalid_policy_status", "Apenas apólices ativas podem ser renovadas ou canceladas."),
    ("invalid_date_range", "A data final não pode ser anterior à data inicial."),
    ("cron_unauthorized", "Segredo do cron inválido."),
    ("internal_error", "Ocorreu um erro inesperado."),
];

static BUILTIN: LazyLock<I18nStore> = LazyLock::new(|| {
    I18nStore::from_catalogs(&[(DEFAULT_LANG, EN), ("pt", PT)])
});

#[derive(Clone, Debug)]
pub struct I18nStore {
    messages: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    /// O catálogo embutido (en + pt), compartilhado por todo o processo.
    pub fn builtin() -> &'static I18nStore {
        &BUILTIN
    }

    pub fn from_catalogs(catalogs: &[(&str, &[(&str, &str)])]) -> Self {
        let messages = catalogs
            .iter()
            .map(|(lang, entries)| {
                let map = entries
                    .iter()
                    .map(|(code, msg)| (code.to_string(), msg.to_string()))
                    .collect();
                (lang.to_string(), map)
            })
            .collect();

        Self { messages: Arc::new(messages) }
    }

    /// Busca a mensagem no idioma pedido, cai para inglês e por fim devolve o próprio código.
    pub fn message(&self, lang: &str, code: &str) -> String {
        [lang, DEFAULT_LANG]
            .iter()
            .find_map(|l| self.messages.get(*l).and_then(|m| m.get(code)))
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_for_unknown_language() {
        let store = I18nStore::builtin();
        assert_eq!(store.message("de", "policy_not_found"), "Policy not found.");
    }

    #[test]
    fn translates_known_language() {
        let store = I18nStore::builtin();
        assert_eq!(store.message("pt", "policy_not_found"), "Apólice não encontrada.");
    }

    #[test]
    fn unknown_code_returns_code() {
        assert_eq!(I18nStore::builtin().message("en", "nope"), "nope");
    }

    #[test]
    fn catalogs_cover_the_same_codes() {
        let en: Vec<_> = EN.iter().map(|(c, _)| *c).collect();
        let pt: Vec<_> = PT.iter().map(|(c, _)| *c).collect();
        assert_eq!(en, pt);
    }
}
