// src/common/phone.rs

/// Normaliza um telefone para o formato aceito pela API do WhatsApp:
/// apenas dígitos, sempre com o código do país na frente.
///
/// Regras:
/// - número local de 10 dígitos recebe o código do país;
/// - número de 11 dígitos com zero de tronco na frente perde o zero e recebe o código;
/// - qualquer outra coisa segue apenas com os dígitos (já vem com código).
///
/// Devolve `None` quando não sobra nenhum dígito.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    match digits.len() {
        0 => None,
        10 => Some(format!("{country_code}{digits}")),
        11 if digits.starts_with('0') => Some(format!("{country_code}{}", &digits[1..])),
        _ => Some(digits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_number_gets_country_code() {
        assert_eq!(normalize_phone("98765 43210", "91").as_deref(), Some("919876543210"));
    }

    #[test]
    fn trunk_zero_is_replaced() {
        assert_eq!(normalize_phone("09876543210", "91").as_deref(), Some("919876543210"));
    }

    #[test]
    fn already_prefixed_number_passes_through() {
        assert_eq!(normalize_phone("+91 98765-43210", "91").as_deref(), Some("919876543210"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(normalize_phone(" - ", "91"), None);
    }
}
