/// Strip Latin diacritics from `s`, leaving other characters untouched.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Comparison key for free text: accents folded, lowercased, trimmed, inner
/// whitespace collapsed to single spaces.
pub fn normalize_text(s: &str) -> String {
    fold_accents(s)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents("Método de Pagamento"), "Metodo de Pagamento");
        assert_eq!(fold_accents("Responsável"), "Responsavel");
        assert_eq!(fold_accents("Cartão de Crédito"), "Cartao de Credito");
        assert_eq!(fold_accents("Descrição"), "Descricao");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Banco   do Brasil "), "banco do brasil");
        assert_eq!(normalize_text("TRANSFERÊNCIA"), "transferencia");
        assert_eq!(normalize_text(""), "");
    }
}
