//! Text normalization for header matching and output filenames. Spreadsheet
//! headers and learner names arrive with inconsistent accents and casing, so
//! every comparison goes through an accent-stripped, case-folded form.

/// Strip French diacritics and lowercase. Spaces and punctuation are kept.
pub(crate) fn normalize_string(value: &str) -> String {
    value.chars().map(fold_accent).collect::<String>().to_lowercase()
}

/// Key form used to match names and column titles: accent-stripped,
/// lowercased, with every non-alphanumeric character removed.
pub(crate) fn normalize_key(value: &str) -> String {
    value
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Output filename stem for a student bulletin. Path separators in the name
/// cell are dropped so the stem can never leave the output directory.
pub(crate) fn bulletin_stem(student_name: &str) -> String {
    normalize_string(student_name.trim())
        .chars()
        .filter(|c| !matches!(c, '/' | '\\'))
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' => 'a',
        'À' | 'Â' | 'Ä' | 'Á' | 'Ã' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'î' | 'ï' | 'í' => 'i',
        'Î' | 'Ï' | 'Í' => 'I',
        'ô' | 'ö' | 'ó' | 'õ' => 'o',
        'Ô' | 'Ö' | 'Ó' | 'Õ' => 'O',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ÿ' => 'y',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}
