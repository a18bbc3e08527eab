use propbundle::Locale;
use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Validate file path exists and is readable
pub fn validate_file_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(format!("File does not exist: {}", path));
    }

    if !path_obj.is_file() {
        return Err(format!("Path is not a file: {}", path));
    }

    Ok(())
}

/// Validate that a key is usable in a bundle file
pub fn validate_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("Key cannot be empty".to_string());
    }
    if key.contains(['\n', '\r']) {
        return Err(format!("Key cannot contain line breaks: {:?}", key));
    }
    Ok(())
}

/// Parse a locale argument such as `fr`, `pt_BR`, `pt-BR`, or `default`.
///
/// The language and country are checked with unic-langid so that typos such as
/// `english` are rejected instead of creating a new bundle file.
pub fn parse_locale(locale: &str) -> Result<Locale, String> {
    let parsed: Locale = locale
        .parse()
        .map_err(|e| format!("Invalid locale: {}", e))?;
    if parsed.is_root() {
        return Ok(parsed);
    }

    let mut tag = parsed.language.clone();
    if !parsed.country.is_empty() {
        tag.push('-');
        tag.push_str(&parsed.country);
    }
    match tag.parse::<LanguageIdentifier>() {
        Ok(id) if id.language.as_str().len() <= 3 => Ok(parsed),
        _ => Err(format!(
            "Invalid locale: {}. Expected a language code with optional country, e.g. pt_BR",
            locale
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!(parse_locale("default").unwrap(), Locale::root());
        assert_eq!(parse_locale("pt-BR").unwrap(), Locale::new("pt", "BR", ""));
        assert!(parse_locale("english").is_err());
        assert!(parse_locale("fr_1x").is_err());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("menu.open").is_ok());
        assert!(validate_key("  ").is_err());
        assert!(validate_key("a\nb").is_err());
    }
}
