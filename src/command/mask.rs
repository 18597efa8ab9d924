//! Credential masking for command lines quoted in diagnostics.

use regex::Regex;

/// The fixed replacement for any credential-bearing token.
const MASK: &str = "*********";

/// Renders command lines with password material removed.
///
/// Two shapes are recognized: property-style definitions such as
/// `-Dhttps.proxyPassword=secret`, where everything after the first `=` is
/// masked, and flag/value pairs such as `--password secret`, where the value
/// token following the flag is masked. Everything else passes through
/// untouched.
#[derive(Debug, Clone)]
pub struct CommandMasker {
    property_password: Regex,
    password_flag: Regex,
}

impl Default for CommandMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandMasker {
    /// # Panics
    ///
    /// Never: the patterns are fixed and known valid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            property_password: Regex::new("^-D.*Password.*=.*$").expect("valid pattern"),
            password_flag: Regex::new("^--.*password.*$").expect("valid pattern"),
        }
    }

    /// Renders the argument vector as a single diagnostic string, tokens
    /// joined by `", "`, with credentials masked.
    #[must_use]
    pub fn render(&self, command: &[String]) -> String {
        let mut rendered = Vec::with_capacity(command.len());
        let mut mask_next = false;
        for token in command {
            if mask_next {
                rendered.push(MASK.to_string());
                mask_next = false;
            } else if self.property_password.is_match(token) {
                let end = token.find('=').map_or(token.len(), |i| i + 1);
                rendered.push(format!("{}{MASK}", &token[..end]));
            } else if self.password_flag.is_match(token) {
                rendered.push(token.clone());
                mask_next = true;
            } else {
                rendered.push(token.clone());
            }
        }
        rendered.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn password_flag_masks_following_token() {
        let masker = CommandMasker::new();
        let rendered = masker.render(&args(&["scantool", "--password", "secret123"]));
        assert_eq!(rendered, "scantool, --password, *********");
        assert!(!rendered.contains("secret123"));
    }

    #[test]
    fn property_password_masks_after_equals() {
        let masker = CommandMasker::new();
        let rendered = masker.render(&args(&["-Dhttps.proxyPassword=hunter2", "analyze"]));
        assert_eq!(rendered, "-Dhttps.proxyPassword=*********, analyze");
    }

    #[test]
    fn unrelated_tokens_pass_through() {
        let masker = CommandMasker::new();
        let rendered = masker.render(&args(&["java", "--server", "https://example.com"]));
        assert_eq!(rendered, "java, --server, https://example.com");
    }

    #[test]
    fn trailing_password_flag_without_value() {
        let masker = CommandMasker::new();
        let rendered = masker.render(&args(&["tool", "--password"]));
        assert_eq!(rendered, "tool, --password");
    }

    #[test]
    fn embedded_password_flag_variants_match() {
        let masker = CommandMasker::new();
        let rendered = masker.render(&args(&["--proxy-password", "p", "--user", "u"]));
        assert_eq!(rendered, "--proxy-password, *********, --user, u");
    }
}
