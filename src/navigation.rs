use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Where the search box sends the browser, or `None` for blank input.
pub fn define_path(input: &str) -> Option<String> {
    let word = input.trim();
    if word.is_empty() {
        return None;
    }
    Some(format!("/define/{}", encode_component(word)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_path_encodes_the_word() {
        assert_eq!(define_path("dog").as_deref(), Some("/define/dog"));
        assert_eq!(
            define_path("  ice cream ").as_deref(),
            Some("/define/ice%20cream")
        );
        assert_eq!(define_path("a/b?c").as_deref(), Some("/define/a%2Fb%3Fc"));
        assert_eq!(define_path("café").as_deref(), Some("/define/caf%C3%A9"));
        assert_eq!(define_path("rock'n'roll").as_deref(), Some("/define/rock'n'roll"));
    }

    #[test]
    fn blank_input_does_not_navigate() {
        assert_eq!(define_path(""), None);
        assert_eq!(define_path("   "), None);
    }
}
