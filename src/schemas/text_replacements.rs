use std::collections::HashMap;

/// Named string values substituted into a prompt template.
pub type TextReplacements = HashMap<String, String>;

#[macro_export]
macro_rules! text_replacements {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::schemas::TextReplacements::new();
        $(map.insert(::std::string::String::from($key), ::std::string::String::from($value));)*
        map
    }};
}
