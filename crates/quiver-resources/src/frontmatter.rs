//! Header block (`---` delimited YAML) at the top of every resource file.

use serde_yaml::{Mapping, Value};

/// Parsed header. Keeps every key, known or not, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    fields: Mapping,
}

impl Header {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of `key`; numbers and booleans are rendered as text.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// List value of `key`. A comma-separated string is split into items.
    #[must_use]
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_owned()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `key` is present with a value that is neither a string nor a list of strings.
    #[must_use]
    pub fn is_non_textual(&self, key: &str) -> bool {
        match self.fields.get(key) {
            None | Some(Value::String(_) | Value::Null) => false,
            Some(Value::Sequence(items)) => !items.iter().all(Value::is_string),
            Some(_) => true,
        }
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.fields
            .keys()
            .filter_map(|k| k.as_str().map(str::to_owned))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    pub header: Header,
    pub body: String,
}

/// Split a resource file into its header block and body.
///
/// Content without a leading `---` line has an empty header and is all body.
///
/// # Errors
///
/// Returns a description of the problem if the header is unclosed or is not a
/// YAML mapping.
pub fn parse_template(content: &str) -> Result<ParsedTemplate, String> {
    let content = content.trim_start_matches('\u{feff}');
    let trimmed = content.trim_start();

    let mut lines = trimmed.split_inclusive('\n');
    let opens = lines
        .next()
        .is_some_and(|first| first.trim_end() == "---");
    if !opens {
        return Ok(ParsedTemplate {
            header: Header::default(),
            body: content.trim().to_owned(),
        });
    }

    let mut yaml = String::new();
    let mut body_start = None;
    let mut offset = trimmed.find('\n').map_or(trimmed.len(), |i| i + 1);
    for line in lines {
        if line.trim_end() == "---" {
            body_start = Some(offset + line.len());
            break;
        }
        yaml.push_str(line);
        offset += line.len();
    }

    let Some(body_start) = body_start else {
        return Err("unclosed header block".to_owned());
    };

    let fields = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(&yaml) {
            Ok(Value::Mapping(m)) => m,
            Ok(Value::Null) => Mapping::new(),
            Ok(_) => return Err("header block is not a key-value mapping".to_owned()),
            Err(e) => return Err(format!("malformed header block: {e}")),
        }
    };

    Ok(ParsedTemplate {
        header: Header { fields },
        body: trimmed[body_start..].trim().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_header() {
        let parsed =
            parse_template("---\nname: test\ndescription: A test skill.\n---\n# Body\nHello").unwrap();
        assert_eq!(parsed.header.get_str("name").as_deref(), Some("test"));
        assert_eq!(
            parsed.header.get_str("description").as_deref(),
            Some("A test skill.")
        );
        assert_eq!(parsed.body, "# Body\nHello");
    }

    #[test]
    fn no_header_is_all_body() {
        let parsed = parse_template("Just do the thing.\n").unwrap();
        assert!(parsed.header.is_empty());
        assert_eq!(parsed.body, "Just do the thing.");
    }

    #[test]
    fn unclosed_header() {
        let err = parse_template("---\nname: x\n").unwrap_err();
        assert!(err.contains("unclosed"));
    }

    #[test]
    fn invalid_yaml() {
        assert!(parse_template("---\n: broken: [\n---\nbody").is_err());
    }

    #[test]
    fn scalar_header_rejected() {
        let err = parse_template("---\njust text\n---\nbody").unwrap_err();
        assert!(err.contains("mapping"));
    }

    #[test]
    fn dashes_inside_values_do_not_close() {
        let parsed = parse_template("---\nname: a---b\ndescription: x\n---\nbody").unwrap();
        assert_eq!(parsed.header.get_str("name").as_deref(), Some("a---b"));
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn unknown_keys_preserved_in_order() {
        let parsed =
            parse_template("---\nname: p\nzeta: 1\ncustom-field: yes\nalpha: [a]\n---\n").unwrap();
        assert_eq!(parsed.header.keys(), vec!["name", "zeta", "custom-field", "alpha"]);
        assert!(parsed.header.get("custom-field").is_some());
    }

    #[test]
    fn list_from_sequence_or_csv() {
        let parsed =
            parse_template("---\ntools: Read, Write ,Bash\ndependencies:\n  - a\n  - b\n---\n").unwrap();
        assert_eq!(parsed.header.get_list("tools"), vec!["Read", "Write", "Bash"]);
        assert_eq!(parsed.header.get_list("dependencies"), vec!["a", "b"]);
        assert!(parsed.header.get_list("missing").is_empty());
    }

    #[test]
    fn non_textual_detection() {
        let parsed = parse_template("---\nhint: [1, 2]\nok: text\nmap: {a: b}\n---\n").unwrap();
        assert!(parsed.header.is_non_textual("hint"));
        assert!(parsed.header.is_non_textual("map"));
        assert!(!parsed.header.is_non_textual("ok"));
        assert!(!parsed.header.is_non_textual("absent"));
    }

    #[test]
    fn empty_header_block() {
        let parsed = parse_template("---\n---\nbody").unwrap();
        assert!(parsed.header.is_empty());
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn crlf_line_endings() {
        let parsed = parse_template("---\r\nname: win\r\n---\r\nbody\r\n").unwrap();
        assert_eq!(parsed.header.get_str("name").as_deref(), Some("win"));
        assert_eq!(parsed.body, "body");
    }
}
