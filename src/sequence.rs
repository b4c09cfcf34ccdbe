use anyhow::bail;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key names follow the browser `KeyboardEvent.key` values.
pub const KONAMI_CODE: [&str; 10] = [
    "ArrowUp",
    "ArrowUp",
    "ArrowDown",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "ArrowLeft",
    "ArrowRight",
    "b",
    "a",
];

/// Ordered list of key identifiers that has to be typed to trigger a success.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sequence {
    keys: Vec<String>,
}

impl Sequence {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_keys(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn konami() -> Self {
        Self::new(KONAMI_CODE)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::konami()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.keys {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some('<'), None) => f.write_str("<lt>")?,
                (Some('>'), None) => f.write_str("<gt>")?,
                (Some(c), None) => write!(f, "{c}")?,
                _ => write!(f, "<{key}>")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Sequence {
    type Err = anyhow::Error;

    /// Parses the compact notation: `<ArrowUp><ArrowUp>ba`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        let mut chars = input.chars();

        while let Some(c) = chars.next() {
            match c {
                '<' => {
                    // Named key, read up to the closing bracket
                    let mut name = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == '>' {
                            closed = true;
                            break;
                        }
                        name.push(next);
                    }

                    if !closed {
                        bail!("Unterminated key name '<{}' in sequence '{}'", name, input);
                    }

                    let key = match name.as_str() {
                        "" => bail!("Empty key name '<>' in sequence '{}'", input),
                        "lt" => "<".to_string(),
                        "gt" => ">".to_string(),
                        _ => name,
                    };
                    keys.push(key);
                }
                '>' => bail!("Unexpected '>' in sequence '{}', use <gt>", input),
                _ => keys.push(c.to_string()),
            }
        }

        Ok(Sequence::from_keys(keys))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SequenceRepr {
    Keys(Vec<String>),
    Notation(String),
}

impl<'de> Deserialize<'de> for Sequence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match SequenceRepr::deserialize(deserializer)? {
            SequenceRepr::Keys(keys) => Ok(Sequence::from_keys(keys)),
            SequenceRepr::Notation(notation) => {
                notation.parse().map_err(serde::de::Error::custom)
            }
        }
    }
}
