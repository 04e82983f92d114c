use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps customer contact details (phone, email, LINE id) so they only show
/// their last four characters in Debug/Display output.
///
/// Serialization still writes the real value: notification providers need it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

const VISIBLE_TAIL: usize = 4;

fn masked_hint(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= VISIBLE_TAIL {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - VISIBLE_TAIL..].iter().collect();
    format!("***{}", tail)
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked({})", masked_hint(self.0.as_ref()))
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&masked_hint(self.0.as_ref()))
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}
