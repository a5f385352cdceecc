use serde::{Deserialize, Deserializer};

/// A single field of a partial update.
///
/// JSON bodies distinguish three cases: the key is missing (`Absent`), the key is
/// present with `null` (`Null`), or the key carries a value (`Value`). Fields of this
/// type must be annotated with `#[serde(default)]` so a missing key becomes `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Patch<T> {
    /// Merge into an optional slot: `Null` clears it, `Value` replaces it.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Self::Absent => {}
            Self::Null => *slot = None,
            Self::Value(v) => *slot = Some(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        bio: Patch<String>,
    }

    #[test]
    fn missing_key_is_absent() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.bio, Patch::Absent);
    }

    #[test]
    fn explicit_null_is_null() {
        let body: Body = serde_json::from_str(r#"{"bio": null}"#).unwrap();
        assert_eq!(body.bio, Patch::Null);
    }

    #[test]
    fn value_is_value() {
        let body: Body = serde_json::from_str(r#"{"bio": "runner"}"#).unwrap();
        assert_eq!(body.bio, Patch::Value("runner".to_string()));
    }

    #[test]
    fn apply_to_optional_slot() {
        let mut slot = Some("old".to_string());
        Patch::Absent.apply_to(&mut slot);
        assert_eq!(slot.as_deref(), Some("old"));

        Patch::Value("new".to_string()).apply_to(&mut slot);
        assert_eq!(slot.as_deref(), Some("new"));

        Patch::Null.apply_to(&mut slot);
        assert_eq!(slot, None);
    }
}
