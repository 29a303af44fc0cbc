use serde::Serialize;

/// Ordered prompts for one run. When more than one image is requested the
/// first entry is the user's seed prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptBatch(Vec<String>);

impl PromptBatch {
    pub fn single(seed: impl Into<String>) -> Self {
        Self(vec![seed.into()])
    }

    pub(crate) fn from_vec(prompts: Vec<String>) -> Self {
        Self(prompts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a PromptBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
