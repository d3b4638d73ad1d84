use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Id given to query tokens that no rule contains. Never posted.
pub const UNKNOWN_TOKEN: u32 = u32::MAX;

/// Dense token ids for every distinct rule token.
///
/// Ids are assigned in first-seen order, so the same rules in the same
/// order always produce the same dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenDictionary {
    ids: FxHashMap<String, u32>,
    tokens: Vec<String>,
}

impl TokenDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `token`, assigning the next one if unseen.
    ///
    /// `None` once the id space (everything below [`UNKNOWN_TOKEN`]) is used up.
    pub fn intern(&mut self, token: &str) -> Option<u32> {
        if let Some(&id) = self.ids.get(token) {
            return Some(id);
        }
        let id = u32::try_from(self.tokens.len())
            .ok()
            .filter(|&id| id != UNKNOWN_TOKEN)?;
        self.ids.insert(token.to_owned(), id);
        self.tokens.push(token.to_owned());
        Some(id)
    }

    /// Id for a known token, [`UNKNOWN_TOKEN`] otherwise.
    #[inline]
    pub fn lookup(&self, token: &str) -> u32 {
        self.ids.get(token).copied().unwrap_or(UNKNOWN_TOKEN)
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
