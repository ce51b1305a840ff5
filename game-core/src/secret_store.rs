use game_types::{CoordinatorError, SessionId, WordEntry};

/// A caller's relationship to the active round, resolved by the session
/// before any secret read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderRole {
    /// The live describer for the active round.
    Describer,
    /// Team-mode player on the team that is not currently playing.
    SpectatingTeam,
    /// Player eligible to guess this round.
    ActiveGuesser,
    /// Not a player in the session.
    Outsider,
}

impl ReaderRole {
    pub fn may_read_words(&self) -> bool {
        matches!(self, ReaderRole::Describer | ReaderRole::SpectatingTeam)
    }
}

/// Secret word set for one session's active round.
///
/// Addressed by session id at the registry, but owned inside the session's
/// state so that the public word count and the stored words change under the
/// same lock and can never diverge.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretWordSet {
    session_id: SessionId,
    words: Vec<WordEntry>,
}

impl SecretWordSet {
    pub fn new(session_id: SessionId, words: Vec<WordEntry>) -> Self {
        SecretWordSet { session_id, words }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Append entries, skipping any word text already present so a bonus
    /// batch can never introduce a word twice within one round. Returns how
    /// many entries were actually added.
    pub fn append(&mut self, extra: Vec<WordEntry>) -> usize {
        let mut added = 0;
        for entry in extra {
            if self.words.iter().all(|w| w.word != entry.word) {
                self.words.push(entry);
                added += 1;
            }
        }
        added
    }

    /// Role-gated read. Unauthorized roles get the denial and nothing else:
    /// no partial or redacted data.
    pub fn read_if_authorized(&self, role: ReaderRole) -> Result<&[WordEntry], CoordinatorError> {
        if role.may_read_words() {
            Ok(&self.words)
        } else {
            Err(CoordinatorError::permission_denied(
                "caller is not authorized to read the word list",
            ))
        }
    }

    /// Engine-internal access for guess matching; clients only ever see
    /// words through `read_if_authorized` or the post-round reveal.
    pub(crate) fn entries(&self) -> &[WordEntry] {
        &self.words
    }

    pub(crate) fn into_words(self) -> Vec<WordEntry> {
        self.words
    }
}
