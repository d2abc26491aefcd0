use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The key-value bag persisted for each session.
///
/// Stored as an opaque bincode blob by every session store backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// The ID of the logged-in user, if any.
    pub authenticated_user_id: Option<i64>,
    /// A one-shot message shown on the next rendered page.
    pub flash: Option<String>,
    /// Where to send the user after they log in.
    pub post_login_redirect_url: Option<String>,
    /// The token every state-changing form must echo back.
    pub csrf_token: Option<String>,
}

impl SessionData {
    /// Serializes the data for storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    /// Deserializes data previously produced by [`SessionData::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (data, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(data)
    }
}
