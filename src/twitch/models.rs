use serde::{Deserialize, Serialize};

/// A Twitch user as returned by the Kraken `users` endpoint.
///
/// `_id` is required and non-null; it keys the channel and stream lookups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub bio: String,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub created_at: String,
}

/// Channel details for a user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub game: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub language: String,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub views: i64,
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub followers: i64,
}

/// A live stream. Offline users have no stream at all (`Option<Stream>::None`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    #[serde(deserialize_with = "null_as_default::deserialize")]
    pub viewers: i64,
}

/// `GET users?login=` envelope
#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

/// `GET streams/<id>` envelope; `stream` is `null` when the user is offline
#[derive(Debug, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    pub stream: Option<Stream>,
}

/// Serde helper: JSON `null` decodes as the type's default
mod null_as_default {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
