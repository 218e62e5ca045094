use uuid::Uuid;

/// Object-storage namespace for uploaded videos
pub const VIDEO_PREFIX: &str = "videos/";

const MAX_EXTENSION_LEN: usize = 16;

/// Identifier and storage location generated for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoKey {
    pub id: Uuid,
    pub storage_key: String,
}

impl VideoKey {
    /// Allocates a fresh id and derives `videos/<id><ext>` from the client filename.
    pub fn generate(original_name: &str) -> Self {
        Self::for_id(Uuid::new_v4(), original_name)
    }

    pub fn for_id(id: Uuid, original_name: &str) -> Self {
        let storage_key = format!("{}{}{}", VIDEO_PREFIX, id, extension_of(original_name));
        Self { id, storage_key }
    }

    /// Last path segment of the storage key.
    pub fn filename(&self) -> &str {
        filename_of(&self.storage_key)
    }
}

pub fn filename_of(storage_key: &str) -> &str {
    storage_key.rsplit('/').next().unwrap_or(storage_key)
}

/// Recovers the video id from a key under [`VIDEO_PREFIX`].
pub fn id_from_key(storage_key: &str) -> Option<Uuid> {
    let name = storage_key.strip_prefix(VIDEO_PREFIX)?;
    let stem = name.split('.').next()?;
    Uuid::parse_str(stem).ok()
}

/// Extension of the client filename including the leading dot, or an empty
/// string. Dotfiles without a further dot have no extension. Extensions that
/// are not short alphanumeric runs are dropped so they never leak into keys.
pub fn extension_of(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let Some(dot) = base.rfind('.') else {
        return String::new();
    };
    if dot == 0 {
        return String::new();
    }

    let ext = &base[dot + 1..];
    if ext.len() > MAX_EXTENSION_LEN || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return String::new();
    }
    format!(".{}", ext)
}
