/// A change applied through [`StorageService`](super::StorageService).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageEvent {
    /// The draft was replaced. `bytes` is the serialized size.
    DraftSaved { bytes: usize },
    /// An asset was written (new or overwritten).
    AssetStored { name: String },
    AssetRemoved { name: String },
    /// Draft and assets were wiped.
    Cleared,
}

impl StorageEvent {
    /// Asset name this event concerns, if any.
    pub fn asset_name(&self) -> Option<&str> {
        match self {
            StorageEvent::AssetStored { name } | StorageEvent::AssetRemoved { name } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_events_carry_name() {
        let ev = StorageEvent::AssetStored { name: "avatar_1_2.png".into() };
        assert_eq!(ev.asset_name(), Some("avatar_1_2.png"));
        assert_eq!(StorageEvent::Cleared.asset_name(), None);
        assert_eq!(StorageEvent::DraftSaved { bytes: 3 }.asset_name(), None);
    }

    #[test]
    fn debug_includes_variant() {
        let s = format!("{:?}", StorageEvent::AssetRemoved { name: "x".into() });
        assert!(s.contains("AssetRemoved"));
        assert!(s.contains("\"x\""));
    }
}
