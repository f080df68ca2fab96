use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use crate::{
    asset::{AudioBuffer, FontAsset, ImageAsset, MeshObjectAsset, SceneAsset, TextureAsset},
    kind::AssetKind,
};

/// Holder of one loaded object inside a record.
///
/// Every load carries a ticket handed out in issue order; a slot keeps the
/// object of the newest ticket it has seen, whatever order loads finish in.
pub struct Slot<T> {
    value: Option<Arc<T>>,
    ticket: u64,
}

impl<T> Slot<T> {
    pub fn get(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }

    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Stores `value` unless a newer ticket already filled the slot.
    fn offer(&mut self, ticket: u64, value: Arc<T>) -> bool {
        if self.value.is_some() && ticket < self.ticket {
            return false;
        }
        self.value = Some(value);
        self.ticket = ticket;
        true
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            ticket: 0,
        }
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            ticket: self.ticket,
        }
    }
}

impl<T: Debug> Debug for Slot<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.value, f)
    }
}

/// A loaded object type that has a slot in [`AssetRecord`].
pub trait StoredAsset: Send + Sync + Sized + 'static {
    const KIND: AssetKind;

    fn slot(record: &mut AssetRecord) -> &mut Slot<Self>;
}

macro_rules! stored_asset {
    ($asset:ty, $kind:expr, $field:ident) => {
        impl StoredAsset for $asset {
            const KIND: AssetKind = $kind;

            fn slot(record: &mut AssetRecord) -> &mut Slot<Self> {
                &mut record.$field
            }
        }
    };
}

stored_asset!(SceneAsset, AssetKind::Scene, scene);
stored_asset!(TextureAsset, AssetKind::Texture, texture);
stored_asset!(ImageAsset, AssetKind::Image, image);
stored_asset!(FontAsset, AssetKind::Font, font);
stored_asset!(MeshObjectAsset, AssetKind::MeshObject, mesh_object);
stored_asset!(AudioBuffer, AssetKind::Audio, audio_buffer);

/// Everything loaded under one name, one slot per kind.
#[derive(Debug, Clone, Default)]
pub struct AssetRecord {
    scene: Slot<SceneAsset>,
    texture: Slot<TextureAsset>,
    image: Slot<ImageAsset>,
    font: Slot<FontAsset>,
    mesh_object: Slot<MeshObjectAsset>,
    audio_buffer: Slot<AudioBuffer>,
}

impl AssetRecord {
    pub fn scene(&self) -> Option<&Arc<SceneAsset>> {
        self.scene.get()
    }

    pub fn texture(&self) -> Option<&Arc<TextureAsset>> {
        self.texture.get()
    }

    pub fn image(&self) -> Option<&Arc<ImageAsset>> {
        self.image.get()
    }

    pub fn font(&self) -> Option<&Arc<FontAsset>> {
        self.font.get()
    }

    pub fn mesh_object(&self) -> Option<&Arc<MeshObjectAsset>> {
        self.mesh_object.get()
    }

    pub fn audio_buffer(&self) -> Option<&Arc<AudioBuffer>> {
        self.audio_buffer.get()
    }

    pub fn contains(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Scene => self.scene.is_filled(),
            AssetKind::Texture => self.texture.is_filled(),
            AssetKind::Image => self.image.is_filled(),
            AssetKind::Font => self.font.is_filled(),
            AssetKind::MeshObject => self.mesh_object.is_filled(),
            AssetKind::Audio => self.audio_buffer.is_filled(),
        }
    }

    /// Kinds with a loaded object, in [`AssetKind`] order.
    pub fn kinds(&self) -> Vec<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    pub(crate) fn store<A: StoredAsset>(&mut self, ticket: u64, value: Arc<A>) -> bool {
        A::slot(self).offer(ticket, value)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use image::ImageFormat;

    use crate::{
        asset::{AudioBuffer, ImageAsset},
        kind::AssetKind,
    };

    use super::AssetRecord;

    fn image(width: u32) -> Arc<ImageAsset> {
        Arc::new(ImageAsset {
            width,
            height: 1,
            format: ImageFormat::Png,
            pixels: vec![0; width as usize * 4],
        })
    }

    #[test]
    fn newest_ticket_wins() {
        let mut record = AssetRecord::default();
        assert!(record.is_empty());

        assert!(record.store(2, image(2)));
        // An older load finishing late does not replace the newer one.
        assert!(!record.store(1, image(1)));
        assert_eq!(record.image().unwrap().width, 2);

        assert!(record.store(3, image(3)));
        assert_eq!(record.image().unwrap().width, 3);
    }

    #[test]
    fn slots_are_independent() {
        let mut record = AssetRecord::default();
        record.store(5, image(1));
        record.store(1, Arc::new(AudioBuffer::default()));
        assert_eq!(record.kinds(), vec![AssetKind::Image, AssetKind::Audio]);
        assert!(record.contains(AssetKind::Audio));
        assert!(!record.contains(AssetKind::Scene));
    }
}
