//! Pixel and texture cache keyed by asset id.
//!
//! The cache holds at most one [`PixelData`] and one [`Texture`] per id.
//! `make_*` calls are idempotent: a second call with the same id hands back
//! the existing entry without decoding or allocating again. `get_*` calls
//! never create anything.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::rc::Rc;
use alloc::vec::Vec;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::pixel_data::{AssetId, CompressedResource, PixelData};
use crate::render::{Texture, TextureFactory};

/// Counters used to observe cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Compressed resources decoded.
    pub decodes: u32,
    /// `make_*` calls answered from an existing entry.
    pub hits: u32,
    /// Textures created through a factory.
    pub textures_created: u32,
}

/// Owner of every decoded asset in one engine instance.
#[derive(Default)]
pub struct AssetCache {
    pixels: BTreeMap<AssetId, Rc<PixelData>>,
    textures: BTreeMap<AssetId, Texture>,
    stats: CacheStats,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn pixel_data_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Decode `resource` under its own id, or return the cached copy.
    pub fn make_pixel_data(&mut self, resource: &CompressedResource) -> Result<Rc<PixelData>> {
        self.make_pixel_data_as(resource, resource.id)
    }

    /// Decode `resource` under `id`, or return whatever is cached under `id`.
    pub fn make_pixel_data_as(&mut self, resource: &CompressedResource, id: AssetId) -> Result<Rc<PixelData>> {
        match self.pixels.entry(id) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                Ok(Rc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                let decoded = Rc::new(resource.decode(id)?);
                self.stats.decodes += 1;
                debug!(
                    "Decoded asset {} ({}x{} {:?}, {} compressed bytes)",
                    id,
                    resource.width,
                    resource.height,
                    resource.depth,
                    resource.data.len()
                );
                Ok(Rc::clone(entry.insert(decoded)))
            }
        }
    }

    pub fn get_pixel_data(&self, id: AssetId) -> Result<Rc<PixelData>> {
        self.pixels
            .get(&id)
            .cloned()
            .ok_or(Error::AssetNotFound { id })
    }

    /// Register pixel data built at run time. Fails if the id is taken.
    pub fn insert_pixel_data(&mut self, pixels: PixelData) -> Result<Rc<PixelData>> {
        let id = pixels.id();
        match self.pixels.entry(id) {
            Entry::Occupied(_) => Err(Error::AssetAlreadyExists { id }),
            Entry::Vacant(entry) => Ok(Rc::clone(entry.insert(Rc::new(pixels)))),
        }
    }

    /// Create a texture for `pixels` under `id` (the pixel data id when
    /// `None`), or return the one already cached under that id.
    pub fn make_texture(
        &mut self,
        factory: &mut dyn TextureFactory,
        pixels: Rc<PixelData>,
        id: Option<AssetId>,
    ) -> Result<&Texture> {
        let id = id.unwrap_or(pixels.id());
        match self.textures.entry(id) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let texture = factory.create_texture(pixels)?;
                self.stats.textures_created += 1;
                Ok(entry.insert(texture))
            }
        }
    }

    pub fn get_texture(&self, id: AssetId) -> Result<&Texture> {
        self.textures.get(&id).ok_or(Error::AssetNotFound { id })
    }

    /// Register a texture built elsewhere. Fails if the id is taken.
    pub fn insert_texture(&mut self, id: AssetId, texture: Texture) -> Result<&Texture> {
        match self.textures.entry(id) {
            Entry::Occupied(_) => Err(Error::AssetAlreadyExists { id }),
            Entry::Vacant(entry) => Ok(entry.insert(texture)),
        }
    }

    /// Decode every resource of an asset table.
    ///
    /// A malformed resource does not stop the others; the failures are
    /// returned so the caller can decide how to report them.
    pub fn preload(&mut self, table: &[CompressedResource]) -> Vec<(AssetId, Error)> {
        let mut failed = Vec::new();
        for resource in table {
            if let Err(e) = self.make_pixel_data(resource) {
                failed.push((resource.id, e));
            }
        }
        info!(
            "Preloaded {} of {} assets",
            table.len() - failed.len(),
            table.len()
        );
        failed
    }

    /// Drop every entry. Outstanding `Rc` clones stay valid.
    pub fn clear(&mut self) {
        debug!(
            "Clearing cache ({} pixel buffers, {} textures)",
            self.pixels.len(),
            self.textures.len()
        );
        self.pixels.clear();
        self.textures.clear();
    }
}
