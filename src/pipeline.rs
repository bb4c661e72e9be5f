//! One request end to end: content, card, scene, encoded bytes.

use rand::Rng;

use crate::assets::fetch::AssetFetcher;
use crate::assets::fonts::registry;
use crate::compose::document::{DocumentAssets, DocumentCompositor};
use crate::compose::scene::SceneCompositor;
use crate::config::ForgeConfig;
use crate::content::{ContentProvider, DocumentSpec};
use crate::encode::encode;
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::error::ForgeResult;
use crate::render::text::TextEngine;

/// Encoded scene plus the content it shows.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub document: DocumentSpec,
}

pub struct Pipeline {
    config: ForgeConfig,
    provider: Box<dyn ContentProvider + Send + Sync>,
    fetcher: Box<dyn AssetFetcher + Send + Sync>,
}

impl Pipeline {
    pub fn new(
        config: ForgeConfig,
        provider: Box<dyn ContentProvider + Send + Sync>,
        fetcher: Box<dyn AssetFetcher + Send + Sync>,
    ) -> ForgeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            provider,
            fetcher,
        })
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Draw the card for an already chosen document.
    pub fn render_document<R: Rng>(&self, doc: &DocumentSpec, rng: &mut R) -> ForgeResult<PixelBuffer> {
        let assets = DocumentAssets::load(doc, self.fetcher.as_ref(), self.config.portrait_policy)?;
        let fonts = registry(&self.config.fonts)?;
        let mut text = TextEngine::new(fonts)?;
        DocumentCompositor::new(doc, &self.config.document, &assets).render(&mut text, rng)
    }

    /// Card placed into the scene, not yet encoded.
    pub fn render_scene<R: Rng>(&self, doc: &DocumentSpec, rng: &mut R) -> ForgeResult<PixelBuffer> {
        let card = self.render_document(doc, rng)?;
        SceneCompositor::new(&self.config.scene).render(card, rng)
    }

    #[tracing::instrument(skip_all)]
    pub fn run<R: Rng>(&self, rng: &mut R) -> ForgeResult<RenderOutput> {
        let document = self.provider.document(rng)?;
        tracing::info!(
            institution = %document.institution_name,
            name = %document.display_name,
            "generating card"
        );
        tracing::debug!(
            gender = ?document.gender,
            date_of_birth = %document.date_of_birth,
            id_code = %document.id_code,
            "card holder"
        );
        let scene = self.render_scene(&document, rng)?;
        let bytes = encode(&scene, self.config.output)?;
        tracing::info!(bytes = bytes.len(), "card encoded");
        Ok(RenderOutput {
            bytes,
            content_type: self.config.output.content_type(),
            document,
        })
    }
}
