//! Gallery membership, re-derived from the document on every call

use site_ui_config::LightboxConfig;

use crate::dom::DomFacade;

/// One gallery-tagged element and what the lightbox shows for it
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryImage<N> {
    pub node: N,
    pub gallery: String,
    pub src: String,
    pub alt: String,
}

/// Every gallery-tagged element in document order
pub fn all_images<D: DomFacade>(dom: &D, config: &LightboxConfig) -> Vec<GalleryImage<D::Node>> {
    dom.query_all(&config.image_selector)
        .into_iter()
        .filter_map(|node| {
            let gallery = dom.attribute(&node, &config.gallery_attribute)?;
            let src = dom
                .attribute(&node, &config.full_source_attribute)
                .filter(|s| !s.is_empty())
                .or_else(|| dom.attribute(&node, "src"))
                .unwrap_or_default();
            let alt = dom.attribute(&node, "alt").unwrap_or_default();
            Some(GalleryImage {
                node,
                gallery,
                src,
                alt,
            })
        })
        .collect()
}

/// Members of `gallery`, document order preserved
pub fn members<D: DomFacade>(
    dom: &D,
    config: &LightboxConfig,
    gallery: &str,
) -> Vec<GalleryImage<D::Node>> {
    all_images(dom, config)
        .into_iter()
        .filter(|image| image.gallery == gallery)
        .collect()
}

/// Gallery name and index of `node` within that gallery
pub fn position_of<D: DomFacade>(
    dom: &D,
    config: &LightboxConfig,
    node: &D::Node,
) -> Option<(String, usize)> {
    let gallery = dom.attribute(node, &config.gallery_attribute)?;
    let index = members(dom, config, &gallery)
        .iter()
        .position(|image| &image.node == node)?;
    Some((gallery, index))
}
