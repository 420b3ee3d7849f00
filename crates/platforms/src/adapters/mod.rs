//! Concrete platform adapters.

pub mod social;
pub mod webflow;
pub mod wordpress;

pub use social::SocialAdapter;
pub use webflow::WebflowAdapter;
pub use wordpress::WordPressAdapter;

use content::{ContentImage, UniversalContent};

use crate::adapter::{PlatformImage, PlatformLink};

/// Featured image first, then body images.
pub(crate) fn collect_images(content: &UniversalContent, lazy_attr: bool) -> Vec<PlatformImage> {
    let featured = content.featured_image.iter().map(|url| PlatformImage {
        url: url.clone(),
        alt_text: content.title.clone(),
        caption: None,
        attributes: [("role".to_string(), "featured".to_string())].into(),
    });

    let body = content.body_images.iter().map(|image: &ContentImage| {
        let mut attributes = std::collections::BTreeMap::new();
        if lazy_attr && image.optimization.lazy_load {
            attributes.insert("loading".to_string(), "lazy".to_string());
        }
        PlatformImage {
            url: image.url.clone(),
            alt_text: image.alt_text.clone(),
            caption: image.caption.clone(),
            attributes,
        }
    });

    featured.chain(body).collect()
}

/// Internal opportunities and external targets as platform links.
pub(crate) fn collect_links(content: &UniversalContent) -> Vec<PlatformLink> {
    let internal = content
        .internal_link_opportunities
        .iter()
        .map(|link| PlatformLink {
            url: link.target_url.clone(),
            anchor_text: link.anchor_text.clone(),
            internal: true,
            attributes: Default::default(),
        });

    let external = content.external_link_targets.iter().map(|link| {
        let rel = if link.nofollow {
            "nofollow noopener"
        } else {
            "noopener"
        };
        PlatformLink {
            url: link.url.clone(),
            anchor_text: link.anchor_text.clone(),
            internal: false,
            attributes: [
                ("rel".to_string(), rel.to_string()),
                ("target".to_string(), "_blank".to_string()),
            ]
            .into(),
        }
    });

    internal.chain(external).collect()
}
