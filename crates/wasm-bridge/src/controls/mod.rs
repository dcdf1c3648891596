//! Interactive controllers: hero carousel and gallery lightbox

pub mod carousel;
pub mod gallery;
pub mod lightbox;
pub mod swipe;

pub use carousel::{Carousel, CarouselPhase, Transition};
pub use gallery::GalleryImage;
pub use lightbox::{Lightbox, LightboxState, Modal};
