use crate::dom::DomFacade;

/// Write `year` into the footer element; returns whether one was found
pub fn stamp_year<D: DomFacade>(dom: &D, selector: &str, year: i32) -> bool {
    match dom.query_one(selector) {
        Some(node) => {
            dom.set_text(&node, &year.to_string());
            true
        }
        None => {
            log::debug!("No footer year element ({selector})");
            false
        }
    }
}
