use crate::constants::UNSUPPORTED_NOTICE_ID;
use web_sys as web;

/// Remove the static "unsupported browser" notice once startup succeeded.
#[inline]
pub fn remove_unsupported_notice(document: &web::Document) {
    if let Some(el) = document.get_element_by_id(UNSUPPORTED_NOTICE_ID) {
        el.remove();
    }
}
