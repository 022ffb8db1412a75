pub mod digitize;
pub mod headers;
pub mod pages;
pub mod sessions;
pub mod upload;

pub use digitize::{handle_digitize, __path_handle_digitize};
pub use pages::{
    handle_download, handle_index, handle_page, handle_preview, handle_select_image,
    handle_start_digitize,
};
pub use sessions::{
    handle_create_session, handle_delete_session, handle_get_session, handle_session_digitize,
    handle_session_image, __path_handle_create_session, __path_handle_delete_session,
    __path_handle_get_session, __path_handle_session_digitize, __path_handle_session_image,
};
pub use upload::ImageUpload;
