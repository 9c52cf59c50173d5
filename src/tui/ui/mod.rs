pub mod inputarea;
pub mod landing;
pub mod messageblock;
pub mod option_dialog;
pub mod sidebar;
