/// User interface views
///
/// - `uploader.rs` - drop zone, picker/camera buttons, live camera preview
/// - `result.rs` - species result page
/// - `toast.rs` - non-blocking notifications

pub mod result;
pub mod toast;
pub mod uploader;
