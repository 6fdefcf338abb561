mod normalize;

pub use normalize::{CANONICAL_MIME_TYPE, ImagePart, normalize, strip_data_url_prefix};
