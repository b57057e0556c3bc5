use rand::distr::Alphanumeric;
use rand::Rng;

/// Extension given to every stored image, regardless of payload type.
pub const IMAGE_FILE_EXT: &str = "png";

const DESTINATION_ID_LEN: usize = 5;

/// Short random destination name like `k3v9q.png`.
///
/// Names are independent of the source location; callers rely on the
/// filesystem to reject collisions rather than on uniqueness here.
pub fn random_destination_name(extension: &str) -> String {
    let mut rng = rand::rng();
    let id: String = std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(DESTINATION_ID_LEN)
        .collect();
    format!("{id}.{extension}")
}
