pub const FINGERPRINT_HEX_LEN: usize = 16;

pub fn fingerprint_text(text: &str) -> String {
    let full_hex = blake3::hash(text.as_bytes()).to_hex().to_string();
    shorten_hex(&full_hex)
}

fn shorten_hex(full_hex: &str) -> String {
    let prefix_len = FINGERPRINT_HEX_LEN.min(full_hex.len());
    full_hex[..prefix_len].to_string()
}
