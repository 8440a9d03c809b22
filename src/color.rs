//! Stable display colors keyed by district name.

use md5::{Digest, Md5};

/// Returns a `#rrggbb` color derived from the MD5 digest of `name`.
///
/// The 128-bit digest is read as a big-endian integer and reduced modulo
/// `0xFFFFFF`. Distinct names may collide.
pub fn color_for(name: &str) -> String {
    let digest = Md5::digest(name.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    let value = u128::from_be_bytes(bytes) % 0xFF_FFFF;
    format!("#{value:06x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_hex_color(s: &str) -> bool {
        s.len() == 7
            && s.starts_with('#')
            && s[1..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn known_district_colors() {
        assert_eq!(color_for("Porto"), "#178ae1");
        assert_eq!(color_for("Lisboa"), "#7fb10d");
        assert_eq!(color_for("Braga"), "#475e27");
        assert_eq!(color_for("Faro"), "#edfab0");
    }

    #[test]
    fn deterministic_and_well_formed() {
        for name in ["Porto", "Évora", "Viana do Castelo", ""] {
            let first = color_for(name);
            assert_eq!(first, color_for(name));
            assert!(is_hex_color(&first), "{first}");
        }
    }
}
