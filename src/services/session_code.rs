use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Draw a random session code made of `length` lowercase ASCII letters.
pub fn generate_session_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_requested_length_and_alphabet() {
        let mut rng = rand::rng();
        for length in [1, 3, 8] {
            let code = generate_session_code(&mut rng, length);
            assert_eq!(code.len(), length);
            assert!(code.chars().all(|c| c.is_ascii_lowercase()));
        }
    }
}
