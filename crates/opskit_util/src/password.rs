//! Throwaway password generation for shared report links.

use rand::seq::{IndexedRandom, SliceRandom};

/// ASCII punctuation pool.
const C_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Generate a password of `n_len` symbols.
///
/// Two thirds of the symbols are ASCII letters; the remainder is drawn from
/// digits (double weight) and punctuation. The result is shuffled.
pub fn generate_password(n_len: usize) -> String {
    let mut rng = rand::rng();

    let l_letters: Vec<char> = ('A'..='Z').chain('a'..='z').collect();
    let l_digits_punct: Vec<char> = ('0'..='9')
        .chain('0'..='9')
        .chain(C_PUNCTUATION.chars())
        .collect();

    let n_letters = n_len / 3 * 2;
    let n_rest = n_len - n_letters;

    let mut l_chars: Vec<char> = Vec::with_capacity(n_len);
    for _ in 0..n_letters {
        if let Some(chr) = l_letters.choose(&mut rng) {
            l_chars.push(*chr);
        }
    }
    for _ in 0..n_rest {
        if let Some(chr) = l_digits_punct.choose(&mut rng) {
            l_chars.push(*chr);
        }
    }
    l_chars.shuffle(&mut rng);

    l_chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_has_requested_length_and_composition() {
        let c_password = generate_password(12);
        assert_eq!(c_password.chars().count(), 12);

        let n_letters = c_password
            .chars()
            .filter(|chr| chr.is_ascii_alphabetic())
            .count();
        assert_eq!(n_letters, 8);
        assert!(c_password.chars().all(|chr| chr.is_ascii_graphic()));
    }

    #[test]
    fn zero_length_yields_empty_password() {
        assert_eq!(generate_password(0), "");
    }

    #[test]
    fn short_lengths_fall_back_to_non_letters() {
        // 2 / 3 * 2 == 0 letters; both symbols come from the digit/punct pool.
        let c_password = generate_password(2);
        assert_eq!(c_password.chars().count(), 2);
        assert!(c_password.chars().all(|chr| !chr.is_ascii_alphabetic()));
    }
}
